//! `mousebot` - query the Mousebot board over USB serial.
//!
//! ```text
//! mousebot --port /dev/ttyACM0 --operation imu
//! mousebot --port /dev/ttyACM0 --operation imu --rate 10
//! mousebot --port /dev/ttyACM0 --op-code 102 --format json
//! ```

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use mousebot_client::protocol::{BAUD_RATE, DEFAULT_SETTLE_DELAY, DEFAULT_TIMEOUT};
use mousebot_client::report::{render_human, render_json};
use mousebot_client::transport::{SerialConfig, DEFAULT_SERIAL_PORT};
use mousebot_client::{Client, Poller, Request, Response};

/// Predefined operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Operation {
    /// Raw IMU reading (op 102)
    Imu,
    /// Device feature list (op 100)
    Features,
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
}

/// Mousebot serial client
#[derive(Parser, Debug)]
#[command(name = "mousebot")]
#[command(author, version, about = "Mousebot serial client - talk to the board over USB")]
#[command(group(ArgGroup::new("request").required(true).args(["operation", "op_code"])))]
struct Cli {
    /// Serial port
    #[arg(short, long, env = "MOUSEBOT_PORT", default_value = DEFAULT_SERIAL_PORT)]
    port: String,

    /// Baud rate
    #[arg(short, long, env = "MOUSEBOT_BAUD", default_value_t = BAUD_RATE)]
    baud: u32,

    /// Predefined operation
    #[arg(short, long, value_enum)]
    operation: Option<Operation>,

    /// Raw operation code to send
    #[arg(long)]
    op_code: Option<i32>,

    /// Continuous monitoring rate in Hz
    #[arg(short, long, env = "MOUSEBOT_RATE")]
    rate: Option<f64>,

    /// Response timeout in seconds
    #[arg(short, long, env = "MOUSEBOT_TIMEOUT", default_value_t = DEFAULT_TIMEOUT.as_secs_f64())]
    timeout: f64,

    /// Wait after opening the port, in seconds
    #[arg(long, env = "MOUSEBOT_SETTLE", default_value_t = DEFAULT_SETTLE_DELAY.as_secs_f64())]
    settle: f64,

    /// Output format
    #[arg(long, value_enum, env = "MOUSEBOT_FORMAT", default_value = "human")]
    format: Format,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn request(&self) -> Request {
        match (self.operation, self.op_code) {
            (Some(Operation::Imu), _) => Request::raw_imu(),
            (Some(Operation::Features), _) => Request::features(),
            (None, Some(op)) => Request::monitor(op),
            // Enforced by the arg group
            (None, None) => Request::raw_imu(),
        }
    }

    fn print(&self, result: &mousebot_client::Result<Response>) {
        match self.format {
            Format::Human => print!("{}", render_human(result)),
            Format::Json => println!("{}", render_json(result)),
        }
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid --{name} value {value}"))
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "mousebot_client=debug,mousebot=debug"
    } else {
        "mousebot_client=info,mousebot=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let request = cli.request();
    let serial = SerialConfig {
        port: cli.port.clone(),
        baud_rate: cli.baud,
    };

    let mut client = Client::builder()
        .timeout(seconds("timeout", cli.timeout)?)
        .settle_delay(seconds("settle", cli.settle)?)
        .connect_serial(&serial)
        .await
        .with_context(|| format!("could not open {}", serial.port))?;

    let Some(rate) = cli.rate else {
        let result = client.call(&request).await;
        cli.print(&result);
        return Ok(if result.is_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    };

    let poller = Poller::new(rate)?;
    let cancel = CancellationToken::new();

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    eprintln!("Monitoring at {rate} Hz (Press Ctrl+C to stop)");
    let stats = poller
        .run(&mut client, &request, &cancel, |result| cli.print(&result))
        .await;

    tracing::info!(
        iterations = stats.iterations,
        successes = stats.successes,
        device_errors = stats.device_errors,
        failures = stats.failures,
        "Stopped"
    );
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli).await
}
