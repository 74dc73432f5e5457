//! Fixed-rate repeated calls.
//!
//! Each iteration records its start, runs one `call`, hands the outcome to
//! the caller, then sleeps whatever remains of the period. A call that
//! overruns the period is followed immediately by the next one; missed
//! iterations are never made up.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::client::Client;
use crate::error::{MousebotError, Result};
use crate::schema::{Request, Response};

/// Sleep before the next iteration, given how long the last call took.
pub fn pacing_delay(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

/// Outcome counts for one `run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub iterations: u64,
    /// Decoded responses, device errors included.
    pub successes: u64,
    /// Decoded responses carrying a device error.
    pub device_errors: u64,
    /// Calls that returned an error.
    pub failures: u64,
}

impl PollStats {
    fn record(&mut self, result: &Result<Response>) {
        self.iterations += 1;
        match result {
            Ok(response) => {
                self.successes += 1;
                if response.device_error().is_some() {
                    self.device_errors += 1;
                }
            }
            Err(_) => self.failures += 1,
        }
    }
}

/// Issues the same request at a target rate.
#[derive(Debug, Clone)]
pub struct Poller {
    period: Duration,
    max_iterations: Option<u64>,
}

impl Poller {
    /// Create a poller running at `rate_hz` calls per second.
    ///
    /// # Errors
    ///
    /// Returns [`MousebotError::Config`] for a rate that is not a finite
    /// positive number.
    pub fn new(rate_hz: f64) -> Result<Self> {
        if !rate_hz.is_finite() || rate_hz <= 0.0 {
            return Err(MousebotError::Config(format!(
                "poll rate must be a positive number of Hz, got {rate_hz}"
            )));
        }

        let period = Duration::try_from_secs_f64(1.0 / rate_hz)
            .map_err(|e| MousebotError::Config(format!("poll rate {rate_hz} Hz: {e}")))?;

        Ok(Self {
            period,
            max_iterations: None,
        })
    }

    /// Stop after `n` iterations instead of running until cancelled.
    pub fn max_iterations(mut self, n: u64) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Target time between iteration starts.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Poll until `cancel` fires or the iteration limit is reached.
    ///
    /// Every outcome is passed to `on_result`; a failed call does not stop
    /// the loop. Cancellation is observed between iterations and during the
    /// pacing sleep, never inside a call.
    pub async fn run<S, F>(
        &self,
        client: &mut Client<S>,
        request: &Request,
        cancel: &CancellationToken,
        mut on_result: F,
    ) -> PollStats
    where
        S: AsyncRead + AsyncWrite + Unpin,
        F: FnMut(Result<Response>),
    {
        let mut stats = PollStats::default();
        tracing::debug!(period = ?self.period, op = request.op, "Polling started");

        loop {
            if cancel.is_cancelled() {
                break;
            }
            if self.max_iterations.is_some_and(|max| stats.iterations >= max) {
                break;
            }

            let started = Instant::now();
            let result = client.call(request).await;
            let elapsed = started.elapsed();

            if let Err(e) = &result {
                tracing::warn!(error = %e, iteration = stats.iterations, "Poll failed");
            }
            stats.record(&result);
            on_result(result);

            if self.max_iterations.is_some_and(|max| stats.iterations >= max) {
                break;
            }

            let delay = pacing_delay(self.period, elapsed);
            tracing::trace!(?elapsed, ?delay, "Iteration done");
            if delay.is_zero() {
                continue;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        tracing::debug!(
            iterations = stats.iterations,
            failures = stats.failures,
            "Polling stopped"
        );
        stats
    }
}
