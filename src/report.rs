//! Operator-facing rendering of call outcomes.
//!
//! Human form is a banner block per outcome; JSON form is one line per
//! outcome, suited to piping a continuous poll into other tools.

use std::fmt::Write;

use serde_json::{json, Value};

use crate::error::{MousebotError, Result};
use crate::schema::{MspRawImu, Quaternion, Reply, Response, Vector3};

const BANNER_WIDTH: usize = 60;

/// Render an outcome as a multi-line report.
pub fn render_human(result: &Result<Response>) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    let mut out = String::new();

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            let _ = writeln!(out, "No response received: {e}");
            return out;
        }
    };

    let _ = writeln!(out, "\n{banner}");
    let _ = writeln!(out, "Response Op Code: {}", response.op);

    match response.reply() {
        Reply::DeviceError(kind) => {
            let _ = writeln!(out, "ERROR: {kind}");
        }
        Reply::RawImu(imu) => write_imu(&mut out, imu),
        Reply::Empty => {}
    }

    let _ = writeln!(out, "{banner}");
    out
}

fn write_imu(out: &mut String, imu: &MspRawImu) {
    let _ = writeln!(out, "\nOrientation (Quaternion):");
    if let Some(q) = &imu.orientation {
        write_quaternion(out, q);
    }

    let _ = writeln!(out, "\nAngular Velocity (rad/s):");
    if let Some(v) = &imu.angular_velocity {
        write_vector(out, v);
    }

    let _ = writeln!(out, "\nLinear Acceleration (g):");
    if let Some(v) = &imu.linear_acceleration {
        write_vector(out, v);
    }
}

fn write_quaternion(out: &mut String, q: &Quaternion) {
    for (axis, value) in [("x", q.x), ("y", q.y), ("z", q.z), ("w", q.w)] {
        let _ = writeln!(out, "  {axis}: {value:+.6}");
    }
}

fn write_vector(out: &mut String, v: &Vector3) {
    for (axis, value) in [("x", v.x), ("y", v.y), ("z", v.z)] {
        let _ = writeln!(out, "  {axis}: {value:+.6}");
    }
}

/// Render an outcome as a JSON value.
///
/// `status` is `ok`, `device_error` or `failure`.
pub fn to_json(result: &Result<Response>) -> Value {
    match result {
        Ok(response) => match response.reply() {
            Reply::DeviceError(kind) => json!({
                "status": "device_error",
                "op": response.op,
                "error": { "code": kind.code(), "name": kind.name() },
            }),
            Reply::RawImu(imu) => json!({
                "status": "ok",
                "op": response.op,
                "msp_raw_imu": imu,
            }),
            Reply::Empty => json!({ "status": "ok", "op": response.op }),
        },
        Err(e) => json!({
            "status": "failure",
            "kind": failure_kind(e),
            "error": e.to_string(),
            "retryable": e.is_retryable(),
        }),
    }
}

/// Render an outcome as one line of JSON.
pub fn render_json(result: &Result<Response>) -> String {
    to_json(result).to_string()
}

fn failure_kind(err: &MousebotError) -> &'static str {
    match err {
        MousebotError::Encoding(_) => "encoding",
        MousebotError::Timeout { .. } => "timeout",
        MousebotError::EmptyResponse => "empty_response",
        MousebotError::Decoding { .. } => "decoding",
        MousebotError::Config(_) => "config",
        MousebotError::QueueFull => "queue_full",
        _ => "transport",
    }
}
