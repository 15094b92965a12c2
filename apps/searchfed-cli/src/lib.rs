//! Process-boundary helpers shared by the `searchfed` binaries.
use std::io::Read;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use searchfed_core::error::Error;
use searchfed_core::types::ErrorReport;

/// Logs go to stderr; stdout carries exactly one JSON document.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

/// The request is base64-encoded JSON in the first argument, or plain JSON
/// on stdin when no argument is given. Empty input means `{}`.
pub fn decode_request(arg: Option<&str>, mut stdin: impl Read) -> Result<Value> {
    let raw = match arg {
        Some(encoded) => {
            let bytes = STANDARD.decode(encoded.trim()).context("request argument is not valid base64")?;
            String::from_utf8(bytes).context("request argument is not UTF-8")?
        }
        None => {
            let mut buf = String::new();
            stdin.read_to_string(&mut buf).context("reading request from stdin")?;
            buf
        }
    };
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(&raw).map_err(|e| Error::Serialization(e).into())
}

/// Label and message for a top-level failure.
pub fn error_report(err: &anyhow::Error) -> ErrorReport {
    let kind = match err.downcast_ref::<Error>() {
        Some(e) => e.kind(),
        None if err.downcast_ref::<base64::DecodeError>().is_some() => "invalid_request",
        None => "internal",
    };
    ErrorReport::new(kind, format!("{:#}", err))
}

/// Print `report` as the single output document.
pub fn print_error(report: &ErrorReport) {
    match serde_json::to_string(report) {
        Ok(doc) => println!("{}", doc),
        Err(_) => println!(r#"{{"status":"error","kind":"internal","message":"unserializable error"}}"#),
    }
}

/// Cancelled on Ctrl-C so in-flight probes and queries stop promptly.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling request");
            trigger.cancel();
        }
    });
    token
}
