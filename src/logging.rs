//! Tracing setup for the `tealoop` binary.
//!
//! Stdout carries the rendered HTML, so diagnostics never go there: they go
//! to a file named by `TEALOOP_LOG`, or nowhere. Each run writes its own
//! `{path}.{timestamp}.{pid}` file, so a `listen` session and one-shot
//! commands against the same snapshot don't interleave their logs.

use std::path::PathBuf;

use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming the log file.
pub const LOG_ENV: &str = "TEALOOP_LOG";

/// Filter used when `RUST_LOG` is unset: the runtime's own spans at info,
/// everything else at warn.
const DEFAULT_FILTER: &str = "warn,tealoop=info";

/// Install the file subscriber if `TEALOOP_LOG` is set. Returns the file
/// actually written.
pub fn init_tracing() -> Option<PathBuf> {
    let base = std::env::var_os(LOG_ENV)?;
    let path = run_log_path(PathBuf::from(base), std::process::id());

    let file = match std::fs::File::create(&path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("tealoop: cannot create log file {}: {err}", path.display());
            return None;
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_timer(UtcTime::rfc_3339())
        .with_target(true);

    tracing_subscriber::registry().with(filter).with(file_layer).init();
    Some(path)
}

fn run_log_path(base: PathBuf, pid: u32) -> PathBuf {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut name = base.into_os_string();
    name.push(format!(".{timestamp}.{pid}"));
    PathBuf::from(name)
}
