//! Logging macros gated by a module-level `ENABLE_LOGS` flag.
//!
//! Modules with chatty loops (the elapsed clock ticker) define
//! `const ENABLE_LOGS: bool` and use these instead of the plain `log`
//! macros so per-tick output can be switched off at compile time:
//!
//! ```ignore
//! const ENABLE_LOGS: bool = false;
//! use crate::{log_debug, log_info};
//!
//! log_debug!("tick at {elapsed}s");
//! ```

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Per-tick tracing; also filtered by the `log` level at runtime.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// Installs the `env_logger` backend. `RUST_LOG` wins when set; otherwise the
/// level is `Info`, or `Debug` when `TIMETRACK_DEBUG` is `1`/`true`.
/// Safe to call more than once.
pub fn init_logging() {
    let debug_mode = std::env::var("TIMETRACK_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let level = if debug_mode {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(level);
    }

    if builder.try_init().is_ok() {
        log::info!("timetrack logging initialized at {level}");
    }
}
