//! Per-module switchable logging.
//!
//! A module opts in by declaring the flag before using any of the macros:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("resolved {} sensors", count);
//! ```
//! With the flag off the call compiles away; with it on the message goes through the `log`
//! facade and `RUST_LOG` filtering as usual.

#[doc(hidden)]
#[macro_export]
macro_rules! gated_log {
    ($level:ident, $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::$level!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::gated_log!(debug, $($arg)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::gated_log!(info, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::gated_log!(warn, $($arg)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::gated_log!(error, $($arg)*) };
}

#[cfg(test)]
mod tests {
    #[test]
    fn disabled_flag_skips_formatting() {
        const ENABLE_LOGS: bool = false;

        struct Panics;
        impl std::fmt::Display for Panics {
            fn fmt(&self, _: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                panic!("formatted while disabled");
            }
        }

        crate::log_warn!("{}", Panics);
        crate::log_error!("{}", Panics);
    }
}
