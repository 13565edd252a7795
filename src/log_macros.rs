//! Logging shims: forward to the `log` facade when the `log` feature is on,
//! otherwise type-check the arguments and emit nothing.

#[cfg(feature = "log")]
macro_rules! trace_log {
    ($($arg:tt)+) => { ::log::trace!(target: "websocket_session", $($arg)+) };
}

#[cfg(feature = "log")]
macro_rules! debug_log {
    ($($arg:tt)+) => { ::log::debug!(target: "websocket_session", $($arg)+) };
}

#[cfg(feature = "log")]
macro_rules! warn_log {
    ($($arg:tt)+) => { ::log::warn!(target: "websocket_session", $($arg)+) };
}

#[cfg(not(feature = "log"))]
macro_rules! trace_log {
    ($($arg:tt)+) => {
        if false {
            ::core::mem::drop(::core::format_args!($($arg)+));
        }
    };
}

#[cfg(not(feature = "log"))]
macro_rules! debug_log {
    ($($arg:tt)+) => {
        if false {
            ::core::mem::drop(::core::format_args!($($arg)+));
        }
    };
}

#[cfg(not(feature = "log"))]
macro_rules! warn_log {
    ($($arg:tt)+) => {
        if false {
            ::core::mem::drop(::core::format_args!($($arg)+));
        }
    };
}
