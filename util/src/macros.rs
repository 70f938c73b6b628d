/// Print a line tagged with the calling package to stderr, for use before tracing is installed.
#[macro_export]
macro_rules! bootstrap {
    ($x:expr $( , $xs:expr )* $(,)?) => {
        eprintln!(concat!("[", env!("CARGO_PKG_NAME"), "] ", $x) $( , $xs )*)
    };
}

/// Convert a `Result` into an `Option`, logging the error at `$level` instead of propagating it.
///
/// ```ignore
/// let synced = util::ok_or_trace!(warn, file.sync_data(), path = %path.display(), "syncing");
/// ```
#[macro_export]
macro_rules! ok_or_trace {
    ($level:ident, $val:expr, $($rest:tt)*) => {
        match $val {
            Ok(value) => Some(value),
            Err(e) => {
                ::tracing::$level!(error = %e, $($rest)*);
                None
            },
        }
    };
}
