//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with a default filter of `info` for this crate and `warn`
/// for everything else. Override with the RUST_LOG environment variable.
///
/// Safe to call more than once; later calls are ignored.
///
/// # Example
/// ```
/// sylva::core::logging::init();
/// log::info!("Dataset export started");
/// ```
pub fn init() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,sylva=info")
    )
    .format_timestamp_millis()
    .try_init();
}
