//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable.
///
/// # Example
/// ```
/// terramesh::core::logging::init();
/// log::info!("Tile build started");
/// ```
pub fn init() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    )
    .format_timestamp_millis()
    .try_init();
}

/// Initialize logging for tests, capturing output per test.
#[cfg(test)]
pub fn init_test() {
    let _ = env_logger::builder().is_test(true).try_init();
}
