use log::LevelFilter;

/// Install the `env_logger` backend. Safe to call more than once.
///
/// `RUST_LOG` still overrides `level` when set.
pub fn init_logger(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}

/// Logger for unit tests; output is captured by the test harness.
#[cfg(test)]
pub fn init_test_logger() {
    let _ = env_logger::Builder::new()
        .filter_level(LevelFilter::Debug)
        .is_test(true)
        .try_init();
}
