//! Logger setup for the command-line front end

use env_logger::Env;

/// Initialize `env_logger` with an `info` default, overridable via `RUST_LOG`
///
/// Calling this more than once is harmless.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_twice() {
        init_logger();
        init_logger();
        log::info!("logger initialized");
    }
}
