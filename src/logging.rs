//! `env_logger` setup for binaries and benches.

use std::sync::Once;

use env_logger::Builder;
use log::LevelFilter;

static INIT: Once = Once::new();

/// Installs the global logger once. `RUST_LOG` overrides the default `info`
/// level; a logger installed elsewhere is left in place.
pub fn init_logger() {
    INIT.call_once_force(|_| {
        let mut builder = Builder::new();

        builder
            .filter_level(LevelFilter::Info)
            .filter_module("weakkit::cache", LevelFilter::Info)
            .filter_module("weakkit::harness", LevelFilter::Info)
            .format_timestamp_millis()
            .parse_default_env();

        let _ = builder.try_init();
    });
}

#[cfg(test)]
mod tests {
    use log::{debug, info};

    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_logger();
        init_logger();
        debug!("debug message in test");
        info!("info message in test");
    }
}
