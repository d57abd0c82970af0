//! Subscriber setup for the binary. The library only emits `tracing` events.

use tracing_subscriber::EnvFilter;

pub const ENV_LOG: &str = "LIBRIS_LOG";

/// Filter used when `LIBRIS_LOG` is unset or unparsable.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "libris=debug"
    } else {
        "warn"
    }
}

/// Install a compact stderr subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init(verbose: bool) {
    let filter = std::env::var(ENV_LOG)
        .ok()
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_crate_level() {
        assert_eq!(default_filter(false), "warn");
        assert_eq!(default_filter(true), "libris=debug");
    }

    #[test]
    fn init_twice_is_harmless() {
        init(false);
        init(true);
    }
}
