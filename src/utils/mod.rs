//! Utilities: logging setup (level from -v/-q, `RUST_LOG` override).
//!
//! Key items:
//!   init_logging / derive_level

/// Logging helpers.
pub mod logging {
    use std::io::IsTerminal;

    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::filter::Builder;

    /// Map `-v` count and `--quiet` to a default level.
    pub fn derive_level(verbose: u8, quiet: bool) -> LevelFilter {
        if quiet {
            return LevelFilter::ERROR;
        }
        match verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    fn filter_builder(level: LevelFilter) -> Builder {
        EnvFilter::builder().with_default_directive(level.into())
    }

    /// `RUST_LOG` when set, else `level` for every target.
    pub fn build_filter(level: LevelFilter) -> EnvFilter {
        filter_builder(level).from_env_lossy()
    }

    /// Install the global subscriber. Logs go to stderr; stdout carries MCP traffic.
    pub fn init_logging(level: LevelFilter) {
        let ansi = std::io::stderr().is_terminal();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(build_filter(level))
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .with_target(false)
            .try_init();
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn quiet_wins_over_verbose() {
            assert_eq!(derive_level(2, true), LevelFilter::ERROR);
        }

        #[test]
        fn quiet_silences_dependency_warnings() {
            let filter = filter_builder(derive_level(0, true)).parse_lossy("");
            assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
        }

        #[test]
        fn explicit_directives_raise_crate_level() {
            let filter = filter_builder(LevelFilter::ERROR).parse_lossy("chalk_mcp=debug");
            assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
        }

        #[test]
        fn verbosity_steps() {
            assert_eq!(derive_level(0, false), LevelFilter::INFO);
            assert_eq!(derive_level(1, false), LevelFilter::DEBUG);
            assert_eq!(derive_level(5, false), LevelFilter::TRACE);
        }
    }
}

pub use logging::{derive_level, init_logging};
