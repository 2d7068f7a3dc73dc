//! tracing-subscriber setup shared by both binaries
//!
//! Logs go to stderr; `clipqa-display` uses stdout for its JSON stream.

use tracing_subscriber::EnvFilter;

/// Targets the filter applies to: the library and each binary
const TARGETS: [&str; 2] = ["clipqa", "clipqa_display"];

/// Level for a verbosity count and configured level.
///
/// `-v` and `-vv` win over the config file.
pub fn level(verbose: u8, configured: &str) -> &str {
    match verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. `RUST_LOG` directives are kept on top.
pub fn init(verbose: u8, configured: &str) {
    let level = level(verbose, configured);
    let mut filter = EnvFilter::from_default_env();
    for target in TARGETS {
        match format!("{}={}", target, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(_) => {
                eprintln!("Unknown log level '{}', using info", level);
                filter = filter.add_directive(tracing::Level::INFO.into());
                break;
            }
        }
    }

    // A subscriber may already be set (tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_verbosity() {
        assert_eq!(level(0, "info"), "info");
        assert_eq!(level(0, "warn"), "warn");
        assert_eq!(level(1, "warn"), "debug");
        assert_eq!(level(3, "info"), "trace");
    }
}
