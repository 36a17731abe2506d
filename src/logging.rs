//! Tracing subscriber setup for the binary.
//!
//! `RUST_LOG` wins over the level given on the command line.

use tracing_subscriber::EnvFilter;

/// Default filter when neither `RUST_LOG` nor `--log-level` says otherwise.
pub const DEFAULT_FILTER: &str = "scale_labeler=info";

/// Build the filter used by [`init`].
pub fn filter(level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match level {
        Some(level) => EnvFilter::new(format!("scale_labeler={}", level)),
        None => EnvFilter::new(DEFAULT_FILTER),
    })
}

/// Install a formatting subscriber on stderr. Safe to call twice; the second
/// call is ignored.
pub fn init(level: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        init(Some("debug"));
        init(None);
        tracing::debug!("still alive");
    }
}
