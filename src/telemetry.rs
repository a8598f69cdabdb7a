//! Opt-in `tracing` setup for hosts and the bundled CLI.
//!
//! Events emitted by this crate, by level:
//!
//! - `warn`: heatmap `x`/`y` overwritten by `origin`/`dx`/`dy`; non-positive
//!   values on log axes; log axes falling back to Plotly's automatic ticks;
//!   axis titles set while several axes of one direction exist.
//! - `info`: axes created on demand, heatmap origins, range alignment groups.
//! - `debug`: document load and show, trace construction, plain-text reads,
//!   layout pass summaries, dropped sub-axis layouts and dummy traces, HTML
//!   pages written.
//! - `trace`: range extension and trace bookkeeping.
//!
//! `RUST_LOG` always wins over the directives passed here.

/// Filter used by [`init_default_tracing`].
pub const DEFAULT_DIRECTIVES: &str = "warn";

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`, or by
/// `default_directives` when `RUST_LOG` is unset or invalid.
///
/// Returns `false` without the `telemetry` feature or when the host already
/// set a global subscriber.
#[must_use]
pub fn init_tracing(default_directives: &str) -> bool {
    #[cfg(feature = "telemetry")]
    {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directives));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .try_init()
            .is_ok()
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = default_directives;
        false
    }
}

#[must_use]
pub fn init_default_tracing() -> bool {
    init_tracing(DEFAULT_DIRECTIVES)
}

#[cfg(test)]
mod tests {
    use super::init_tracing;

    #[cfg(not(feature = "telemetry"))]
    #[test]
    fn without_feature_nothing_is_installed() {
        assert!(!init_tracing("figure_kit=debug"));
        assert!(!super::init_default_tracing());
    }

    #[cfg(feature = "telemetry")]
    #[test]
    fn second_installation_is_refused() {
        let _ = init_tracing("figure_kit=debug");
        assert!(!init_tracing("figure_kit=debug"));
    }
}
