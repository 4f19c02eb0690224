//! stderr logging.
//!
//! `RUST_LOG` wins when set. Otherwise the level follows `-v`: `warn` by
//! default, `info` with `-v`, `debug` with `-vv`. Transport crates stay at
//! `warn` so request internals do not drown out provider logs.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn directives(level: &str) -> String {
    NOISY_MODULES
        .iter()
        .fold(String::from(level), |mut directives, module| {
            directives.push_str(&format!(",{module}=warn"));
            directives
        })
}

fn build_filter(verbosity: u8) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::new(directives(level_for(verbosity)))
}

pub fn init(verbosity: u8) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(build_filter(verbosity))
        .with(fmt_layer)
        .try_init();

    tracing::debug!(
        level = level_for(verbosity),
        noise_filtered = NOISY_MODULES.len(),
        "logging initialized"
    );
}
