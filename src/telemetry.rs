//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives like
//!   "info,assessment=debug,socratic_backend=debug,tower_http=info,axum=info", the default).
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Log targets: `socratic_backend` (bootstrap), `assessment` (scoring), `tutor`
//! (dialogue generation), `scores` (score records).

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "info,assessment=debug,socratic_backend=debug,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Choose JSON vs pretty; don't try to store different layer types.
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => {
            builder.json().init();
        }
        _ => {
            builder.init();
        }
    }
}
