use tracing_subscriber::EnvFilter;

/// Default filter for an environment name. `RUST_LOG` overrides it.
pub fn default_directive(env: &str) -> &'static str {
    match env {
        "prod" => "info",
        _ => "debug,sqlx=info,tower_http=debug",
    }
}

/// Install the global tracing subscriber.
///
/// `local` gets human-readable output; `dev` and `prod` emit JSON lines.
pub fn init_tracing(env: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(env)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match env {
        "dev" | "prod" => builder.json().init(),
        _ => builder.pretty().init(),
    }
}
