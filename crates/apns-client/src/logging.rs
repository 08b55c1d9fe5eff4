//! Logging setup and log-safe formatting helpers.

/// Initialize the global tracing subscriber with stderr output.
///
/// `RUST_LOG` overrides `level` when set. Subsequent calls are no-ops.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}

/// Leading bytes of a device token that are safe to log.
pub const TOKEN_PREFIX_LEN: usize = 8;

/// The first [`TOKEN_PREFIX_LEN`] bytes of `token`, cut at a char boundary.
pub fn token_prefix(token: &str) -> &str {
    if token.len() <= TOKEN_PREFIX_LEN {
        return token;
    }
    let mut end = TOKEN_PREFIX_LEN;
    while end > 0 && !token.is_char_boundary(end) {
        end -= 1;
    }
    &token[..end]
}
