//! Tracing setup for hosts that do not install a subscriber of their own.

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
/// Returns `false` when a global subscriber was already set.
pub fn init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init();
        assert!(!init());
    }
}
