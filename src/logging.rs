/// Installs the JSON `tracing` formatter as the global subscriber.
///
/// Returns `false` when a subscriber was already installed.
pub fn init() -> bool {
    tracing_subscriber::fmt().json().try_init().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_only_once() {
        init();
        assert!(!init(), "expected second init to report an existing subscriber");
    }
}
