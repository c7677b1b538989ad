//! Logging setup plus the small helpers used for warnings and error text.

use tracing_subscriber::EnvFilter;

/// Install the stderr `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `warn`, or `debug`
/// with `--verbose`.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Already installed is fine.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Emit a user-visible warning.
pub fn warn(msg: impl AsRef<str>) {
    tracing::warn!("{}", msg.as_ref());
}

/// Error text handed to `anyhow` (`bail!`, `with_context`).
pub fn error_message(msg: impl Into<String>) -> String {
    msg.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_is_passed_through() {
        assert_eq!(error_message("cannot read file: a.txt"), "cannot read file: a.txt");
        assert_eq!(error_message(String::from("plain.")), "plain.");
    }
}
