//! Bounded shell retry wrapping for bootstrap commands.

/// Seconds slept after each failed attempt.
pub const RETRY_DELAY_SECS: u32 = 10;

/// Wrap `command` in a shell loop that runs it up to `attempts` times.
///
/// With `attempts <= 1` the command is returned unchanged. Otherwise the loop
/// breaks on the first successful exit and sleeps [`RETRY_DELAY_SECS`] after
/// each failure. When every attempt fails the loop simply ends, so the
/// enclosing script keeps going. `command` is embedded verbatim: no quoting or
/// escaping is applied.
///
/// The command sits on its own lines inside a `{ :; ...\n}` group, so an empty
/// command, a trailing `#` comment, a trailing `&` or a heredoc terminator all
/// still parse.
#[must_use]
pub fn wrap_with_retry(command: &str, attempts: u32) -> String {
    if attempts <= 1 {
        return command.to_string();
    }
    format!(
        "for i in $(seq 1 {attempts}); do {{ :; {command}\n}} && break || sleep {RETRY_DELAY_SECS}; done"
    )
}
