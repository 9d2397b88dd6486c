/// Result of one forward attempt. Never retried by the client; each channel
/// decides what a failure means for its own redelivery semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The metafield API answered with a 2xx status.
    Accepted,
    /// The metafield API answered with a non-2xx status.
    DownstreamRejected { status: u16, body: String },
    /// No response was obtained: connect error, TLS failure, or timeout.
    TransportFailure { cause: String },
}

/// Returns at most `max_chars` characters of `body`, for log lines.
#[must_use]
pub fn body_excerpt(body: &str, max_chars: usize) -> &str {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_excerpt_keeps_short_bodies() {
        assert_eq!(body_excerpt("oops", 500), "oops");
        assert_eq!(body_excerpt("", 10), "");
    }

    #[test]
    fn body_excerpt_truncates_on_char_boundary() {
        assert_eq!(body_excerpt("abcdef", 3), "abc");
        assert_eq!(body_excerpt("héllo wörld", 5), "héllo");
    }
}
