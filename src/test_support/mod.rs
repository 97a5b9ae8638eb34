//! Helpers shared by unit tests that need a local HTTP endpoint.
//!
//! Sandboxes without loopback networking skip these tests quietly, unless
//! `MEDIA_FETCH_REQUIRE_SOCKET_TESTS=1` turns the skip into a failure.

use std::io;

use wiremock::MockServer;

pub(crate) mod chunked_server;

const REQUIRE_SOCKETS_VAR: &str = "MEDIA_FETCH_REQUIRE_SOCKET_TESTS";

fn sockets_required() -> bool {
    std::env::var(REQUIRE_SOCKETS_VAR)
        .is_ok_and(|value| matches!(value.as_str(), "1" | "true"))
}

/// Handles a failed loopback bind: panics when socket tests are mandatory.
pub(crate) fn skip_without_loopback(bind_error: &io::Error) {
    let required = sockets_required();
    assert!(
        !required,
        "loopback bind failed with {REQUIRE_SOCKETS_VAR} set: {bind_error}"
    );
    eprintln!("skipping socket-bound test: loopback bind failed: {bind_error}");
}

/// Starts a wiremock server, or `None` when loopback cannot be bound.
pub(crate) async fn mock_server_or_skip() -> Option<MockServer> {
    match std::net::TcpListener::bind("127.0.0.1:0") {
        Ok(_) => Some(MockServer::start().await),
        Err(e) => {
            skip_without_loopback(&e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_failure_skips_unless_sockets_required() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "bind denied");
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| skip_without_loopback(&denied)));
        assert_eq!(outcome.is_err(), sockets_required());
    }
}
