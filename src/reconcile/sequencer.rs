// ABOUTME: Monotonic request tokens for discarding superseded fetch responses.
// ABOUTME: A response is applied only if no newer response has been applied already.

/// Identifies one fetch request. Later requests carry larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Per-resource token issuer. Recreated on every identity change, so tokens
/// from a previous resource can never be accepted.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: u64,
    applied: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a request about to be sent.
    pub fn issue(&mut self) -> RequestToken {
        self.issued += 1;
        RequestToken(self.issued)
    }

    /// Whether a response for `token` may still be applied.
    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 > self.applied
    }

    /// Claim `token` for application. Returns false if a newer response
    /// already won, in which case the caller must discard its result.
    pub fn accept(&mut self, token: RequestToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.applied = token.0;
        true
    }

    /// Invalidate every request issued so far, e.g. after a fresher
    /// snapshot arrived over the stream.
    pub fn supersede_all(&mut self) {
        self.applied = self.issued;
    }

    pub fn last_applied(&self) -> Option<RequestToken> {
        (self.applied > 0).then_some(RequestToken(self.applied))
    }
}
