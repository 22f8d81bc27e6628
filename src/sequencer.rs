//! Request tokens for superseding concurrent fetches

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic token identifying one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Issues request tokens and decides which responses may still be applied.
///
/// Two disciplines are supported:
/// - [`RequestSequencer::commit`]: a response is applied unless a newer response
///   was already applied (periodic polling, where every answer is equally valid).
/// - [`RequestSequencer::is_latest`]: only the most recently issued request may be
///   applied (parameter changes, where older answers are for the wrong parameters).
#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: AtomicU64,
    committed: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next token. Tokens start at 1.
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.issued.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        self.issued.load(Ordering::Acquire) == token.0
    }

    /// Record `token` as applied. Returns false if a newer token was already applied.
    pub fn commit(&self, token: RequestToken) -> bool {
        self.committed.fetch_max(token.0, Ordering::AcqRel) < token.0
    }

    /// Highest applied token, if any
    pub fn last_committed(&self) -> Option<RequestToken> {
        match self.committed.load(Ordering::Acquire) {
            0 => None,
            n => Some(RequestToken(n)),
        }
    }
}
