//! Cancellation and deadline token passed along with every remote call.

use std::time::{Duration, Instant};

use snafu::Snafu;
use tokio_util::sync::CancellationToken;

/// Carries a cancellation signal and an optional deadline to a [`KmsClient`](crate::client::KmsClient).
///
/// Clones share the same cancellation state. The library never cancels a context on its own,
/// it only hands it to the client, which is expected to stop work once [`Context::err`]
/// reports a reason.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

/// Why a context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Snafu)]
pub enum ContextError {
    #[snafu(display("context canceled"))]
    Cancelled,
    #[snafu(display("context deadline exceeded"))]
    DeadlineExceeded,
}

impl Context {
    /// A context that is never cancelled and has no deadline, unless [`Context::cancel`] is
    /// called on it.
    pub fn background() -> Self {
        Self::default()
    }

    /// Wrap an existing cancellation token.
    pub fn new(token: CancellationToken) -> Self {
        Context {
            token,
            deadline: None,
        }
    }

    /// Derive a context that is cancelled together with `self`, but can also be
    /// cancelled on its own without affecting `self`.
    pub fn child(&self) -> Self {
        Context {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Returns a copy of this context that expires at `deadline`.
    ///
    /// An earlier deadline already present is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline, `None` if there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// `None` while the context is live, otherwise the reason it is done.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// The underlying token, for clients that want to `select!` on
    /// [`CancellationToken::cancelled`].
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl From<CancellationToken> for Context {
    fn from(token: CancellationToken) -> Self {
        Context::new(token)
    }
}
