use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out request tickets so that a response arriving after a newer
/// request was issued can be recognised and dropped.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request; supersedes every earlier ticket.
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Hand back `output` only if `ticket` is still the newest request.
    pub fn settle<T>(&self, ticket: Ticket, output: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(output)
        } else {
            tracing::debug!(ticket = ticket.0, "dropping superseded response");
            None
        }
    }

    /// Run `request` and return its output only if no newer request started
    /// while it was in flight. The ticket is taken when this is called, not
    /// when the returned future is first polled.
    pub fn latest<'a, T, F>(&'a self, request: F) -> impl Future<Output = Option<T>> + 'a
    where
        F: Future<Output = T> + 'a,
        T: 'a,
    {
        let ticket = self.begin();
        async move {
            let output = request.await;
            self.settle(ticket, output)
        }
    }
}
