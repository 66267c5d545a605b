//! One-shot response channel shared by a run and its timeout timer.

use super::Response;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct ChannelState {
    written: AtomicBool,
    rejected: AtomicUsize,
    slot: Mutex<Option<Response>>,
}

/// The response side of one request.
///
/// The first write wins; every later write is rejected and counted. Once
/// written the channel stays written, even after the response is taken.
#[derive(Clone, Default)]
pub struct ResponseChannel {
    state: Arc<ChannelState>,
}

impl ResponseChannel {
    /// Creates an unwritten channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once a response has been written.
    #[must_use]
    pub fn is_written(&self) -> bool {
        self.state.written.load(Ordering::SeqCst)
    }

    /// Writes the response if nothing has been written yet.
    ///
    /// Returns true when this call won.
    pub fn write(&self, response: Response) -> bool {
        let mut slot = self.state.slot.lock();
        if self.state.written.load(Ordering::SeqCst) {
            self.state.rejected.fetch_add(1, Ordering::SeqCst);
            return false;
        }
        *slot = Some(response);
        self.state.written.store(true, Ordering::SeqCst);
        true
    }

    /// Takes the written response out of the channel.
    #[must_use]
    pub fn take(&self) -> Option<Response> {
        self.state.slot.lock().take()
    }

    /// Returns a copy of the written response.
    #[must_use]
    pub fn peek(&self) -> Option<Response> {
        self.state.slot.lock().clone()
    }

    /// Number of writes rejected because the channel was already written.
    #[must_use]
    pub fn rejected_writes(&self) -> usize {
        self.state.rejected.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for ResponseChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseChannel")
            .field("written", &self.is_written())
            .field("rejected_writes", &self.rejected_writes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_write_wins() {
        let channel = ResponseChannel::new();
        assert!(!channel.is_written());

        assert!(channel.write(Response::json(200, json!("first"))));
        assert!(!channel.write(Response::json(408, json!("second"))));

        assert!(channel.is_written());
        assert_eq!(channel.rejected_writes(), 1);
        assert_eq!(channel.peek().unwrap().status, 200);
    }

    #[test]
    fn test_take_keeps_channel_written() {
        let channel = ResponseChannel::new();
        channel.write(Response::json(201, json!(null)));

        assert_eq!(channel.take().map(|r| r.status), Some(201));
        assert!(channel.take().is_none());
        assert!(channel.is_written());
        assert!(!channel.write(Response::json(200, json!(null))));
    }

    #[test]
    fn test_clones_share_state() {
        let channel = ResponseChannel::new();
        let other = channel.clone();
        other.write(Response::json(204, json!(null)));
        assert!(channel.is_written());
    }
}
