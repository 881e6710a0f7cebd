//! FIFO admission and cancellation of movement requests.
//!
//! Every request takes a ticket on submission and starts stepping only when
//! it is the oldest ticket left. `cancel_all` revokes every ticket at once;
//! running requests notice at their next tick.

use tokio::sync::watch;

/// Whether a queued request may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request is first in line.
    Admitted,
    /// The request was cancelled while waiting.
    Cancelled,
}

#[derive(Debug, Default)]
struct GateState {
    next_id: u64,
    pending: Vec<u64>,
    sleeping: Vec<u64>,
}

impl GateState {
    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.sleeping.is_empty()
    }
}

/// Insertion ordered set of pending requests plus active sleeps.
#[derive(Debug)]
pub struct ConcurrencyGate {
    state: watch::Sender<GateState>,
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ConcurrencyGate {
    /// Create an idle gate.
    pub fn new() -> Self {
        let (state, _) = watch::channel(GateState::default());
        Self { state }
    }

    /// Queue a new request. The ticket leaves the queue when dropped.
    pub fn submit(&self) -> Ticket<'_> {
        let mut id = 0;
        self.state.send_modify(|s| {
            id = s.allocate();
            s.pending.push(id);
        });
        Ticket { gate: self, id }
    }

    /// Wait until `id` is first in line or has been cancelled.
    pub async fn wait_turn(&self, id: u64) -> Admission {
        let mut rx = self.state.subscribe();
        let admitted = rx
            .wait_for(|s| s.pending.first() == Some(&id) || !s.pending.contains(&id))
            .await
            .map(|s| s.pending.first() == Some(&id))
            .unwrap_or(false);

        if admitted {
            Admission::Admitted
        } else {
            Admission::Cancelled
        }
    }

    /// Check if a request is still queued or running.
    pub fn is_pending(&self, id: u64) -> bool {
        self.state.borrow().pending.contains(&id)
    }

    /// Remove a request from the queue.
    pub fn finish(&self, id: u64) {
        self.state.send_if_modified(|s| {
            let before = s.pending.len();
            s.pending.retain(|p| *p != id);
            s.pending.len() != before
        });
    }

    /// Cancel every queued or running request and every sleep.
    ///
    /// Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        self.state.send_if_modified(|s| {
            cancelled = s.pending.len() + s.sleeping.len();
            s.pending.clear();
            s.sleeping.clear();
            cancelled > 0
        });
        cancelled
    }

    /// Register a timed sleep. It ends when the guard is dropped.
    pub fn begin_sleep(&self) -> SleepGuard<'_> {
        let mut id = 0;
        self.state.send_modify(|s| {
            id = s.allocate();
            s.sleeping.push(id);
        });
        SleepGuard { gate: self, id }
    }

    fn end_sleep(&self, id: u64) {
        self.state.send_if_modified(|s| {
            let before = s.sleeping.len();
            s.sleeping.retain(|p| *p != id);
            s.sleeping.len() != before
        });
    }

    /// Resolve once the sleep `id` has been cancelled.
    pub async fn wait_cancelled(&self, id: u64) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|s| !s.sleeping.contains(&id)).await;
    }

    /// Wait until nothing is queued, running or sleeping.
    pub async fn ready_wait(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(GateState::is_idle).await;
    }

    /// Check if nothing is queued, running or sleeping.
    pub fn is_idle(&self) -> bool {
        self.state.borrow().is_idle()
    }

    /// Number of queued and running requests.
    pub fn pending_len(&self) -> usize {
        self.state.borrow().pending.len()
    }
}

/// A request's place in the queue.
#[derive(Debug)]
pub struct Ticket<'a> {
    gate: &'a ConcurrencyGate,
    id: u64,
}

impl Ticket<'_> {
    /// Request id.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        self.gate.finish(self.id);
    }
}

/// An active timed sleep.
#[derive(Debug)]
pub struct SleepGuard<'a> {
    gate: &'a ConcurrencyGate,
    id: u64,
}

impl SleepGuard<'_> {
    /// Sleep id.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for SleepGuard<'_> {
    fn drop(&mut self) {
        self.gate.end_sleep(self.id);
    }
}
