//! Rendezvous between "a decision is needed" and "a decision is made"
//!
//! A requester enqueues on an id and suspends; some later, unrelated call
//! (usually from the approval UI) resolves that id with a value or a
//! rejection. Every awaiter of the same id resolves together. Distinct ids
//! never affect each other.
//!
//! Opening UI is not the approver's job. The keeper does that, using the
//! `on_new` hook of [`AsyncApprover::enqueue`] to tell whether it created
//! the entry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApprovalError {
    #[error("Request rejected{}", reason_suffix(.0))]
    Rejected(Option<String>),
    #[error("Approval request expired")]
    Expired,
    #[error("Approver shut down")]
    Closed,
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|r| format!(": {}", r))
        .unwrap_or_default()
}

type Outcome<T> = Result<T, ApprovalError>;

enum Mode<T> {
    Interactive,
    /// Every request resolves immediately with this value
    AlwaysApprove(T),
}

/// Keyed registry of suspended approval requests.
pub struct AsyncApprover<T> {
    name: &'static str,
    mode: Mode<T>,
    timeout: Option<Duration>,
    pending: Mutex<HashMap<String, Vec<oneshot::Sender<Outcome<T>>>>>,
}

impl<T: Clone + Send> AsyncApprover<T> {
    /// Requests wait for an explicit `approve`/`reject`.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            mode: Mode::Interactive,
            timeout: None,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Requests resolve at once with `value`. Nothing ever waits.
    pub fn always_approve(name: &'static str, value: T) -> Self {
        log::warn!("{} approvals are configured to always approve", name);
        Self {
            name,
            mode: Mode::AlwaysApprove(value),
            timeout: None,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Fail each awaiter with [`ApprovalError::Expired`] after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_always_approve(&self) -> bool {
        matches!(self.mode, Mode::AlwaysApprove(_))
    }

    /// Suspend until `id` is approved or rejected.
    pub async fn request(&self, id: &str) -> Outcome<T> {
        self.enqueue(id, || {}).wait().await
    }

    /// Register interest in `id` without waiting yet.
    ///
    /// `on_new` runs once, under the registry lock, if this call created the
    /// pending entry rather than joining an existing one. It is not called in
    /// always-approve mode.
    pub fn enqueue<F: FnOnce()>(&self, id: &str, on_new: F) -> Ticket<'_, T> {
        if let Mode::AlwaysApprove(value) = &self.mode {
            log::debug!("[{}] auto-approving {}", self.name, id);
            return Ticket {
                approver: self,
                id: id.to_string(),
                state: TicketState::Ready(value.clone()),
            };
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending();
            let waiters = pending.entry(id.to_string()).or_default();
            waiters.retain(|w| !w.is_closed());
            if waiters.is_empty() {
                log::debug!("[{}] new pending request {}", self.name, id);
                on_new();
            } else {
                log::debug!(
                    "[{}] joining pending request {} ({} already waiting)",
                    self.name,
                    id,
                    waiters.len()
                );
            }
            waiters.push(tx);
        }

        Ticket {
            approver: self,
            id: id.to_string(),
            state: TicketState::Waiting(rx),
        }
    }

    /// Resolve every awaiter of `id` with `value`.
    ///
    /// Returns `false` if nothing was pending under `id`. That is not an error:
    /// UI actions race with expiry and double clicks.
    pub fn approve(&self, id: &str, value: T) -> bool {
        self.resolve(id, Ok(value))
    }

    /// Fail every awaiter of `id` with [`ApprovalError::Rejected`].
    ///
    /// Same tolerance for unknown ids as [`approve`](Self::approve).
    pub fn reject(&self, id: &str, reason: Option<String>) -> bool {
        self.resolve(id, Err(ApprovalError::Rejected(reason)))
    }

    fn resolve(&self, id: &str, outcome: Outcome<T>) -> bool {
        let waiters = self.pending().remove(id);
        match waiters {
            Some(waiters) => {
                log::debug!(
                    "[{}] resolving {} for {} awaiter(s): {}",
                    self.name,
                    id,
                    waiters.len(),
                    if outcome.is_ok() { "approved" } else { "rejected" }
                );
                for waiter in waiters {
                    // Receiver gone means that awaiter was cancelled
                    let _ = waiter.send(outcome.clone());
                }
                true
            }
            None => {
                log::debug!("[{}] no pending request {}, ignoring", self.name, id);
                false
            }
        }
    }

    /// Whether anyone is still waiting on `id`.
    pub fn is_pending(&self, id: &str) -> bool {
        self.pending()
            .get(id)
            .map(|waiters| waiters.iter().any(|w| !w.is_closed()))
            .unwrap_or(false)
    }

    /// Number of ids with live awaiters
    #[cfg(test)]
    fn pending_count(&self) -> usize {
        self.pending()
            .values()
            .filter(|waiters| waiters.iter().any(|w| !w.is_closed()))
            .count()
    }

    /// Drop awaiters that went away; drop the entry once none remain.
    fn prune(&self, id: &str) {
        let mut pending = self.pending();
        if let Some(waiters) = pending.get_mut(id) {
            waiters.retain(|w| !w.is_closed());
            if waiters.is_empty() {
                pending.remove(id);
            }
        }
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<String, Vec<oneshot::Sender<Outcome<T>>>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

enum TicketState<T> {
    Ready(T),
    Waiting(oneshot::Receiver<Outcome<T>>),
    Done,
}

/// One awaiter's place in the queue for an id.
///
/// Dropping a ticket without waiting (or while waiting) withdraws it.
pub struct Ticket<'a, T: Clone + Send> {
    approver: &'a AsyncApprover<T>,
    id: String,
    state: TicketState<T>,
}

impl<T: Clone + Send> Ticket<'_, T> {
    /// Suspend until resolution, expiry or shutdown.
    pub async fn wait(mut self) -> Outcome<T> {
        let rx = match std::mem::replace(&mut self.state, TicketState::Done) {
            TicketState::Ready(value) => return Ok(value),
            TicketState::Waiting(rx) => rx,
            TicketState::Done => return Err(ApprovalError::Closed),
        };

        let received = match self.approver.timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    log::info!(
                        "[{}] request {} expired after {:?}",
                        self.approver.name,
                        self.id,
                        limit
                    );
                    return Err(ApprovalError::Expired);
                }
            },
            None => rx.await,
        };

        received.unwrap_or(Err(ApprovalError::Closed))
    }
}

impl<T: Clone + Send> Drop for Ticket<'_, T> {
    fn drop(&mut self) {
        if matches!(self.state, TicketState::Ready(_)) {
            return;
        }
        // Close our receiver before pruning so it counts as gone
        self.state = TicketState::Done;
        self.approver.prune(&self.id);
    }
}
