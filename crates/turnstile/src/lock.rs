//! The exclusive lock and its two acquisition protocols.
//!
//! State is one `held` flag plus a FIFO wait chain of pending suspending
//! acquirers. The suspending path queues behind every earlier acquirer and is
//! woken in registration order; the guarded path only ever toggles `held` and
//! never touches the chain. A suspending acquirer therefore re-checks `held`
//! when its turn arrives: a guarded call may have taken the flag while the
//! waiter was waking up, and that interleaving is reported as
//! [`LockError::Unavailable`] rather than queued past. This re-check is a
//! sharp edge of mixing the two protocols on one flag, not an optimization
//! target.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::error::{LockError, Result};

/// Internal lock state: the `held` flag and the wait chain.
#[derive(Debug, Default)]
struct ChainState {
    /// Whether a critical section currently occupies the lock
    held: bool,
    /// Whether a suspending acquirer currently owns the front of the chain
    front_claimed: bool,
    /// Queued suspending acquirers, woken in registration order
    waiters: VecDeque<oneshot::Sender<()>>,
}

/// A mutual-exclusion primitive for cooperatively scheduled code.
///
/// At most one critical section runs at a time, whether it was entered
/// through [`acquire`](Self::acquire) or through
/// [`guarded_call`](Self::guarded_call). Create one instance per protected
/// resource; instances share no state.
#[derive(Debug, Default)]
pub struct ExclusiveLock {
    chain: Mutex<ChainState>,
}

impl ExclusiveLock {
    /// Create a new, idle lock
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock, suspending until this caller's turn arrives.
    ///
    /// Callers are served in the exact order they invoke `acquire`. The
    /// returned [`LockGuard`] is a one-shot release capability: the lock is
    /// freed when the guard is dropped (or via [`LockGuard::release`]), and
    /// the next queued waiter is woken.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Unavailable`] when this caller's turn arrives
    /// while the lock is held through the guarded path. The failed turn is
    /// handed to the next waiter, so the chain keeps moving.
    pub async fn acquire(&self) -> Result<LockGuard<'_>> {
        let queued = {
            let mut chain = self.chain_state();
            if chain.front_claimed {
                let (grant, turn) = oneshot::channel();
                chain.waiters.push_back(grant);
                Some(turn)
            } else {
                // Nobody ahead of us; take the front without suspending.
                chain.front_claimed = true;
                None
            }
        };

        if let Some(turn) = queued {
            Ticket::new(self, turn).wait().await?;
        }

        self.claim_front()
    }

    /// Run `callback` while holding the lock, without ever suspending.
    ///
    /// If the lock is free, `held` is set for the duration of the callback
    /// and cleared again on every exit path, unwinding included. The
    /// callback's value is returned unchanged; pass arguments by capturing
    /// them in the closure. The guarded path takes no position in the wait
    /// chain, so queued suspending acquirers keep their order.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Unavailable`] when the lock is already held,
    /// through either protocol. The callback is not invoked in that case.
    pub fn guarded_call<T>(&self, callback: impl FnOnce() -> T) -> Result<T> {
        {
            let mut chain = self.chain_state();
            if chain.held {
                tracing::debug!("guarded call refused: lock already held");
                return Err(LockError::Unavailable);
            }
            chain.held = true;
        }
        tracing::trace!("lock taken through the guarded path");

        let reset = HeldReset { lock: self };
        let value = callback();
        drop(reset);

        Ok(value)
    }

    /// Post-wait step shared by both grant paths. The caller must own the
    /// front of the chain.
    fn claim_front(&self) -> Result<LockGuard<'_>> {
        let mut chain = self.chain_state();
        if chain.held {
            // A guarded call took the flag while this acquirer was waking
            // up. Pass the front on before reporting failure.
            Self::advance(&mut chain);
            tracing::debug!("suspending acquire refused: lock held through the guarded path");
            return Err(LockError::Unavailable);
        }
        chain.held = true;
        tracing::trace!("lock taken through the suspending path");
        Ok(LockGuard { lock: self })
    }

    /// Hand the front of the chain to the next live waiter, or mark the
    /// chain idle when none is queued. Waiters whose acquire future was
    /// dropped while queued are skipped.
    fn advance(chain: &mut ChainState) {
        while let Some(grant) = chain.waiters.pop_front() {
            if grant.send(()).is_ok() {
                return;
            }
        }
        chain.front_claimed = false;
    }

    /// The guarded state is a plain flag and queue, so a poisoned mutex
    /// carries no torn invariant worth propagating.
    fn chain_state(&self) -> MutexGuard<'_, ChainState> {
        self.chain.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A queued acquisition attempt waiting for its turn.
///
/// Dropping a ticket withdraws the attempt from the chain. If the grant had
/// already been delivered, the front is passed on to the next waiter so the
/// chain never wedges on an abandoned acquire future.
struct Ticket<'a> {
    lock: &'a ExclusiveLock,
    turn: oneshot::Receiver<()>,
    claimed: bool,
}

impl<'a> Ticket<'a> {
    const fn new(lock: &'a ExclusiveLock, turn: oneshot::Receiver<()>) -> Self {
        Self {
            lock,
            turn,
            claimed: false,
        }
    }

    /// Suspend until the front of the chain is ours.
    async fn wait(mut self) -> Result<()> {
        match (&mut self.turn).await {
            Ok(()) => {
                self.claimed = true;
                Ok(())
            }
            // The lock outlives every borrow of it, so a queued grant is
            // only ever dropped unsent when this receiver closed first.
            Err(_) => Err(LockError::Unavailable),
        }
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        if self.claimed {
            return;
        }
        self.turn.close();
        if self.turn.try_recv().is_ok() {
            // Granted after the waiter stopped listening; keep the chain
            // moving.
            let mut chain = self.lock.chain_state();
            ExclusiveLock::advance(&mut chain);
        }
    }
}

/// Clears `held` when a guarded callback finishes, on every exit path. The
/// guarded path owns no chain position, so no waiter is woken here.
struct HeldReset<'a> {
    lock: &'a ExclusiveLock,
}

impl Drop for HeldReset<'_> {
    fn drop(&mut self) {
        self.lock.chain_state().held = false;
        tracing::trace!("lock released through the guarded path");
    }
}

/// One-shot release capability returned by a successful
/// [`ExclusiveLock::acquire`].
///
/// The lock is released exactly once, when the guard is dropped; every exit
/// path of the protected section releases it. Releasing wakes the next
/// queued waiter, if any.
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: &'a ExclusiveLock,
}

impl LockGuard<'_> {
    /// Release the lock now instead of at end of scope
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        let mut chain = self.lock.chain_state();
        chain.held = false;
        ExclusiveLock::advance(&mut chain);
        tracing::trace!("lock released through the suspending path");
    }
}
