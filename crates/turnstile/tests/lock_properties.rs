// Integration tests have relaxed clippy settings.
// Production code (src/) must use strict zero-unwrap/panic patterns.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Property-based tests for the wait chain.
//!
//! These tests use proptest to verify invariants:
//! - Grants follow registration order exactly
//! - At most one release capability is live at a time
//! - Dropped waiters forfeit their slots without stalling the chain

use std::task::Poll;

use proptest::prelude::*;
use tokio_test::task;
use turnstile::ExclusiveLock;

proptest! {
    /// Property: suspending acquirers are granted in the exact order they
    /// invoked `acquire`, and a release resumes only the next registrant.
    #[test]
    fn prop_grants_follow_registration_order(count in 1usize..12) {
        let lock = ExclusiveLock::new();
        let mut attempts: Vec<_> = (0..count).map(|_| task::spawn(lock.acquire())).collect();

        let mut guard = match attempts[0].poll() {
            Poll::Ready(Ok(guard)) => guard,
            _ => return Err(TestCaseError::fail("first acquirer must be granted immediately")),
        };
        for attempt in attempts.iter_mut().skip(1) {
            prop_assert!(attempt.poll().is_pending());
        }

        for index in 1..count {
            drop(guard);
            for (later, attempt) in attempts.iter_mut().enumerate().skip(index + 1) {
                prop_assert!(attempt.poll().is_pending(), "acquirer {} resumed early", later);
            }
            guard = match attempts[index].poll() {
                Poll::Ready(Ok(next)) => next,
                _ => return Err(TestCaseError::fail(format!("acquirer {index} was not granted in turn"))),
            };
        }

        drop(guard);
        prop_assert!(lock.guarded_call(|| ()).is_ok());
    }

    /// Property: waiters whose acquire future is dropped while queued are
    /// skipped; the survivors still see strict FIFO order.
    #[test]
    fn prop_dropped_waiters_are_skipped(drop_mask in prop::collection::vec(any::<bool>(), 1..10)) {
        let lock = ExclusiveLock::new();
        let total = drop_mask.len() + 1;
        let mut attempts: Vec<_> = (0..total).map(|_| Some(task::spawn(lock.acquire()))).collect();

        let first_poll = attempts[0].as_mut().unwrap().poll();
        let mut guard = match first_poll {
            Poll::Ready(Ok(guard)) => Some(guard),
            _ => return Err(TestCaseError::fail("first acquirer must be granted immediately")),
        };
        for attempt in attempts.iter_mut().skip(1) {
            prop_assert!(attempt.as_mut().unwrap().poll().is_pending());
        }

        for (offset, dropped) in drop_mask.iter().enumerate() {
            if *dropped {
                attempts[offset + 1] = None;
            }
        }
        let survivors: Vec<usize> = drop_mask
            .iter()
            .enumerate()
            .filter(|(_, dropped)| !**dropped)
            .map(|(offset, _)| offset + 1)
            .collect();

        for &index in &survivors {
            drop(guard.take());
            guard = match attempts[index].as_mut().unwrap().poll() {
                Poll::Ready(Ok(next)) => Some(next),
                _ => return Err(TestCaseError::fail(format!("surviving acquirer {index} was not granted in turn"))),
            };
        }

        drop(guard.take());
        prop_assert!(lock.guarded_call(|| ()).is_ok());
    }
}
