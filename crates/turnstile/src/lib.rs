//! Turnstile - FIFO exclusive lock for cooperatively scheduled code
//!
//! This crate provides a single primitive, [`ExclusiveLock`], which guarantees
//! that at most one logical critical section runs at a time across two calling
//! conventions:
//!
//! - [`ExclusiveLock::acquire`] suspends the caller until its turn in a FIFO
//!   wait chain arrives and yields a one-shot release capability.
//! - [`ExclusiveLock::guarded_call`] never suspends: it runs a synchronous
//!   callback under the lock, or fails immediately with
//!   [`LockError::Unavailable`] when the lock is already held.
//!
//! Both conventions observe the same `held` flag, so a synchronous holder is
//! visible to, and blocks, an asynchronous waiter and vice versa.
//!
//! The lock targets a single logical thread of control (a current-thread
//! executor). It is not reentrant, offers no fairness beyond FIFO order, and
//! does not coordinate across processes.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod error;
pub mod lock;

pub use error::{LockError, Result};
pub use lock::{ExclusiveLock, LockGuard};
