//! Three cooperative workers serialize a read-modify-write across an await
//! point, then a guarded call takes a synchronous peek at the result.
//!
//! Run with: cargo run --example serialized_counter

use std::cell::Cell;

use turnstile::ExclusiveLock;

async fn bump(lock: &ExclusiveLock, slot: &Cell<u32>, worker: &str) -> turnstile::Result<()> {
    let guard = lock.acquire().await?;
    let seen = slot.get();
    // Without the lock, every worker would read the same value here.
    tokio::task::yield_now().await;
    slot.set(seen + 1);
    tracing::info!(worker, value = seen + 1, "updated the slot under the lock");
    guard.release();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let lock = ExclusiveLock::new();
    let slot = Cell::new(0_u32);

    let (a, b, c) = futures::join!(
        bump(&lock, &slot, "a"),
        bump(&lock, &slot, "b"),
        bump(&lock, &slot, "c"),
    );
    a?;
    b?;
    c?;

    let total = lock.guarded_call(|| slot.get())?;
    tracing::info!(total, "all workers done");

    Ok(())
}
