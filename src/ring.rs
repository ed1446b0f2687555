//! Lock-free single-producer/single-consumer ring channel.
//!
//! A fixed, power-of-two capacity circular buffer with two independently
//! owned cursors: the producer writes only `head`, the consumer writes only
//! `tail`. The producer publishes a slot with a release store to `head`
//! after writing it; the consumer acquire-loads `head` before reading, so a
//! popped item's contents are always fully visible. The tail side follows
//! the symmetric discipline for slot reuse.
//!
//! [`channel`] hands out one [`Producer`] and one [`Consumer`]; neither is
//! cloneable, so multi-producer or multi-consumer misuse cannot be
//! expressed. No locks, no blocking, and no allocation after construction.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Shared<T, const N: usize> {
    buf: Box<[UnsafeCell<MaybeUninit<T>>]>,
    /// Next slot the producer will write; owned by the producer
    head: AtomicUsize,
    /// Next slot the consumer will read; owned by the consumer
    tail: AtomicUsize,
}

impl<T, const N: usize> Shared<T, N> {
    const MASK: usize = N - 1;
    const CAPACITY_IS_POW2: () = assert!(N.is_power_of_two(), "ring capacity must be a power of two");
}

// The buffer is only ever touched from the single producer and single
// consumer, coordinated through the head/tail cursors.
unsafe impl<T: Send, const N: usize> Sync for Shared<T, N> {}

impl<T, const N: usize> Drop for Shared<T, N> {
    fn drop(&mut self) {
        // Both handles are gone; drain whatever was never popped.
        let head = *self.head.get_mut();
        let mut tail = *self.tail.get_mut();
        while tail != head {
            unsafe {
                (*self.buf[tail].get()).assume_init_drop();
            }
            tail = (tail + 1) & Self::MASK;
        }
    }
}

/// Create a ring channel with `N` slots (`N` must be a power of two).
///
/// One slot is sacrificed to distinguish full from empty, so the usable
/// capacity is `N - 1`.
pub fn channel<T, const N: usize>() -> (Producer<T, N>, Consumer<T, N>) {
    let () = Shared::<T, N>::CAPACITY_IS_POW2;

    let buf: Box<[UnsafeCell<MaybeUninit<T>>]> = (0..N)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect();

    let shared = Arc::new(Shared {
        buf,
        head: AtomicUsize::new(0),
        tail: AtomicUsize::new(0),
    });

    (
        Producer {
            shared: Arc::clone(&shared),
        },
        Consumer { shared },
    )
}

/// Producing half of the channel. Send it to the thread that creates orders.
pub struct Producer<T, const N: usize> {
    shared: Arc<Shared<T, N>>,
}

impl<T, const N: usize> Producer<T, N> {
    /// Non-blocking push. On a full ring the item is handed back unchanged;
    /// the caller decides whether to drop or retry.
    #[inline]
    pub fn push(&mut self, item: T) -> Result<(), T> {
        let head = self.shared.head.load(Ordering::Relaxed);
        let next = (head + 1) & Shared::<T, N>::MASK;

        if next == self.shared.tail.load(Ordering::Acquire) {
            return Err(item); // full
        }

        unsafe {
            (*self.shared.buf[head].get()).write(item);
        }
        self.shared.head.store(next, Ordering::Release);
        Ok(())
    }

    /// Usable capacity (`N - 1`).
    #[inline]
    pub fn capacity(&self) -> usize {
        N - 1
    }

    /// True if a `pop` on the consumer side would currently fail.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.head.load(Ordering::Acquire) == self.shared.tail.load(Ordering::Acquire)
    }
}

/// Consuming half of the channel. Send it to the matching thread.
pub struct Consumer<T, const N: usize> {
    shared: Arc<Shared<T, N>>,
}

impl<T, const N: usize> Consumer<T, N> {
    /// Non-blocking pop; `None` when the ring is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        let tail = self.shared.tail.load(Ordering::Relaxed);

        if tail == self.shared.head.load(Ordering::Acquire) {
            return None; // empty
        }

        let item = unsafe { (*self.shared.buf[tail].get()).assume_init_read() };
        self.shared.tail.store((tail + 1) & Shared::<T, N>::MASK, Ordering::Release);
        Some(item)
    }

    /// Usable capacity (`N - 1`).
    #[inline]
    pub fn capacity(&self) -> usize {
        N - 1
    }

    /// True if `pop` would currently fail.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.head.load(Ordering::Acquire) == self.shared.tail.load(Ordering::Acquire)
    }
}
