// src/ring.rs
//! Bounded, lock-free, single-producer/single-consumer ring buffer.
//!
//! One slot is always sacrificed to disambiguate empty (`head == tail`) from full
//! (`next(tail) == head`), matching the classic SPSC ring design: the producer
//! publishes a slot with a release store of `tail`, the consumer observes it with
//! an acquire load of `tail`, and symmetrically for `head`. `head` and `tail` each
//! live on their own cache line so producer and consumer never false-share.
//!
//! This type is the common base every typed queue in `queues` specializes. It is
//! deliberately hand-rolled rather than built on `crossbeam_channel`: the
//! memory-ordering contract here is a load-bearing, testable property, not an
//! implementation detail to delegate to a generic MPMC channel.

use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::error::{Error, Result};

/// Observer hooks invoked around submission/consumption. Defaults are no-ops;
/// overrides must be bounded-time and must not reach back into the ring.
pub trait QueueObserver<T>: Send + Sync {
    fn on_submit(&self, _value: &T) {}
    fn on_consume(&self, _value: &T) {}
    /// `submitted`/`consumed` are the ring's lifetime totals at the moment of
    /// rejection, for diagnostics — not the current occupancy.
    fn on_full(&self, _submitted: u64, _consumed: u64) {}
}

/// No-op observer, used where a queue doesn't need one.
#[derive(Debug, Default)]
pub struct NullObserver;
impl<T> QueueObserver<T> for NullObserver {}

/// Outcome of a `push` attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Ok,
    Full,
}

/// Bounded SPSC ring of `T`. `T` must be `Default` so a drained slot can be
/// replaced with an owned placeholder, releasing whatever resources it held.
pub struct Ring<T, O = NullObserver>
where
    T: Default,
    O: QueueObserver<T>,
{
    slots: Box<[UnsafeCell<T>]>,
    capacity: usize,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
    total_submitted: AtomicU64,
    total_consumed: AtomicU64,
    observer: O,
}

// SAFETY: access to `slots` is exclusive per-index, gated by the head/tail
// acquire/release protocol: the producer only ever touches `tail`'s slot, the
// consumer only ever touches `head`'s slot, and the two never overlap.
unsafe impl<T: Default + Send, O: QueueObserver<T>> Send for Ring<T, O> {}
unsafe impl<T: Default + Send, O: QueueObserver<T>> Sync for Ring<T, O> {}

impl<T: Default> Ring<T, NullObserver> {
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_observer(capacity, NullObserver)
    }
}

impl<T: Default, O: QueueObserver<T>> Ring<T, O> {
    pub fn with_observer(capacity: usize, observer: O) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Configuration("ring capacity must be > 0".into()));
        }
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || UnsafeCell::new(T::default()));
        Ok(Self {
            slots: slots.into_boxed_slice(),
            capacity,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            total_submitted: AtomicU64::new(0),
            total_consumed: AtomicU64::new(0),
            observer,
        })
    }

    #[inline]
    fn next_index(&self, idx: usize) -> usize {
        let n = idx + 1;
        if n == self.capacity { 0 } else { n }
    }

    /// Producer-only. Moves `value` into the ring or returns it via `Full`.
    pub fn push(&self, value: T) -> PushOutcome {
        let tail = self.tail.load(Ordering::Relaxed);
        let next = self.next_index(tail);
        let head = self.head.load(Ordering::Acquire);
        if next == head {
            self.observer.on_full(
                self.total_submitted.load(Ordering::Relaxed),
                self.total_consumed.load(Ordering::Relaxed),
            );
            return PushOutcome::Full;
        }
        self.observer.on_submit(&value);
        // SAFETY: only the producer writes slot `tail`, and the consumer cannot
        // reach it until our release store below publishes the new `tail`.
        unsafe {
            *self.slots[tail].get() = value;
        }
        self.tail.store(next, Ordering::Release);
        self.total_submitted.fetch_add(1, Ordering::Relaxed);
        PushOutcome::Ok
    }

    /// Consumer-only. Invokes `f` once per queued item, in submission order,
    /// draining everything currently available. Returns the number drained.
    pub fn drain<F: FnMut(T)>(&self, mut f: F) -> usize {
        let mut head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let mut drained = 0;
        while head != tail {
            // SAFETY: only the consumer reads/replaces slot `head`, and the
            // producer cannot reuse it until our release store below publishes
            // the advanced `head`.
            let value = unsafe {
                let slot = &mut *self.slots[head].get();
                std::mem::take(slot)
            };
            self.observer.on_consume(&value);
            f(value);
            head = self.next_index(head);
            drained += 1;
        }
        if drained > 0 {
            self.head.store(head, Ordering::Release);
            self.total_consumed.fetch_add(drained as u64, Ordering::Relaxed);
        }
        drained
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn approx_len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        if tail >= head {
            tail - head
        } else {
            self.capacity - head + tail
        }
    }

    pub fn is_empty(&self) -> bool {
        self.approx_len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.approx_len() == self.capacity - 1
    }

    pub fn total_submitted(&self) -> u64 {
        self.total_submitted.load(Ordering::Relaxed)
    }

    pub fn total_consumed(&self) -> u64 {
        self.total_consumed.load(Ordering::Relaxed)
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn rejects_zero_capacity() {
        assert!(Ring::<u32>::new(0).is_err());
    }

    #[test]
    fn fifo_order_single_thread() {
        let ring: Ring<u32> = Ring::new(8).unwrap();
        for i in 0..5 {
            assert_eq!(ring.push(i), PushOutcome::Ok);
        }
        let mut seen = Vec::new();
        ring.drain(|v| seen.push(v));
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn capacity_four_has_three_usable_slots() {
        let ring: Ring<u32> = Ring::new(4).unwrap();
        assert_eq!(ring.push(1), PushOutcome::Ok);
        assert_eq!(ring.push(2), PushOutcome::Ok);
        assert_eq!(ring.push(3), PushOutcome::Ok);
        assert_eq!(ring.push(4), PushOutcome::Full);
        assert_eq!(ring.total_submitted(), 3);

        let mut drained = Vec::new();
        assert_eq!(ring.drain(|v| drained.push(v)), 3);
        assert_eq!(drained, vec![1, 2, 3]);

        assert_eq!(ring.push(5), PushOutcome::Ok);
        assert_eq!(ring.push(6), PushOutcome::Ok);
        assert_eq!(ring.push(7), PushOutcome::Ok);
    }

    #[test]
    fn submitted_minus_consumed_tracks_used() {
        let ring: Ring<u32> = Ring::new(16).unwrap();
        for i in 0..10 {
            ring.push(i);
        }
        ring.drain(|_| {});
        assert_eq!(ring.total_submitted() - ring.total_consumed(), 0);
        assert!(ring.is_empty());
    }

    #[test]
    fn cross_thread_producer_consumer_preserves_order() {
        let ring = std::sync::Arc::new(Ring::<u32>::new(64).unwrap());
        let producer_ring = ring.clone();
        let producer = thread::spawn(move || {
            let mut i = 0u32;
            while i < 2000 {
                if producer_ring.push(i) == PushOutcome::Ok {
                    i += 1;
                }
            }
        });

        let mut received = Vec::with_capacity(2000);
        while received.len() < 2000 {
            ring.drain(|v| received.push(v));
        }
        producer.join().unwrap();

        for (idx, value) in received.iter().enumerate() {
            assert_eq!(*value, idx as u32);
        }
    }
}
