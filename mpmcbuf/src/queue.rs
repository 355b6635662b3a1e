// Copyright (C) 2025 Category Labs, Inc.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use crate::{
    common::{likely, round_capacity, unlikely, Slot},
    mpmc_trace,
    sync::{spin_loop, AtomicUsize, Ordering},
    MpmcBufError,
};
use crossbeam::utils::CachePadded;
use std::fmt;

/// Bounded multi-producer multi-consumer queue.
///
/// Every slot carries a sequence stamp; producers and consumers claim
/// positions with a CAS on `tail`/`head` and then hand the slot over by
/// publishing the next stamp. Neither side ever waits on the other: a full
/// queue rejects the push, an empty one returns `None`.
pub struct Queue<T> {
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
    slots: Box<[Slot<T>]>,
    mask: usize,
}

unsafe impl<T: Send> Send for Queue<T> {}
unsafe impl<T: Send> Sync for Queue<T> {}

impl<T> Queue<T> {
    /// Creates a queue holding at least `capacity` elements.
    ///
    /// The capacity is rounded up to the next power of two, with a minimum
    /// of two slots.
    pub fn with_capacity(capacity: usize) -> Result<Self, MpmcBufError> {
        let capacity = round_capacity(capacity)?;

        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity)?;
        slots.extend((0..capacity).map(Slot::new));

        Ok(Queue {
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            slots: slots.into_boxed_slice(),
            mask: capacity - 1,
        })
    }

    /// Attempts to append `value`, handing it back if the queue is full.
    pub fn push(&self, value: T) -> Result<(), T> {
        let mut pos = self.tail.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[pos & self.mask];
            let sequence = slot.sequence.load(Ordering::Acquire);
            let lag = sequence.wrapping_sub(pos) as isize;

            if likely(lag == 0) {
                match self.tail.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        slot.value.with_mut(|cell| unsafe {
                            (*cell).write(value);
                        });
                        slot.sequence.store(pos.wrapping_add(1), Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => pos = current,
                }
            } else if unlikely(lag < 0) {
                mpmc_trace!(pos = pos, capacity = self.capacity(), "push rejected: queue full");
                return Err(value);
            } else {
                pos = self.tail.load(Ordering::Relaxed);
            }
            spin_loop();
        }
    }

    /// Removes the oldest published element, if any.
    pub fn pop(&self) -> Option<T> {
        let mut pos = self.head.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[pos & self.mask];
            let sequence = slot.sequence.load(Ordering::Acquire);
            let lag = sequence.wrapping_sub(pos.wrapping_add(1)) as isize;

            if likely(lag == 0) {
                match self.head.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let value = slot.value.with(|cell| unsafe { (*cell).assume_init_read() });
                        slot.sequence
                            .store(pos.wrapping_add(self.mask + 1), Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => pos = current,
                }
            } else if lag < 0 {
                return None;
            } else {
                pos = self.head.load(Ordering::Relaxed);
            }
            spin_loop();
        }
    }

    /// Pops until the queue reports empty.
    ///
    /// Elements pushed concurrently while draining may or may not be yielded.
    pub fn drain(&self) -> Drain<'_, T> {
        Drain { queue: self }
    }

    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Number of claimed positions not yet consumed. Only a snapshot while
    /// other threads are active.
    pub fn len(&self) -> usize {
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            let head = self.head.load(Ordering::Acquire);
            if self.tail.load(Ordering::Acquire) == tail {
                return tail.wrapping_sub(head).min(self.capacity());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Drop for Queue<T> {
    fn drop(&mut self) {
        if std::mem::needs_drop::<T>() {
            while self.pop().is_some() {}
        }
    }
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

pub struct Drain<'a, T> {
    queue: &'a Queue<T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.queue.pop()
    }
}

impl<'a, T> IntoIterator for &'a Queue<T> {
    type Item = T;
    type IntoIter = Drain<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.drain()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use rstest::*;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize as StdAtomicUsize;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[fixture]
    fn queue() -> Queue<u64> {
        Queue::with_capacity(4).unwrap()
    }

    #[rstest]
    #[case(1, 2)]
    #[case(4, 4)]
    #[case(5, 8)]
    #[case(64, 64)]
    fn test_capacity_rounding(#[case] requested: usize, #[case] expected: usize) {
        let queue = Queue::<u64>::with_capacity(requested).unwrap();
        assert_eq!(queue.capacity(), expected);
        assert!(queue.is_empty());
    }

    #[rstest]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            Queue::<u64>::with_capacity(0),
            Err(MpmcBufError::ZeroCapacity)
        ));
    }

    #[rstest]
    fn test_pop_empty(queue: Queue<u64>) {
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.drain().count(), 0);
    }

    #[rstest]
    fn test_fifo_single_producer(queue: Queue<u64>) {
        for i in 1..=4 {
            queue.push(i).unwrap();
        }
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.drain().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[rstest]
    fn test_push_full_returns_value(queue: Queue<u64>) {
        for i in 1..=4 {
            queue.push(i).unwrap();
        }
        assert_eq!(queue.push(5), Err(5));
        assert_eq!(queue.len(), queue.capacity());
        assert_eq!(queue.drain().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[rstest]
    #[case(2)]
    #[case(8)]
    #[case(100)]
    fn test_overfill_never_exceeds_capacity(#[case] requested: usize) {
        let queue = Queue::with_capacity(requested).unwrap();
        let capacity = queue.capacity();
        let rejected = (0..=capacity).filter(|&i| queue.push(i).is_err()).count();
        assert_eq!(rejected, 1);
        assert_eq!(queue.len(), capacity);
    }

    #[rstest]
    fn test_wrap_around(queue: Queue<u64>) {
        let mut next = 0;
        for round in 0..1000u64 {
            queue.push(round * 2).unwrap();
            queue.push(round * 2 + 1).unwrap();
            assert_eq!(queue.pop(), Some(next));
            assert_eq!(queue.pop(), Some(next + 1));
            next += 2;
        }
        assert!(queue.is_empty());
    }

    #[rstest]
    fn test_drop_releases_queued_elements() {
        struct Counted(Arc<StdAtomicUsize>);

        impl Drop for Counted {
            fn drop(&mut self) {
                self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            }
        }

        let drops = Arc::new(StdAtomicUsize::new(0));
        let queue = Queue::with_capacity(8).unwrap();
        for _ in 0..5 {
            assert!(queue.push(Counted(drops.clone())).is_ok());
        }
        drop(queue.pop());
        assert_eq!(drops.load(std::sync::atomic::Ordering::Relaxed), 1);

        drop(queue);
        assert_eq!(drops.load(std::sync::atomic::Ordering::Relaxed), 5);
    }

    #[rstest]
    #[case::one_to_one(1, 1)]
    #[case::many_to_one(4, 1)]
    #[case::one_to_many(1, 4)]
    #[case::many_to_many(4, 4)]
    fn test_concurrent_no_loss_no_duplicates(#[case] producers: usize, #[case] consumers: usize) {
        const PER_PRODUCER: usize = 20_000;

        let queue = Arc::new(Queue::<(usize, usize)>::with_capacity(64).unwrap());
        let produced = Arc::new(StdAtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(producers + consumers));

        let producer_handles: Vec<_> = (0..producers)
            .map(|producer_id| {
                let queue = queue.clone();
                let barrier = barrier.clone();
                let produced = produced.clone();
                thread::spawn(move || {
                    barrier.wait();
                    for seq in 0..PER_PRODUCER {
                        let mut item = (producer_id, seq);
                        while let Err(rejected) = queue.push(item) {
                            item = rejected;
                            thread::yield_now();
                        }
                    }
                    produced.fetch_add(1, std::sync::atomic::Ordering::Release);
                })
            })
            .collect();

        let consumer_handles: Vec<_> = (0..consumers)
            .map(|_| {
                let queue = queue.clone();
                let barrier = barrier.clone();
                let produced = produced.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let mut seen = Vec::new();
                    loop {
                        match queue.pop() {
                            Some(item) => seen.push(item),
                            None => {
                                if produced.load(std::sync::atomic::Ordering::Acquire) == producers
                                    && queue.is_empty()
                                {
                                    break;
                                }
                                thread::yield_now();
                            }
                        }
                    }
                    seen
                })
            })
            .collect();

        for handle in producer_handles {
            handle.join().expect("producer thread panicked");
        }

        let mut all = HashSet::new();
        for handle in consumer_handles {
            let seen = handle.join().expect("consumer thread panicked");

            let mut last = vec![None; producers];
            for &(producer_id, seq) in &seen {
                assert!(producer_id < producers && seq < PER_PRODUCER, "fabricated item");
                if let Some(prev) = last[producer_id] {
                    assert!(seq > prev, "per-producer order violated");
                }
                last[producer_id] = Some(seq);
                assert!(all.insert((producer_id, seq)), "duplicate item");
            }
        }

        assert_eq!(all.len(), producers * PER_PRODUCER);
    }
}
