//! Bounded multi-producer single-consumer queue
//!
//! A fixed-capacity ring of cells, each carrying a sequence counter that
//! gates access:
//!
//! - a cell is writable iff its sequence equals the producer's claimed
//!   position; publishing stores `position + 1`
//! - a cell is readable iff its sequence equals `position + 1`; after
//!   move-out the consumer stores `position + capacity`, reopening the cell
//!   for the next lap
//!
//! Producers claim positions with a CAS on the enqueue cursor, so global
//! FIFO order follows claim order. The consumer side is single-threaded by
//! contract: `dequeue`/`try_dequeue` must only ever be called from one
//! thread at a time.
//!
//! Capacity is rounded up to the next power of two and indices are masked.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Construction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("queue capacity must be non-zero")]
    ZeroCapacity,
}

/// Returned by [`BoundedQueue::try_enqueue`] when the queue is full; carries
/// the rejected value back to the caller.
pub struct QueueFull<T>(pub T);

impl<T> fmt::Debug for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueueFull(..)")
    }
}

impl<T> fmt::Display for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue is full")
    }
}

struct Cell<T> {
    sequence: AtomicUsize,
    value: Mutex<Option<T>>,
}

/// Fixed-capacity MPSC queue with per-cell sequence gating.
pub struct BoundedQueue<T> {
    cells: Box<[Cell<T>]>,
    mask: usize,
    capacity: usize,
    enqueue_pos: AtomicUsize,
    dequeue_pos: AtomicUsize,
    gate: Mutex<()>,
    space_available: Condvar,
    data_available: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at least `capacity` items (rounded up to the
    /// next power of two).
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        let capacity = capacity.next_power_of_two();
        let cells = (0..capacity)
            .map(|i| Cell {
                sequence: AtomicUsize::new(i),
                value: Mutex::new(None),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Ok(Self {
            cells,
            mask: capacity - 1,
            capacity,
            enqueue_pos: AtomicUsize::new(0),
            dequeue_pos: AtomicUsize::new(0),
            gate: Mutex::new(()),
            space_available: Condvar::new(),
            data_available: Condvar::new(),
        })
    }

    /// Total capacity after power-of-two rounding.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Approximate number of items currently queued. Never exceeds
    /// [`capacity`](Self::capacity).
    pub fn len(&self) -> usize {
        let enqueue = self.enqueue_pos.load(Ordering::Acquire);
        let dequeue = self.dequeue_pos.load(Ordering::Acquire);
        enqueue.wrapping_sub(dequeue).min(self.capacity)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-blocking enqueue. On a full queue the value is handed back.
    pub fn try_enqueue(&self, value: T) -> Result<(), QueueFull<T>> {
        let mut pos = self.enqueue_pos.load(Ordering::Relaxed);
        loop {
            let cell = &self.cells[pos & self.mask];
            let seq = cell.sequence.load(Ordering::Acquire);
            let lag = seq.wrapping_sub(pos) as isize;

            if lag == 0 {
                // Writable: claim the position.
                match self.enqueue_pos.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        *cell.value.lock() = Some(value);
                        cell.sequence.store(pos.wrapping_add(1), Ordering::Release);
                        let _gate = self.gate.lock();
                        self.data_available.notify_one();
                        return Ok(());
                    }
                    Err(current) => pos = current,
                }
            } else if lag < 0 {
                // The cell has not been reopened by the consumer yet: the
                // ring is a full lap behind, so the queue is full.
                return Err(QueueFull(value));
            } else {
                // Another producer claimed this position; reload and retry.
                pos = self.enqueue_pos.load(Ordering::Relaxed);
            }
        }
    }

    /// Blocking enqueue: parks until a cell is reopened by the consumer.
    pub fn enqueue(&self, value: T) {
        let mut value = value;
        loop {
            match self.try_enqueue(value) {
                Ok(()) => return,
                Err(QueueFull(v)) => {
                    value = v;
                    let mut guard = self.gate.lock();
                    while self.len() >= self.capacity {
                        self.space_available.wait(&mut guard);
                    }
                }
            }
        }
    }

    /// Non-blocking dequeue. Returns `None` when the next cell has not been
    /// published yet. Single-consumer contract.
    pub fn try_dequeue(&self) -> Option<T> {
        let pos = self.dequeue_pos.load(Ordering::Relaxed);
        let cell = &self.cells[pos & self.mask];

        if cell.sequence.load(Ordering::Acquire) != pos.wrapping_add(1) {
            return None;
        }

        // The publish store above guarantees the value is present.
        let value = cell.value.lock().take();
        cell.sequence
            .store(pos.wrapping_add(self.capacity), Ordering::Release);
        self.dequeue_pos.store(pos.wrapping_add(1), Ordering::Relaxed);

        let _gate = self.gate.lock();
        self.space_available.notify_one();
        value
    }

    /// Blocking dequeue: parks until a value is published.
    pub fn dequeue(&self) -> T {
        loop {
            if let Some(value) = self.try_dequeue() {
                return value;
            }
            let mut guard = self.gate.lock();
            while self.is_empty() {
                self.data_available.wait(&mut guard);
            }
        }
    }
}
