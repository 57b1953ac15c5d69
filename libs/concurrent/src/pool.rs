//! Fixed-size worker thread pool
//!
//! N workers share one lock-guarded FIFO task queue and a condition
//! variable. Shutdown policy: dropping the pool stops intake, but tasks
//! already queued are drained and executed before the workers exit, so
//! every successfully enqueued task runs exactly once.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Errors returned by [`ThreadPool::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("execute on a shut-down thread pool")]
    ShutDown,
}

struct PoolState {
    tasks: VecDeque<Job>,
    /// Tasks currently running on a worker.
    active: usize,
    shutdown: bool,
}

struct PoolInner {
    state: Mutex<PoolState>,
    available: Condvar,
    idle: Condvar,
}

/// Fixed worker pool with a shared FIFO task queue.
pub struct ThreadPool {
    inner: Arc<PoolInner>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Create a pool with `workers` threads.
    ///
    /// # Panics
    /// Panics if `workers` is zero.
    pub fn new(workers: usize) -> Self {
        assert!(workers > 0, "thread pool needs at least one worker");

        let inner = Arc::new(PoolInner {
            state: Mutex::new(PoolState {
                tasks: VecDeque::new(),
                active: 0,
                shutdown: false,
            }),
            available: Condvar::new(),
            idle: Condvar::new(),
        });

        let handles = (0..workers)
            .map(|index| {
                let inner = Arc::clone(&inner);
                thread::Builder::new()
                    .name(format!("pool-worker-{index}"))
                    .spawn(move || worker_loop(&inner))
                    .expect("failed to spawn pool worker")
            })
            .collect();

        Self {
            inner,
            workers: handles,
        }
    }

    /// Queue a task for execution. Fails once shutdown has begun.
    pub fn execute<F>(&self, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut state = self.inner.state.lock();
            if state.shutdown {
                return Err(PoolError::ShutDown);
            }
            state.tasks.push_back(Box::new(task));
        }
        self.inner.available.notify_one();
        Ok(())
    }

    /// Number of tasks waiting to be picked up.
    pub fn queued(&self) -> usize {
        self.inner.state.lock().tasks.len()
    }

    /// Block until the queue is empty and no task is running.
    pub fn wait_until_idle(&self) {
        let mut state = self.inner.state.lock();
        while !state.tasks.is_empty() || state.active > 0 {
            self.inner.idle.wait(&mut state);
        }
    }
}

fn worker_loop(inner: &PoolInner) {
    loop {
        let job = {
            let mut state = inner.state.lock();
            loop {
                if let Some(job) = state.tasks.pop_front() {
                    state.active += 1;
                    break Some(job);
                }
                if state.shutdown {
                    break None;
                }
                inner.available.wait(&mut state);
            }
        };
        match job {
            Some(job) => {
                job();
                let mut state = inner.state.lock();
                state.active -= 1;
                if state.tasks.is_empty() && state.active == 0 {
                    inner.idle.notify_all();
                }
            }
            None => return,
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        {
            let mut state = self.inner.state.lock();
            state.shutdown = true;
        }
        self.inner.available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
