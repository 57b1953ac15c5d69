//! Asynchronous per-file log sink
//!
//! One sink owns one append-mode file and one writer thread fed by an
//! unbounded string queue. `add_log` only enqueues. `stop` pushes a
//! reserved sentinel and joins the writer, which drains every message
//! queued before the sentinel, so the durability contract is: after `stop`
//! returns, everything enqueued before the call is on disk. Messages
//! enqueued after `stop` are silently dropped.
//!
//! The sender lives behind an RwLock: `stop` takes the write side to push
//! the sentinel and retire the sender in one critical section, so no
//! producer can slip a message in behind the sentinel.

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use uuid::Uuid;

/// Sink failures. I/O problems after startup are swallowed (best effort).
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to spawn log writer thread: {0}")]
    Spawn(std::io::Error),
}

/// Append-only file sink with a single writer thread.
pub struct AsyncLogSink {
    path: PathBuf,
    sentinel: String,
    sender: RwLock<Option<Sender<String>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AsyncLogSink {
    /// Create a sink for `path`. The file is not opened until [`start`].
    ///
    /// [`start`]: Self::start
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            // Reserved in-band stop marker; the random component makes a
            // collision with a real message statistically impossible.
            sentinel: format!("{}-STOP", Uuid::new_v4()),
            sender: RwLock::new(None),
            worker: Mutex::new(None),
        }
    }

    /// Open the file in append mode and spawn the writer thread.
    /// Idempotent while running.
    pub fn start(&self) -> Result<(), SinkError> {
        let mut sender_slot = self.sender.write();
        if sender_slot.is_some() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| SinkError::Open {
                path: self.path.clone(),
                source,
            })?;

        let (tx, rx) = channel::unbounded::<String>();
        let sentinel = self.sentinel.clone();
        let handle = thread::Builder::new()
            .name("log-sink".into())
            .spawn(move || writer_loop(file, &rx, &sentinel))
            .map_err(SinkError::Spawn)?;

        *sender_slot = Some(tx);
        *self.worker.lock() = Some(handle);
        Ok(())
    }

    /// Enqueue one message. Never blocks on I/O; drops silently once the
    /// sink is stopped.
    pub fn add_log(&self, message: String) {
        if let Some(tx) = self.sender.read().as_ref() {
            let _ = tx.send(message);
        }
    }

    /// Push the sentinel, join the writer, and close the file. Everything
    /// enqueued before this call is flushed to disk before it returns.
    pub fn stop(&self) {
        {
            let mut sender_slot = self.sender.write();
            match sender_slot.take() {
                Some(tx) => {
                    let _ = tx.send(self.sentinel.clone());
                }
                None => return,
            }
        }
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }

    /// Whether the writer thread is running.
    pub fn is_running(&self) -> bool {
        self.sender.read().is_some()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AsyncLogSink {
    fn drop(&mut self) {
        self.stop();
    }
}

fn writer_loop(mut file: File, rx: &Receiver<String>, sentinel: &str) {
    while let Ok(message) = rx.recv() {
        if message == sentinel {
            // Flush anything queued ahead of the sentinel, then exit.
            while let Ok(remaining) = rx.try_recv() {
                if remaining != sentinel {
                    write_line(&mut file, &remaining);
                }
            }
            break;
        }
        write_line(&mut file, &message);
    }
}

fn write_line(file: &mut File, message: &str) {
    // Best effort: log I/O failures must not take the engine down.
    let _ = writeln!(file, "{message}");
    let _ = file.flush();
}
