//! Bus client: partition-keyed publish and a single-threaded subscribe loop
//!
//! `publish` hashes the key onto one of N FIFO partitions. One consumer
//! thread polls every partition and invokes the registered topic handler
//! synchronously, so everything downstream of `subscribe` runs on a single
//! thread — the engine relies on this to keep books and users single-writer.

use crate::endpoint::{validate_brokers, EndpointError};
use crate::message::Message;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::Hasher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

/// Fixed consumer-group identity of the engine.
pub const CONSUMER_GROUP: &str = "trading-engine-consumers";

const DEFAULT_PARTITIONS: usize = 16;
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Handler invoked on the consumer thread for each record of a topic.
pub type MessageHandler = Box<dyn Fn(&Message) + Send + 'static>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error("bus client is not connected")]
    NotConnected,
    #[error("failed to publish message to partition")]
    PublishFailed,
    #[error("failed to start consumer thread")]
    ConsumerSpawn,
}

struct Partitions {
    senders: Vec<Sender<Message>>,
}

/// Client handle over the partitioned ingress log.
pub struct QueueClient {
    brokers: String,
    partition_count: usize,
    partitions: RwLock<Option<Partitions>>,
    handlers: Arc<Mutex<FxHashMap<String, MessageHandler>>>,
    running: Arc<AtomicBool>,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl QueueClient {
    /// Create a client for the given broker list (validated on `connect`).
    pub fn new(brokers: impl Into<String>) -> Self {
        Self::with_partitions(brokers, DEFAULT_PARTITIONS)
    }

    /// Create a client with an explicit partition count.
    pub fn with_partitions(brokers: impl Into<String>, partition_count: usize) -> Self {
        assert!(partition_count > 0, "bus needs at least one partition");
        Self {
            brokers: brokers.into(),
            partition_count,
            partitions: RwLock::new(None),
            handlers: Arc::new(Mutex::new(FxHashMap::default())),
            running: Arc::new(AtomicBool::new(false)),
            consumer: Mutex::new(None),
        }
    }

    /// Validate the broker endpoints, build the partition set, and start
    /// the consumer loop. Fails without side effects on invalid endpoints.
    pub fn connect(&self) -> Result<(), BusError> {
        validate_brokers(&self.brokers)?;

        let mut slot = self.partitions.write();
        if slot.is_some() {
            return Ok(());
        }

        let mut senders = Vec::with_capacity(self.partition_count);
        let mut receivers: Vec<Receiver<Message>> = Vec::with_capacity(self.partition_count);
        for _ in 0..self.partition_count {
            let (tx, rx) = channel::unbounded();
            senders.push(tx);
            receivers.push(rx);
        }

        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        let handlers = Arc::clone(&self.handlers);
        let spawned = thread::Builder::new()
            .name("bus-consumer".into())
            .spawn(move || consume_loop(&receivers, handlers.as_ref(), running.as_ref()));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(_) => {
                self.running.store(false, Ordering::Release);
                return Err(BusError::ConsumerSpawn);
            }
        };

        *slot = Some(Partitions { senders });
        *self.consumer.lock() = Some(handle);
        debug!(
            brokers = %self.brokers,
            group = CONSUMER_GROUP,
            partitions = self.partition_count,
            "bus connected"
        );
        Ok(())
    }

    /// Stop the consumer loop and tear down the partitions. Records already
    /// enqueued are drained before the loop exits.
    pub fn disconnect(&self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.consumer.lock().take() {
            let _ = handle.join();
        }
        *self.partitions.write() = None;
    }

    pub fn is_connected(&self) -> bool {
        self.partitions.read().is_some()
    }

    /// Publish one record. Records with equal keys go to the same
    /// partition and are delivered in publish order.
    pub fn publish(&self, topic: &str, key: &str, value: &str) -> Result<(), BusError> {
        let guard = self.partitions.read();
        let partitions = guard.as_ref().ok_or(BusError::NotConnected)?;

        let index = partition_for(key, partitions.senders.len());
        let message = Message::new(topic, key, value, now_ms());
        partitions.senders[index]
            .send(message)
            .map_err(|_| BusError::PublishFailed)
    }

    /// Register the handler for a topic. All subscribed topics share the
    /// one consumer loop.
    pub fn subscribe(
        &self,
        topic: &str,
        handler: impl Fn(&Message) + Send + 'static,
    ) -> Result<(), BusError> {
        if !self.is_connected() {
            return Err(BusError::NotConnected);
        }
        self.handlers
            .lock()
            .insert(topic.to_string(), Box::new(handler));
        Ok(())
    }

    /// Deregister a topic handler. Returns false if it was not registered.
    pub fn unsubscribe(&self, topic: &str) -> bool {
        self.handlers.lock().remove(topic).is_some()
    }
}

impl Drop for QueueClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn consume_loop(
    receivers: &[Receiver<Message>],
    handlers: &Mutex<FxHashMap<String, MessageHandler>>,
    running: &AtomicBool,
) {
    loop {
        let drained = drain_once(receivers, handlers);
        if !running.load(Ordering::Acquire) {
            // Final sweep so records accepted before disconnect are not lost.
            while drain_once(receivers, handlers) > 0 {}
            return;
        }
        if drained == 0 {
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn drain_once(
    receivers: &[Receiver<Message>],
    handlers: &Mutex<FxHashMap<String, MessageHandler>>,
) -> usize {
    let mut delivered = 0;
    for rx in receivers {
        while let Ok(message) = rx.try_recv() {
            delivered += 1;
            let handlers = handlers.lock();
            match handlers.get(&message.topic) {
                Some(handler) => handler(&message),
                None => warn!(topic = %message.topic, "no handler for topic, dropping record"),
            }
        }
    }
    delivered
}

fn partition_for(key: &str, partitions: usize) -> usize {
    let mut hasher = FxHasher::default();
    hasher.write(key.as_bytes());
    (hasher.finish() as usize) % partitions
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn wait_until(deadline_ms: u64, mut check: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_millis(deadline_ms);
        while Instant::now() < deadline {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_connect_rejects_bad_brokers() {
        let client = QueueClient::new("redpanda:9092");
        assert!(matches!(client.connect(), Err(BusError::Endpoint(_))));
        assert!(!client.is_connected());
    }

    #[test]
    fn test_publish_requires_connect() {
        let client = QueueClient::new("localhost:9092");
        assert_eq!(
            client.publish("order-requests", "u1", "{}"),
            Err(BusError::NotConnected)
        );
    }

    #[test]
    fn test_subscribe_requires_connect() {
        let client = QueueClient::new("localhost:9092");
        assert!(matches!(
            client.subscribe("order-requests", |_| {}),
            Err(BusError::NotConnected)
        ));
    }

    #[test]
    fn test_publish_subscribe_roundtrip() {
        let client = QueueClient::new("localhost:9092");
        client.connect().unwrap();

        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        {
            let seen = Arc::clone(&seen);
            client
                .subscribe("order-requests", move |msg| {
                    seen.lock().push(msg.value.clone());
                })
                .unwrap();
        }

        client.publish("order-requests", "u1", "a").unwrap();
        client.publish("order-requests", "u1", "b").unwrap();

        assert!(wait_until(2000, || seen.lock().len() == 2));
        assert_eq!(*seen.lock(), vec!["a".to_string(), "b".to_string()]);
        client.disconnect();
    }

    #[test]
    fn test_per_key_fifo_across_many_keys() {
        let client = QueueClient::with_partitions("localhost:9092", 4);
        client.connect().unwrap();

        let seen = Arc::new(Mutex::new(Vec::<(String, u32)>::new()));
        {
            let seen = Arc::clone(&seen);
            client
                .subscribe("order-requests", move |msg| {
                    let n: u32 = msg.value.parse().unwrap();
                    seen.lock().push((msg.key.clone(), n));
                })
                .unwrap();
        }

        let keys = ["u1", "u2", "u3", "u4", "u5"];
        for i in 0..50u32 {
            for key in keys {
                client
                    .publish("order-requests", key, &i.to_string())
                    .unwrap();
            }
        }

        assert!(wait_until(2000, || seen.lock().len() == 250));
        let seen = seen.lock();
        for key in keys {
            let sequence: Vec<u32> = seen
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, n)| *n)
                .collect();
            assert_eq!(sequence, (0..50).collect::<Vec<u32>>(), "key {key}");
        }
        client.disconnect();
    }

    #[test]
    fn test_disconnect_drains_pending_records() {
        let client = QueueClient::new("localhost:9092");
        client.connect().unwrap();

        let count = Arc::new(Mutex::new(0usize));
        {
            let count = Arc::clone(&count);
            client
                .subscribe("order-requests", move |_| {
                    *count.lock() += 1;
                })
                .unwrap();
        }

        for i in 0..200 {
            client
                .publish("order-requests", "u1", &i.to_string())
                .unwrap();
        }
        client.disconnect();
        assert_eq!(*count.lock(), 200);
    }

    #[test]
    fn test_unsubscribe() {
        let client = QueueClient::new("localhost:9092");
        client.connect().unwrap();
        client.subscribe("order-requests", |_| {}).unwrap();
        assert!(client.unsubscribe("order-requests"));
        assert!(!client.unsubscribe("order-requests"));
        client.disconnect();
    }

    #[test]
    fn test_same_key_same_partition() {
        for partitions in [1, 2, 4, 16] {
            let a = partition_for("u1", partitions);
            let b = partition_for("u1", partitions);
            assert_eq!(a, b);
            assert!(a < partitions);
        }
    }
}
