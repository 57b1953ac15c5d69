//! Partition-keyed ingress bus
//!
//! The engine's order intake rides on a partitioned log: messages with the
//! same key land in the same partition and are delivered in publish order,
//! which is how a multi-threaded HTTP front turns into a serialized
//! per-user stream at the matcher. This crate provides the client surface
//! (`connect` / `publish` / `subscribe` / `disconnect`) over an in-process
//! partition set; the binding to an external broker is deliberately out of
//! scope, only the contract matters.

pub mod client;
pub mod endpoint;
pub mod message;

pub use client::{BusError, QueueClient, CONSUMER_GROUP};
pub use endpoint::EndpointError;
pub use message::Message;

/// Topic carrying raw order requests from the HTTP surface to the engine.
pub const ORDER_TOPIC: &str = "order-requests";
