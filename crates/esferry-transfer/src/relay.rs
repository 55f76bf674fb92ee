//! Relay queue between scan workers and the upload worker
//!
//! A bounded multi-producer single-consumer channel carries tagged messages.
//! The bound is the backpressure mechanism: when the upload worker falls
//! behind the broker, producers block in `send` instead of buffering the
//! cluster into memory.
//!
//! Protocol per unit of work:
//! - exactly one [`RelayMessage::ExpectedTotal`], before any documents
//! - any number of [`RelayMessage::Document`]
//! - exactly one [`RelayMessage::EndOfStream`] per producer
//!
//! The consumer stops after it has seen every producer's end-of-stream
//! marker. Anything else (a second total, a closed channel with markers
//! outstanding) is a protocol violation that fails the unit.

use esferry_common::records::Document;
use tokio::sync::mpsc;

/// Message on the relay queue
#[derive(Debug)]
pub enum RelayMessage {
    /// Total documents the unit is expected to deliver, announced once
    /// before any document
    ExpectedTotal(u64),
    /// One source document, untransformed
    Document(Document),
    /// One per producer; the stream is complete when all have arrived
    EndOfStream,
}

pub type RelaySender = mpsc::Sender<RelayMessage>;
pub type RelayReceiver = mpsc::Receiver<RelayMessage>;

/// Create the bounded relay queue for one unit of work
pub fn relay_channel(capacity: usize) -> (RelaySender, RelayReceiver) {
    mpsc::channel(capacity.max(1))
}
