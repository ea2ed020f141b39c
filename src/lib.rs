//! A live-session decoder for the [RMonitor Timing Protocol], line-based
//! and comma-delimited, as streamed over a Race Monitor WebSocket feed.
//!
//! The pipeline runs bottom-up: [`protocol`] decodes one line into a typed
//! [`protocol::Record`], [`dispatch`] folds that record into the
//! [`model::Session`], [`ordering`] re-sorts it and computes gaps/diffs,
//! and [`snapshot`] materializes the result as an immutable table pair.
//! [`batch`] wires those four together per incoming frame, and [`client`]
//! drives the whole thing from a live WebSocket connection, publishing
//! each new [`snapshot::Snapshot`] through a [`tokio::sync::watch`]
//! channel.
//!
//! [RMonitor Timing Protocol]: https://github.com/bradfier/rmonitor/blob/master/docs/RMonitor%20Timing%20Protocol.pdf

pub mod batch;
pub mod client;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod protocol;
pub mod snapshot;
pub mod time;
