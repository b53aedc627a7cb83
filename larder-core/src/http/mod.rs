//! Page retrieval through public relays.
//!
//! The importer only depends on the [`Retriever`] trait, so tests swap in
//! [`MockClient`] and never touch the network.

pub(crate) mod charset;
mod client;

pub use client::{MockClient, MockResponse, Relay, RelayClient, Retriever};
