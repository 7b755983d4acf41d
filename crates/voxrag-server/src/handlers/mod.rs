//! HTTP handlers for the VoxRAG REST API.
//!
//! Organized by domain:
//! - `error`: maps engine errors onto HTTP status codes and JSON bodies
//! - `service`: service descriptor, health check, stats
//! - `reset`: clears the in-memory index
//! - `ingest`: document and message ingestion
//! - `retrieve`: semantic retrieval

pub mod error;
pub mod ingest;
pub mod reset;
pub mod retrieve;
pub mod service;

pub use error::not_found;
pub use ingest::{ingest, ingest_message};
pub use reset::reset;
pub use retrieve::retrieve;
pub use service::{health, service_descriptor, stats};
