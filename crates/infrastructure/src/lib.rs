//! Verity Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod persistence;

pub use adapters::{ReqwestTransport, SystemClock};
pub use persistence::{MemoryCaseStore, MemoryReportStore, MemoryResultStore};
