//! Persistence adapters.

pub mod memory;

pub use memory::{MemoryCaseStore, MemoryReportStore, MemoryResultStore};
