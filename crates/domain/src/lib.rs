//! Verity Domain - Core business types
//!
//! This crate defines the domain model for the Verity test execution engine.
//! All types here are pure Rust with no I/O dependencies.

pub mod assertion;
pub mod case;
pub mod error;
pub mod method;
pub mod report;
pub mod response;
pub mod result;

pub use assertion::{AssertOperator, AssertionOutcome, AssertionSpec, ExtractionKind};
pub use case::{Bindings, CaseDefinition};
pub use error::{DomainError, DomainResult};
pub use method::HttpMethod;
pub use report::{OutcomeCounts, ReportStatus, RunReport};
pub use response::{ResponseBody, ResponseSnapshot};
pub use result::{CaseOutcome, CaseResult};
