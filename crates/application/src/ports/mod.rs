//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the engine and external systems.
//! Each port is a trait that can be implemented by adapters in the
//! infrastructure layer, and by mocks in tests.

mod cancellation;
mod clock;
mod http;
mod store;

pub use cancellation::{CancellationReceiver, CancellationToken, cancellation_pair};
pub use clock::Clock;
pub use http::{HttpTransport, RequestPlan, TransportError};
pub use store::{CaseStore, ReportStore, ResultStore, StoreError};
