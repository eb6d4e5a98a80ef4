//! Port adapters backed by the real outside world.

pub mod reqwest_transport;
pub mod system_clock;

pub use reqwest_transport::ReqwestTransport;
pub use system_clock::SystemClock;
