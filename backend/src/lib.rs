//! Campus help-desk backend library.
//!
//! Students raise complaints, volunteers resolve them for points, and
//! administrators oversee the process. The crate follows a hexagonal layout:
//! `domain` owns the complaint lifecycle and its ports, `outbound` holds the
//! PostgreSQL adapters, and `inbound` exposes the REST surface.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use domain::TraceId;
pub use middleware::Trace;
