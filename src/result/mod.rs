//! Result model - the typed outcome of every data operation.
//!
//! Expected failures (not found, concurrency conflicts, forbidden access, ...)
//! are returned as values instead of errors, so UI and service layers can
//! bind to `reason()` / `message()` directly.
//!
//! ## Example
//!
//! ```ignore
//! use triton::{FailureReason, ServiceResult};
//!
//! let result: ServiceResult<User> = tx.read::<User>(&42);
//! match result.reason() {
//!     None => println!("loaded {}", result.value().unwrap().name),
//!     Some(FailureReason::NotFound) => println!("no such user"),
//!     Some(other) => println!("failed: {}", other),
//! }
//! ```

mod failure;
mod query;
mod service_result;

pub use failure::FailureReason;
pub use query::QueryServiceResult;
pub use service_result::ServiceResult;
