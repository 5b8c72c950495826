//! Middleware pipeline integration tests.
//!
//! Runs real transactions through a `TritonService` and checks:
//! - prologues stop at the first halting middleware
//! - epilogues replace the outcome without undoing the operation
//! - early epilogues always run before late ones

mod support;
mod ordering;
