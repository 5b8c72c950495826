//! Bundled middleware integration tests.
//!
//! Attaches the shipped middlewares to a real service and checks their
//! effect on transactions: access control, journaling, peer notification,
//! timing statistics and failure injection.

mod journal;
mod security;
