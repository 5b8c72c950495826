//! Transaction integration tests.
//!
//! Exercises CRUD transactions end to end against the in-memory engine:
//! create / read / update / delete, optimistic concurrency, scoped
//! commit-on-drop, commit budgets, query limits and the async paths.

mod concurrency;
mod crud;
mod limits;
mod scoped;
