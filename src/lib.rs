extern crate self as triton;

mod config;
mod engine;
mod middleware;
pub mod middlewares;
mod model;
mod result;
mod service;
pub mod transaction;

pub use config::TritonConfig;
pub use engine::{
    CommitBatch, CommitReceipt, EngineError, EntityState, InMemoryEngine, PersistenceEngine,
    StagedWrite,
};
pub use middleware::{
    ChangeTrackerItem, CrudAction, MiddlewareAction, MiddlewareConfigurator, MiddlewarePipeline,
    MiddlewareRunner, TransactionConfiguration, TransactionMiddleware,
};
pub use model::{storage_key, EntityRef, Model, ModelKey, RowVersion, TrackedEntity};
pub use result::{FailureReason, QueryServiceResult, ServiceResult};
pub use service::{ServiceError, TransactionFactory, TritonService};
pub use transaction::{
    CrudReadTransaction, CrudReadWriteTransaction, CrudTransaction, CrudWriteTransaction,
    ReadTransaction, ScopedTransaction, WriteTransaction,
};

// Derive macro for `Model`; lives in the macro namespace next to the trait.
pub use triton_macros::Model;

// Re-export the EventEmitter used by `middlewares::EmitterNotifier`
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
