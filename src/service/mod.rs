//! TritonService - the entry point that hands out transactions.
//!
//! The service owns the middleware configuration, the runtime settings and a
//! [`TransactionFactory`] that supplies engine handles. Middleware is
//! registered up front; the first transaction seals the configuration into a
//! shared [`MiddlewarePipeline`] and later registrations are rejected.
//!
//! ## Quick Start
//!
//! ```ignore
//! use triton::{CrudWriteTransaction, InMemoryEngine, TritonService};
//! use triton::middlewares::LoggingMiddleware;
//!
//! let service = TritonService::new(InMemoryEngine::new())
//!     .attach(LoggingMiddleware::new());
//!
//! let mut tx = service.transaction();
//! tx.create(user);
//! tx.commit();
//! ```

mod error;

use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::config::TritonConfig;
use crate::engine::{InMemoryEngine, PersistenceEngine};
use crate::middleware::{
    ChangeTrackerItem, CrudAction, MiddlewareConfigurator, MiddlewarePipeline,
    TransactionConfiguration, TransactionMiddleware,
};
use crate::result::ServiceResult;
use crate::transaction::{CrudTransaction, ReadTransaction, ScopedTransaction, WriteTransaction};

pub use error::ServiceError;

/// Supplies an engine handle for each new transaction.
pub trait TransactionFactory: Send + Sync {
    type Engine: PersistenceEngine;

    fn engine(&self) -> Self::Engine;
}

impl TransactionFactory for InMemoryEngine {
    type Engine = InMemoryEngine;

    fn engine(&self) -> InMemoryEngine {
        self.clone()
    }
}

/// Orchestrates middleware configuration and transaction creation.
pub struct TritonService<F: TransactionFactory> {
    factory: F,
    config: TritonConfig,
    configuration: TransactionConfiguration,
    pipeline: OnceLock<Arc<MiddlewarePipeline>>,
}

impl<F: TransactionFactory> TritonService<F> {
    pub fn new(factory: F) -> Self {
        Self::with_config(factory, TritonConfig::default())
    }

    /// Values the config would fail `validate` on fall back to defaults.
    pub fn with_config(factory: F, config: TritonConfig) -> Self {
        Self {
            factory,
            config: config.sanitized(),
            configuration: TransactionConfiguration::new(),
            pipeline: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &TritonConfig {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn is_sealed(&self) -> bool {
        self.pipeline.get().is_some()
    }

    /// Mutable access to the middleware registry. Fails once a transaction
    /// has been opened.
    pub fn configuration_mut(&mut self) -> Result<&mut TransactionConfiguration, ServiceError> {
        if self.is_sealed() {
            return Err(ServiceError::ConfigurationSealed);
        }
        Ok(&mut self.configuration)
    }

    fn configure(mut self, register: impl FnOnce(&mut TransactionConfiguration)) -> Self {
        match self.configuration_mut() {
            Ok(configuration) => register(configuration),
            Err(err) => warn!(error = %err, "ignoring middleware registration"),
        }
        self
    }

    pub fn attach<T: TransactionMiddleware + 'static>(self, middleware: T) -> Self {
        self.configure(|c| {
            c.attach(middleware);
        })
    }

    pub fn attach_late<T: TransactionMiddleware + 'static>(self, middleware: T) -> Self {
        self.configure(|c| {
            c.attach_late(middleware);
        })
    }

    pub fn attach_default<T: TransactionMiddleware + Default + 'static>(self) -> Self {
        self.configure(|c| {
            c.attach_default::<T>();
        })
    }

    pub fn add_prologue<A>(self, action: A) -> Self
    where
        A: Fn(CrudAction, Option<&[ChangeTrackerItem]>) -> Option<ServiceResult>
            + Send
            + Sync
            + 'static,
    {
        self.configure(|c| {
            c.add_prologue(action);
        })
    }

    pub fn add_epilogue<A>(self, action: A) -> Self
    where
        A: Fn(CrudAction, Option<&[ChangeTrackerItem]>) -> Option<ServiceResult>
            + Send
            + Sync
            + 'static,
    {
        self.configure(|c| {
            c.add_epilogue(action);
        })
    }

    pub fn add_late_epilogue<A>(self, action: A) -> Self
    where
        A: Fn(CrudAction, Option<&[ChangeTrackerItem]>) -> Option<ServiceResult>
            + Send
            + Sync
            + 'static,
    {
        self.configure(|c| {
            c.add_late_epilogue(action);
        })
    }

    /// The sealed pipeline, built on first use.
    pub fn pipeline(&self) -> Arc<MiddlewarePipeline> {
        let pipeline = self.pipeline.get_or_init(|| {
            let pipeline = self.configuration.runner();
            debug!(
                prologues = pipeline.prologue_count(),
                epilogues = pipeline.epilogue_count(),
                "middleware configuration sealed"
            );
            Arc::new(pipeline)
        });
        Arc::clone(pipeline)
    }

    /// A read-write transaction.
    pub fn transaction(&self) -> CrudTransaction<F::Engine> {
        CrudTransaction::new(self.factory.engine(), self.pipeline(), self.config.clone())
    }

    pub fn read_transaction(&self) -> ReadTransaction<F::Engine> {
        ReadTransaction::new(self.transaction())
    }

    pub fn write_transaction(&self) -> WriteTransaction<F::Engine> {
        WriteTransaction::new(self.transaction())
    }

    /// A transaction that commits pending changes when dropped.
    pub fn scoped_transaction(&self) -> ScopedTransaction<F::Engine> {
        ScopedTransaction::new(self.transaction())
    }
}
