use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use triton::{ChangeTrackerItem, CrudAction, FailureReason, Model, ServiceResult, TransactionMiddleware};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Model)]
#[model(collection = "users")]
pub struct User {
    pub id: u64,
    pub name: String,
}

pub fn ada() -> User {
    User {
        id: 1,
        name: "Ada".into(),
    }
}

pub fn grace() -> User {
    User {
        id: 2,
        name: "Grace".into(),
    }
}

#[derive(Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn push(&self, line: String) {
        self.0.lock().unwrap().push(line);
    }

    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Records `label:pre:action` / `label:post:action`, optionally halting in
/// the prologue.
pub struct Step {
    label: &'static str,
    trace: Trace,
    halt_with: Option<FailureReason>,
}

impl Step {
    pub fn new(label: &'static str, trace: &Trace) -> Self {
        Self {
            label,
            trace: trace.clone(),
            halt_with: None,
        }
    }

    pub fn halting(label: &'static str, trace: &Trace, reason: FailureReason) -> Self {
        Self {
            halt_with: Some(reason),
            ..Self::new(label, trace)
        }
    }
}

impl TransactionMiddleware for Step {
    fn prologue(&self, action: CrudAction, _: Option<&[ChangeTrackerItem]>) -> Option<ServiceResult> {
        self.trace.push(format!("{}:pre:{}", self.label, action));
        self.halt_with.map(ServiceResult::fail_with)
    }

    fn epilogue(&self, action: CrudAction, _: Option<&[ChangeTrackerItem]>) -> Option<ServiceResult> {
        self.trace.push(format!("{}:post:{}", self.label, action));
        None
    }
}
