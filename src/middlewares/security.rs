//! Access control for transaction operations.
//!
//! Rules are evaluated in registration order and the first match decides.
//! Operations that do not name an entity up front (`entities == None`) are
//! only subject to rules without a collection; single-entity reads are
//! checked again in the epilogue against the entity that was read.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::middleware::{ChangeTrackerItem, CrudAction, TransactionMiddleware};
use crate::result::{FailureReason, ServiceResult};

const USER_ID: &str = "user-id";
const ROLE: &str = "role";

/// Variables describing who is acting (user id, role, ...).
#[derive(Debug, Clone, Default)]
pub struct Session {
    variables: HashMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(variables: HashMap<String, String>) -> Self {
        Self { variables }
    }

    /// A session for `user_id` with `role`.
    pub fn for_user(user_id: impl Into<String>, role: impl Into<String>) -> Self {
        let mut session = Self::new();
        session.set(USER_ID, user_id);
        session.set(ROLE, role);
        session
    }

    pub fn user_id(&self) -> Option<&str> {
        self.get(USER_ID)
    }

    pub fn role(&self) -> Option<&str> {
        self.get(ROLE)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn has(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }
}

/// Shared, swappable session. Clones see the same session.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Session>>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    /// Replace the current session.
    pub fn set(&self, session: Session) {
        match self.inner.write() {
            Ok(mut current) => *current = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }

    pub fn current(&self) -> Session {
        match self.inner.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Who a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Anyone,
    User(String),
    Role(String),
}

impl Principal {
    fn matches(&self, session: &Session) -> bool {
        match self {
            Principal::Anyone => true,
            Principal::User(id) => session.user_id() == Some(id.as_str()),
            Principal::Role(role) => session.role() == Some(role.as_str()),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Anyone => write!(f, "anyone"),
            Principal::User(id) => write!(f, "user {}", id),
            Principal::Role(role) => write!(f, "role {}", role),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

/// One access rule. An unset collection or an empty action list matches
/// everything.
#[derive(Debug, Clone)]
pub struct AccessRule {
    principal: Principal,
    collection: Option<String>,
    actions: Vec<CrudAction>,
    effect: Effect,
}

impl AccessRule {
    pub fn allow(principal: Principal) -> Self {
        Self {
            principal,
            collection: None,
            actions: Vec::new(),
            effect: Effect::Allow,
        }
    }

    pub fn deny(principal: Principal) -> Self {
        Self {
            effect: Effect::Deny,
            ..Self::allow(principal)
        }
    }

    pub fn on_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn for_action(mut self, action: CrudAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    fn matches(&self, session: &Session, action: CrudAction, collection: Option<&str>) -> bool {
        if !self.principal.matches(session) {
            return false;
        }
        if !self.actions.is_empty() && !self.actions.contains(&action) {
            return false;
        }
        match (&self.collection, collection) {
            (None, _) => true,
            (Some(wanted), Some(actual)) => wanted == actual,
            (Some(_), None) => false,
        }
    }
}

/// Rejects operations the current session may not perform with
/// [`FailureReason::Forbidden`].
#[derive(Debug, Clone)]
pub struct SecurityMiddleware {
    session: SessionHandle,
    rules: Vec<AccessRule>,
    default_effect: Effect,
}

impl SecurityMiddleware {
    /// Allows everything no rule denies.
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session,
            rules: Vec::new(),
            default_effect: Effect::Allow,
        }
    }

    /// Denies everything no rule allows.
    pub fn deny_by_default(mut self) -> Self {
        self.default_effect = Effect::Deny;
        self
    }

    pub fn rule(mut self, rule: AccessRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Decision for one action on one collection.
    pub fn decide(&self, session: &Session, action: CrudAction, collection: Option<&str>) -> Effect {
        self.rules
            .iter()
            .find(|rule| rule.matches(session, action, collection))
            .map(|rule| rule.effect)
            .unwrap_or(self.default_effect)
    }

    /// Decision of the first rule that does not name a collection, if any.
    fn unscoped(&self, session: &Session, action: CrudAction) -> Option<Effect> {
        self.rules
            .iter()
            .find(|rule| rule.matches(session, action, None))
            .map(|rule| rule.effect)
    }

    fn check(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        let session = self.session.current();
        let denied = match entities {
            None => (self.unscoped(&session, action) == Some(Effect::Deny)).then_some("*"),
            Some(items) => items
                .iter()
                .map(|item| item.collection())
                .find(|collection| self.decide(&session, action, Some(*collection)) == Effect::Deny),
        }?;

        let actor = session.user_id().unwrap_or("anonymous");
        warn!(actor, %action, collection = denied, "operation denied");
        Some(ServiceResult::fail_with_message(
            FailureReason::Forbidden,
            format!("{} may not {} {}", actor, action, denied),
        ))
    }
}

impl TransactionMiddleware for SecurityMiddleware {
    fn name(&self) -> &str {
        "security"
    }

    fn prologue(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        self.check(action, entities)
    }

    fn epilogue(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        match (action, entities) {
            (CrudAction::Read, Some(items)) if !items.is_empty() => self.check(action, Some(items)),
            _ => None,
        }
    }
}
