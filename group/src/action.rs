//! Payload actions carried by proposals and the router that dispatches them.
//!
//! The engine never interprets a payload itself. Each action type registers
//! an [`ActionHandler`] that can name the accounts whose authority the action
//! needs and can apply the action to the store.

use cohort_store::{KvStore, StoreError};
use cohort_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One opaque action, routed by `type_url`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub type_url: String,
    pub payload: Vec<u8>,
}

impl Action {
    pub fn new(type_url: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            type_url: type_url.into(),
            payload,
        }
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("no handler registered for {0}")]
    UnknownRoute(String),

    #[error("handler for {0} registered twice")]
    DuplicateHandler(String),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("{0}")]
    Failed(String),

    #[error("store: {0}")]
    Store(#[from] StoreError),
}

/// Executes one action type against external resources.
pub trait ActionHandler {
    /// The type URL this handler serves, e.g. `/bank.Send`.
    fn type_url(&self) -> &str;

    /// Accounts whose authority the action requires.
    fn required_signers(&self, payload: &[u8]) -> Result<Vec<Address>, ActionError>;

    /// Apply the action. On error, the caller discards every write made
    /// through `store` during this execution attempt.
    fn execute(&self, store: &mut dyn KvStore, payload: &[u8]) -> Result<(), ActionError>;
}

/// Type URL → handler table.
#[derive(Default)]
pub struct Router {
    handlers: BTreeMap<String, Box<dyn ActionHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H: ActionHandler + 'static>(&mut self, handler: H) -> Result<(), ActionError> {
        let url = handler.type_url().to_string();
        if self.handlers.contains_key(&url) {
            return Err(ActionError::DuplicateHandler(url));
        }
        self.handlers.insert(url, Box::new(handler));
        Ok(())
    }

    pub fn has_route(&self, type_url: &str) -> bool {
        self.handlers.contains_key(type_url)
    }

    fn handler(&self, type_url: &str) -> Result<&dyn ActionHandler, ActionError> {
        self.handlers
            .get(type_url)
            .map(|h| h.as_ref())
            .ok_or_else(|| ActionError::UnknownRoute(type_url.to_string()))
    }

    pub fn required_signers(&self, action: &Action) -> Result<Vec<Address>, ActionError> {
        self.handler(&action.type_url)?
            .required_signers(&action.payload)
    }

    pub fn dispatch(&self, store: &mut dyn KvStore, action: &Action) -> Result<(), ActionError> {
        self.handler(&action.type_url)?
            .execute(store, &action.payload)
    }
}
