// Query gate
// Only the most recently announced intent to execute is allowed to execute
//
// The gate is a correctness guard, not a security boundary: tokens are minted
// and consumed inside the same process. Its job is to stop a caller that got a
// token, waited, and then fires against an intent that has since been
// superseded.
//
// What it does NOT do: two callers holding the same current token both pass.
// A token stays valid until the next one is issued, it is not consumed on use.

use crate::error::{GateError, Result};
use crate::query::{QueryRunner, ResultSet};
use std::fmt;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

/// Opaque 128-bit identifier authorizing one query execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionToken(Uuid);

impl ActionToken {
    fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Holds the current token and the runner that queries are delegated to
pub struct QueryGate<R> {
    runner: R,
    current: RwLock<ActionToken>,
}

impl<R: QueryRunner> QueryGate<R> {
    /// Create a gate in front of `runner`
    ///
    /// The gate starts with a token nobody has been handed, so nothing can
    /// execute until `issue_token` is called.
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            current: RwLock::new(ActionToken::mint()),
        }
    }

    /// Mint a fresh token and make it the current one
    /// Any previously issued token stops being accepted immediately
    pub fn issue_token(&self) -> ActionToken {
        let token = ActionToken::mint();
        // A token is a plain value, a poisoned lock still holds a whole one
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = token;
        tracing::trace!(%token, "Action token issued");
        token
    }

    /// The token `execute` currently accepts
    pub fn current_token(&self) -> ActionToken {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `query` if `token` is the current token
    pub fn execute(&self, query: &str, token: ActionToken) -> Result<ResultSet> {
        self.authorize(token)?;
        self.runner.run(query)
    }

    /// Like `execute`, but through the runner's single-row path
    pub fn execute_single(&self, query: &str, token: ActionToken) -> Result<ResultSet> {
        self.authorize(token)?;
        self.runner.run_single(query)
    }

    /// Borrow the runner behind the gate
    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn authorize(&self, token: ActionToken) -> Result<()> {
        let current = self.current_token();
        if current != token {
            tracing::warn!(presented = %token, %current, "Rejected stale action token");
            return Err(GateError::Authorization);
        }
        Ok(())
    }
}
