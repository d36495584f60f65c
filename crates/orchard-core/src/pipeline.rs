//! Route handler chains
//!
//! Each route owns an ordered [`Chain`] of handlers. A handler either passes
//! control on ([`Flow::Next`]), answers ([`Flow::Respond`]) or reports a
//! failure ([`Flow::Fail`]) that the app turns into a 500.

use std::sync::Arc;

use crate::{AppState, Error, Request, Response, Result};

/// Outcome of a single handler
#[derive(Debug)]
pub enum Flow {
    /// Continue with the next handler in the chain
    Next,
    /// Stop and send this response
    Respond(Response),
    /// Stop and hand the error to the error handler
    Fail(Error),
}

impl From<Result<Response>> for Flow {
    fn from(result: Result<Response>) -> Self {
        match result {
            Ok(res) => Flow::Respond(res),
            Err(e) => Flow::Fail(e),
        }
    }
}

/// A pipeline stage
pub trait Handler: Send + Sync {
    fn call(&self, req: &Request, state: &AppState) -> Flow;
}

impl<F> Handler for F
where
    F: Fn(&Request, &AppState) -> Flow + Send + Sync,
{
    fn call(&self, req: &Request, state: &AppState) -> Flow {
        self(req, state)
    }
}

/// Ordered list of handlers for one route
#[derive(Clone, Default)]
pub struct Chain {
    handlers: Vec<Arc<dyn Handler>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain with a single handler
    pub fn of<H: Handler + 'static>(handler: H) -> Self {
        Self::new().then(handler)
    }

    /// Append a handler
    pub fn then<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run handlers until one responds or fails
    ///
    /// Returns [`Flow::Next`] when every handler passed.
    pub fn run(&self, req: &Request, state: &AppState) -> Flow {
        for handler in &self.handlers {
            match handler.call(req, state) {
                Flow::Next => continue,
                done => return done,
            }
        }
        Flow::Next
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain").field("handlers", &self.handlers.len()).finish()
    }
}
