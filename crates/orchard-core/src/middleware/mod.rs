//! Request middleware
//!
//! Middleware runs around every request: `before` hooks in registration
//! order ahead of routing, `after` hooks in reverse order once a response
//! exists. A `before` hook ends the pipeline early by returning a response.

pub mod json_body;
pub mod logger;
pub mod timestamp;

pub use json_body::JsonBody;
pub use logger::Logger;
pub use timestamp::Timestamp;

use crate::{Request, Response};

/// Middleware trait - process request/response
pub trait Middleware: Send + Sync {
    /// Process request before routing; `Some` short-circuits with that response
    fn before(&self, req: &mut Request) -> Option<Response>;

    /// Process response after handler
    fn after(&self, _req: &Request, _res: &mut Response) {}
}

/// Middleware chain
#[derive(Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Run before middlewares, return early response if any
    ///
    /// On short-circuit, only the middlewares that already ran get their
    /// `after` hook.
    pub fn run_before(&self, req: &mut Request) -> Result<(), (usize, Response)> {
        for (i, m) in self.middlewares.iter().enumerate() {
            if let Some(res) = m.before(req) {
                return Err((i, res));
            }
        }
        Ok(())
    }

    /// Run after middlewares in reverse order, for the first `ran` entries
    pub fn run_after(&self, ran: usize, req: &Request, res: &mut Response) {
        for m in self.middlewares.iter().take(ran).rev() {
            m.after(req, res);
        }
    }
}
