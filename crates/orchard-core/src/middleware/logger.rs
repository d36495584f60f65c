//! Request logging middleware
//!
//! One `info` line per request, one `debug` line per response.

use super::Middleware;
use crate::{Request, Response};
use tracing::{debug, info};

/// Logs method, url and timestamp of each request
#[derive(Debug, Default, Clone, Copy)]
pub struct Logger;

impl Logger {
    /// RFC 3339 arrival time, or `-` before the timestamp middleware ran
    pub fn arrival(req: &Request) -> String {
        req.received_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string())
    }

    /// The message logged for `req`
    pub fn describe(req: &Request) -> String {
        format!("request made to {} {} at {}", req.method, req.url(), Self::arrival(req))
    }
}

impl Middleware for Logger {
    fn before(&self, req: &mut Request) -> Option<Response> {
        info!(
            method = %req.method,
            path = %req.url(),
            at = %Self::arrival(req),
            "{}",
            Self::describe(req)
        );
        None
    }

    fn after(&self, req: &Request, res: &mut Response) {
        debug!(
            method = %req.method,
            path = %req.path,
            status = res.status.as_u16(),
            bytes = res.body.len(),
            "response sent"
        );
    }
}
