//! Request timestamp middleware

use super::Middleware;
use crate::{Request, Response};
use chrono::Utc;

/// Stamps each request with the time it entered the pipeline
#[derive(Debug, Default, Clone, Copy)]
pub struct Timestamp;

impl Middleware for Timestamp {
    fn before(&self, req: &mut Request) -> Option<Response> {
        req.received_at = Some(Utc::now());
        None
    }
}
