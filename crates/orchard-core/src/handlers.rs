//! Terminal handlers

use crate::{AppState, Error, Flow, Request, Response};
use tracing::error;

/// Answers 404 with an empty body
pub fn not_found(_req: &Request, _state: &AppState) -> Flow {
    Flow::Respond(Response::not_found())
}

/// Turns a forwarded error into a generic 500
///
/// The error is logged; the client only sees the reason phrase.
pub fn server_error(req: &Request, err: &Error) -> Response {
    error!(method = %req.method, path = %req.path, error = %err, "request failed");
    Response::internal_error()
}
