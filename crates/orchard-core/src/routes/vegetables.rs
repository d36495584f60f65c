//! Vegetables resource
//!
//! Routes are reserved but have no behavior yet; each answers 501.

use crate::{AppState, Flow, Request, Response, StatusCode};

pub fn not_implemented(_req: &Request, _state: &AppState) -> Flow {
    Flow::Respond(Response::new(StatusCode::NOT_IMPLEMENTED))
}
