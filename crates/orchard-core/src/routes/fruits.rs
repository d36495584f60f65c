//! Fruit CRUD handlers
//!
//! Records are addressed by their `id`. PUT and PATCH need a positive
//! integer id; DELETE takes any integer and ignores ids that match nothing.
//! Other ids are a 400 with an empty body, as is a JSON body that is not an
//! object. A missing or non-JSON body counts as an empty object.

use serde_json::{Map, Value};
use tracing::debug;

use crate::{AppState, Error, Flow, Request, Response, StatusCode};

/// Parse the `:id` path segment
fn record_id(req: &Request) -> Result<u64, Error> {
    let raw = req.param("id").unwrap_or_default();
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(Error::InvalidRecordId(raw.to_string())),
    }
}

/// Parse the `:id` segment of a delete; `None` for ids no record can hold
fn delete_id(req: &Request) -> Result<Option<u64>, Error> {
    let raw = req.param("id").unwrap_or_default();
    let id = raw
        .parse::<i64>()
        .map_err(|_| Error::InvalidRecordId(raw.to_string()))?;
    Ok(u64::try_from(id).ok())
}

/// The JSON object body, cloned for storage
fn record_fields(req: &Request) -> Result<Map<String, Value>, Error> {
    if req.json.is_none() {
        return Ok(Map::new());
    }
    req.json_object()
        .cloned()
        .ok_or_else(|| Error::InvalidBody("expected a JSON object".to_string()))
}

fn reject(req: &Request, err: Error) -> Flow {
    debug!(method = %req.method, path = %req.path, error = %err, "rejected");
    Flow::Respond(Response::bad_request())
}

/// `POST /fruits`
pub fn create_fruit(req: &Request, state: &AppState) -> Flow {
    let fields = match record_fields(req) {
        Ok(fields) => fields,
        Err(e) => return reject(req, e),
    };
    let fruit = state.store.create(fields);
    Response::json(StatusCode::CREATED, &fruit).into()
}

/// `GET /fruits`, first stage
pub fn log_attempt(_req: &Request, _state: &AppState) -> Flow {
    debug!("attempting to get fruits");
    Flow::Next
}

/// `GET /fruits`, second stage
pub fn log_continue(_req: &Request, _state: &AppState) -> Flow {
    debug!("continuing the attempt");
    Flow::Next
}

/// `GET /fruits`, final stage
pub fn list_fruits(_req: &Request, state: &AppState) -> Flow {
    Response::json(StatusCode::OK, &state.store.list()).into()
}

/// `PUT /fruits/:id` - full replace
///
/// An unknown id passes control on, so the route's not-found stage answers.
pub fn replace_fruit(req: &Request, state: &AppState) -> Flow {
    let id = match record_id(req) {
        Ok(id) => id,
        Err(e) => return reject(req, e),
    };
    let fields = match record_fields(req) {
        Ok(fields) => fields,
        Err(e) => return reject(req, e),
    };
    match state.store.replace(id, fields) {
        Some(fruit) => Response::json(StatusCode::OK, &fruit).into(),
        None => Flow::Next,
    }
}

/// `PATCH /fruits/:id` - shallow merge
pub fn merge_fruit(req: &Request, state: &AppState) -> Flow {
    let id = match record_id(req) {
        Ok(id) => id,
        Err(e) => return reject(req, e),
    };
    let patch = match record_fields(req) {
        Ok(patch) => patch,
        Err(e) => return reject(req, e),
    };
    match state.store.merge(id, patch) {
        Some(fruit) => Response::json(StatusCode::OK, &fruit).into(),
        None => Flow::Respond(Response::not_found()),
    }
}

/// `DELETE /fruits/:id` - returns what is left
pub fn delete_fruit(req: &Request, state: &AppState) -> Flow {
    match delete_id(req) {
        Ok(Some(id)) => Response::json(StatusCode::OK, &state.store.remove(id)).into(),
        Ok(None) => Response::json(StatusCode::OK, &state.store.list()).into(),
        Err(e) => reject(req, e),
    }
}
