//! JSON body parsing middleware
//!
//! Parses `application/json` bodies into [`Request::json`] before routing.
//! Oversized bodies get 413, malformed JSON gets 400, both with empty bodies.

use super::Middleware;
use crate::config::DEFAULT_MAX_BODY_SIZE;
use crate::{Request, Response, StatusCode};
use tracing::debug;

/// JSON body parser
#[derive(Debug, Clone)]
pub struct JsonBody {
    max_size: usize,
}

impl JsonBody {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for JsonBody {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BODY_SIZE)
    }
}

impl Middleware for JsonBody {
    fn before(&self, req: &mut Request) -> Option<Response> {
        if req.body.len() > self.max_size {
            debug!(size = req.body.len(), limit = self.max_size, "request body too large");
            return Some(Response::new(StatusCode::PAYLOAD_TOO_LARGE));
        }

        if req.body.is_empty() || !req.is_json() {
            return None;
        }

        match serde_json::from_slice(&req.body) {
            Ok(value) => {
                req.json = Some(value);
                None
            }
            Err(e) => {
                debug!(error = %e, path = %req.path, "malformed JSON body");
                Some(Response::bad_request())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Method, RequestBuilder};
    use serde_json::json;

    #[test]
    fn test_parses_json() {
        let mut req = RequestBuilder::new(Method::Post, "/fruits")
            .json(&json!({"name": "kiwi", "count": 5}))
            .build();

        assert!(JsonBody::default().before(&mut req).is_none());
        assert_eq!(req.json, Some(json!({"name": "kiwi", "count": 5})));
        assert_eq!(req.json_object().unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_json() {
        let mut req = RequestBuilder::new(Method::Post, "/fruits")
            .header("content-type", "application/json")
            .body("{\"name\":")
            .build();

        let res = JsonBody::default().before(&mut req).unwrap();
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert!(res.body.is_empty());
    }

    #[test]
    fn test_other_content_types_ignored() {
        let mut req = RequestBuilder::new(Method::Post, "/fruits")
            .header("content-type", "text/plain")
            .body("{not json")
            .build();

        assert!(JsonBody::default().before(&mut req).is_none());
        assert!(req.json.is_none());
    }

    #[test]
    fn test_body_limit() {
        let mut req = RequestBuilder::new(Method::Post, "/fruits")
            .json(&json!({"name": "x".repeat(64)}))
            .build();

        let res = JsonBody::new(16).before(&mut req).unwrap();
        assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(JsonBody::new(16).max_size(), 16);
    }
}
