use crate::{AppState, Error, Flow, Request};

/// Always forwards an error to the error handler
pub fn throw_err(_req: &Request, _state: &AppState) -> Flow {
    Flow::Fail(Error::Internal("this is my error".to_string()))
}
