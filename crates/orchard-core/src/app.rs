//! Application composition
//!
//! [`App`] ties middleware, router, handler chains and the terminal handlers
//! together. [`App::handle`] is the whole request pipeline and needs no
//! network; the native server only converts to and from hyper types.

use orchard_router::{Match, Router};
use tracing::debug;

use crate::handlers;
use crate::middleware::{JsonBody, Logger, Middleware, MiddlewareChain, Timestamp};
use crate::{routes, Chain, Flow, FruitStore, Method, Request, Response, Result, ServerConfig};

/// State shared with every handler
#[derive(Debug)]
pub struct AppState {
    pub store: FruitStore,
}

impl AppState {
    pub fn new(store: FruitStore) -> Self {
        Self { store }
    }

    /// State backed by the embedded seed data
    pub fn seeded() -> Result<Self> {
        Ok(Self::new(FruitStore::seeded()?))
    }
}

/// Request pipeline
pub struct App {
    middleware: MiddlewareChain,
    router: Router<usize>,
    chains: Vec<Chain>,
    fallback: Chain,
    state: AppState,
}

impl App {
    /// Empty app: no middleware, no routes, 404 for everything
    pub fn new(state: AppState) -> Self {
        Self {
            middleware: MiddlewareChain::new(),
            router: Router::new(),
            chains: Vec::new(),
            fallback: Chain::of(handlers::not_found),
            state,
        }
    }

    /// The fruit stand: JSON body parsing, timestamp and logger middleware,
    /// plus every route
    pub fn build(state: AppState, config: &ServerConfig) -> Result<Self> {
        let mut app = Self::new(state);
        app.wrap(JsonBody::new(config.max_body_size));
        app.wrap(Timestamp);
        app.wrap(Logger);
        routes::register(&mut app)?;
        Ok(app)
    }

    /// Fruit stand with default configuration and seed data
    pub fn seeded() -> Result<Self> {
        Self::build(AppState::seeded()?, &ServerConfig::default())
    }

    /// Add middleware; runs after the ones already added
    pub fn wrap<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middleware.add(middleware);
    }

    /// Register a handler chain for `method` and `path`
    pub fn route(&mut self, method: Method, path: &str, chain: Chain) -> Result<()> {
        self.router.insert(method.as_str(), path, self.chains.len())?;
        self.chains.push(chain);
        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run a request through the pipeline
    pub fn handle(&self, mut req: Request) -> Response {
        if let Err((ran, mut res)) = self.middleware.run_before(&mut req) {
            self.middleware.run_after(ran, &req, &mut res);
            return res;
        }

        let flow = match self.lookup(&req) {
            Some(matched) => {
                let chain = self.chains.get(*matched.value);
                req.params = matched.params;
                chain.map_or(Flow::Next, |chain| chain.run(&req, &self.state))
            }
            None => {
                debug!(
                    method = %req.method,
                    path = %req.path,
                    allowed = ?self.router.allowed_methods(&req.path),
                    "no route matched"
                );
                Flow::Next
            }
        };

        let mut res = self.finish(&req, flow);
        if req.method == Method::Head {
            res.body = bytes::Bytes::new();
        }
        self.middleware.run_after(self.middleware.len(), &req, &mut res);
        res
    }

    /// Route lookup; HEAD without its own route is served by the GET route
    fn lookup(&self, req: &Request) -> Option<Match<'_, usize>> {
        self.router.find(req.method.as_str(), &req.path).or_else(|| match req.method {
            Method::Head => self.router.find(Method::Get.as_str(), &req.path),
            _ => None,
        })
    }

    fn finish(&self, req: &Request, flow: Flow) -> Response {
        match flow {
            Flow::Respond(res) => res,
            Flow::Fail(err) => handlers::server_error(req, &err),
            Flow::Next => match self.fallback.run(req, &self.state) {
                Flow::Respond(res) => res,
                Flow::Fail(err) => handlers::server_error(req, &err),
                Flow::Next => Response::not_found(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, RequestBuilder, StatusCode};
    use serde_json::json;

    fn empty_app() -> App {
        App::new(AppState::new(FruitStore::new(Vec::new())))
    }

    #[test]
    fn test_empty_app_is_all_404() {
        let app = empty_app();
        let res = app.handle(Request::new(Method::Get, "/"));
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert!(res.body.is_empty());
    }

    #[test]
    fn test_params_reach_handlers() {
        let mut app = empty_app();
        app.route(
            Method::Get,
            "/echo/:word",
            Chain::of(|req: &Request, _: &AppState| {
                Flow::Respond(Response::html(req.param("word").unwrap_or("").to_string()))
            }),
        )
        .unwrap();

        let res = app.handle(Request::new(Method::Get, "/echo/plum"));
        assert_eq!(res.body_string().unwrap(), "plum");
    }

    #[test]
    fn test_duplicate_route() {
        let mut app = empty_app();
        app.route(Method::Get, "/x", Chain::of(handlers::not_found)).unwrap();
        let err = app.route(Method::Get, "/x", Chain::new()).unwrap_err();
        assert!(matches!(err, Error::Route(_)));
    }

    #[test]
    fn test_chain_fallthrough_hits_not_found() {
        let mut app = empty_app();
        app.route(Method::Get, "/maybe", Chain::of(|_: &Request, _: &AppState| Flow::Next))
            .unwrap();
        assert_eq!(app.handle(Request::new(Method::Get, "/maybe")).status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_failure_becomes_500() {
        let mut app = empty_app();
        app.route(
            Method::Get,
            "/fail",
            Chain::of(|_: &Request, _: &AppState| Flow::Fail(Error::Internal("boom".into()))),
        )
        .unwrap();
        assert_eq!(
            app.handle(Request::new(Method::Get, "/fail")).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_head_uses_get_route_without_body() {
        let mut app = empty_app();
        app.route(Method::Get, "/ping", Chain::of(|_: &Request, _: &AppState| {
            Flow::Respond(Response::html("pong"))
        }))
        .unwrap();

        let res = app.handle(Request::new(Method::Head, "/ping"));
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.content_type(), Some("text/html; charset=utf-8"));
        assert!(res.body.is_empty());

        assert_eq!(app.handle(Request::new(Method::Head, "/pong")).status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_middleware_short_circuit_skips_routing() {
        let mut app = App::build(AppState::new(FruitStore::new(Vec::new())), &ServerConfig::default().max_body_size(8))
            .unwrap();
        app.route(Method::Post, "/big", Chain::of(|_: &Request, _: &AppState| Flow::Respond(Response::ok())))
            .unwrap();

        let req = RequestBuilder::new(Method::Post, "/big")
            .json(&json!({"name": "watermelon"}))
            .build();
        assert_eq!(app.handle(req).status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
