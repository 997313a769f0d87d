use crate::handler::{EchoHandler, Handler};
use crate::request::Request;
use crate::response::Response;
use http::StatusCode;
use std::sync::Arc;

/// Explicit route table mapping paths to handlers
///
/// Built once at startup and passed into the server; routes are never
/// registered through a global. A route matches every HTTP method for its
/// path, and a dispatch miss yields a 404.
#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<(String, Arc<dyn Handler>)>,
}

impl Router {
    /// Creates an empty router
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Creates a router with the echo handler registered at `/`
    pub fn with_echo() -> Self {
        Self::new().route("/", EchoHandler)
    }

    /// Registers a handler for a path, matching all methods
    pub fn route(mut self, path: &str, handler: impl Handler + 'static) -> Self {
        self.routes.push((path.to_string(), Arc::new(handler)));
        self
    }

    /// Dispatches a request to the handler registered for its path
    pub async fn dispatch(&self, request: Request) -> Response {
        match self.routes.iter().find(|(path, _)| *path == request.path) {
            Some((_, handler)) => handler.handle(request).await,
            None => Response::text(
                StatusCode::NOT_FOUND,
                format!("no route for {}", request.path),
            ),
        }
    }
}
