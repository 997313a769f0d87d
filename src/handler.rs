use crate::request::Request;
use crate::response::Response;
use async_trait::async_trait;

/// A request handler
///
/// Handlers receive the parsed request as an explicit argument and return a
/// complete response; there is no ambient request context. Handlers are
/// registered in a [`Router`](crate::router::Router) at startup.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: Request) -> Response;
}

/// Handler that reflects the request back to the client
///
/// Produces an HTTP 200 `text/html` response describing the request's method,
/// header set (receipt order) and body. Stateless: the response depends only
/// on the request in hand.
pub struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    async fn handle(&self, request: Request) -> Response {
        Response::html(render_echo(&request))
    }
}

/// Renders the METHOD / HEADERS / BODY report, line breaks as `<br>` tags.
///
/// Body bytes that are not valid UTF-8 are replaced with U+FFFD rather than
/// failing the request, so the handler always echoes something.
fn render_echo(request: &Request) -> String {
    let mut out = String::with_capacity(64 + request.body.len());

    out.push_str("METHOD: <br>");
    out.push_str(request.method.as_str());
    out.push_str("<br><br>");

    out.push_str("HEADERS: <br>");
    for (name, value) in &request.headers {
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push_str("<br>");
    }
    out.push_str("<br>");

    out.push_str("BODY: <br>");
    out.push_str(&String::from_utf8_lossy(&request.body));
    out.push_str("<br><br>");

    out
}
