use std::collections::HashMap;

use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use wicket_http::protocol::HeaderSource;
use wicket_web::{RawRequest, RequestContext, Response, ResponseScope};

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    // A POST as a gateway would hand it over: env-style header fields,
    // a raw query string and the host-parsed form map.
    let environ = [
        ("HTTP_ACCEPT", "application/json,text/html"),
        ("HTTP_ACCEPT_ENCODING", "identity"),
        ("HTTP_X_REQUESTED_WITH", "XMLHttpRequest"),
        ("CONTENT_TYPE", "application/x-www-form-urlencoded"),
    ];
    let form = HashMap::from([
        ("name".to_string(), "body-bob".to_string()),
        ("greeting".to_string(), "hello".to_string()),
    ]);
    let raw = RawRequest::new("POST", "/greet?name=query-alice")
        .query_string("name=query-alice")
        .header_source(HeaderSource::Environ(environ.iter().copied()))
        .form(form);

    let request = RequestContext::from_raw(raw);
    info!(method = %request.method(), path = request.path(), "handling request");

    let response = Response::from_request(&request);
    let mut scope = ResponseScope::new(response, std::io::stdout());

    let greeting = request.param("greeting").unwrap_or("hi");
    let name = request.param("name").unwrap_or("world");
    scope.set_body(format!(r#"{{"message":"{greeting} {name}"}}"#));

    // dropping the scope sends the response to stdout
}
