//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body limits, route matching, and
//! dispatch to the invocation endpoint or the forwarded function route.

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, StatusCode, Version};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::invocation;
use crate::config::{AppState, Config};
use crate::function::{parse_query, HttpRequest, HttpResponse, InvocationError};
use crate::http;
use crate::logger::{self, AccessLogEntry};

/// Resolved destination of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Options,
    Health,
    /// Invocation payload from the Functions host
    Invoke,
    /// Raw HTTP request forwarded to the function
    Forward,
    MethodNotAllowed,
    NotFound,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let mut entry = state
        .config
        .logging
        .access_log
        .then(|| access_entry(&req, peer_addr));

    let (response, invocation_id) = dispatch(req, &state).await;

    if let Some(ref mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.invocation_id = invocation_id;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route and serve, returning the invocation id when the function ran
async fn dispatch(
    req: Request<hyper::body::Incoming>,
    state: &AppState,
) -> (Response<Full<Bytes>>, Option<String>) {
    let config = &state.config;
    let route = resolve_route(req.method(), req.uri().path(), config);

    match route {
        Route::Options => {
            let allow = allow_header(req.uri().path(), config);
            (
                http::build_options_response(&allow, config.http.enable_cors),
                None,
            )
        }
        Route::Health => (http::build_health_response("ok"), None),
        Route::MethodNotAllowed => {
            logger::log_warning(&format!(
                "Method not allowed: {} {}",
                req.method(),
                req.uri().path()
            ));
            let allow = allow_header(req.uri().path(), config);
            (http::build_405_response(&allow), None)
        }
        Route::NotFound => (http::build_404_response(), None),
        Route::Invoke | Route::Forward => {
            if let Some(resp) = check_body_size(&req, config.http.max_body_size) {
                return (resp, None);
            }
            let (parts, body) = match read_body(req, config.http.max_body_size).await {
                Ok(read) => read,
                Err(e) => {
                    logger::log_error(&e.to_string());
                    let response = match e {
                        InvocationError::BodyTooLarge(_) => http::build_413_response(),
                        _ => http::build_json_error(StatusCode::BAD_REQUEST, &e.to_string()),
                    };
                    return (response, None);
                }
            };
            if route == Route::Invoke {
                serve_invocation(&body, state).await
            } else {
                serve_forwarded(&parts, body, state).await
            }
        }
    }
}

/// Match method and path against the configured endpoints
pub fn resolve_route(method: &Method, path: &str, config: &Config) -> Route {
    let function = &config.function;

    if *method == Method::OPTIONS {
        return Route::Options;
    }

    if config.health.enabled
        && path == config.health.path
        && (*method == Method::GET || *method == Method::HEAD)
    {
        return Route::Health;
    }

    if path == function.invoke_path() && *method == Method::POST {
        return Route::Invoke;
    }

    if path == function.forward_path() {
        if function.allows_method(method.as_str()) {
            return Route::Forward;
        }
        return Route::MethodNotAllowed;
    }

    if path == function.invoke_path() {
        return Route::MethodNotAllowed;
    }

    Route::NotFound
}

/// `Allow` header value for `path`
fn allow_header(path: &str, config: &Config) -> String {
    let function = &config.function;
    let mut methods: Vec<String> = Vec::new();
    let mut add = |method: String| {
        if !methods.contains(&method) {
            methods.push(method);
        }
    };

    if path == function.invoke_path() {
        add("POST".to_string());
    }
    if path == function.forward_path() {
        function.methods.iter().for_each(|m| add(m.to_ascii_uppercase()));
    }
    if config.health.enabled && path == config.health.path {
        add("GET".to_string());
        add("HEAD".to_string());
    }
    add("OPTIONS".to_string());
    methods.join(", ")
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(
    req: &Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Collect the body, enforcing `max_body_size` for bodies without Content-Length
async fn read_body(
    req: Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Result<(Parts, Bytes), InvocationError> {
    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let collected = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|e| body_error(&*e, max_body_size))?;
    Ok((parts, collected.to_bytes()))
}

/// Only a tripped length limit is a 413; other read failures are the client's
fn body_error(
    err: &(dyn std::error::Error + Send + Sync + 'static),
    max_body_size: u64,
) -> InvocationError {
    if err.is::<LengthLimitError>() {
        InvocationError::BodyTooLarge(max_body_size)
    } else {
        InvocationError::Body(err.to_string())
    }
}

async fn serve_invocation(
    body: &[u8],
    state: &AppState,
) -> (Response<Full<Bytes>>, Option<String>) {
    match invocation::handle_payload(body, &state.function, &state.config.function).await {
        Ok(result) => {
            let status = if result.error.is_some() {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            };
            (http::build_json_response(status, &result), None)
        }
        Err(e) => {
            logger::log_warning(&format!("Rejected invocation: {e}"));
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
            (http::build_json_error(status, &e.to_string()), None)
        }
    }
}

async fn serve_forwarded(
    parts: &Parts,
    body: Bytes,
    state: &AppState,
) -> (Response<Full<Bytes>>, Option<String>) {
    let req = to_function_request(parts, &body);
    let function = &state.config.function;

    let (ctx, result) = invocation::invoke(&state.function, &function.name, &req, None).await;
    let invocation_id = Some(ctx.invocation_id().to_string());

    let server_name = &state.config.http.server_name;
    let response = match (result, ctx.response()) {
        (Ok(()), Some(res)) => http::build_function_response(res, server_name),
        (Ok(()), None) => http::build_function_response(&HttpResponse::default(), server_name),
        (Err(_), _) => http::build_500_response(),
    };
    (response, invocation_id)
}

/// Convert a forwarded hyper request into the function's request shape
pub fn to_function_request(parts: &Parts, body: &Bytes) -> HttpRequest {
    let mut headers: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in &parts.headers {
        headers
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }

    let url = parts
        .headers
        .get("host")
        .and_then(|h| h.to_str().ok())
        .map_or_else(
            || parts.uri.to_string(),
            |host| format!("http://{host}{}", parts.uri),
        );

    HttpRequest {
        url,
        method: parts.method.to_string(),
        query: parts.uri.query().map(parse_query).unwrap_or_default(),
        headers,
        params: HashMap::new(),
        body: (!body.is_empty()).then(|| String::from_utf8_lossy(body).into_owned()),
    }
}

fn access_entry(req: &Request<hyper::body::Incoming>, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = http_version(req.version()).to_string();
    entry.user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry
}

fn http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::DIAGNOSTIC_MESSAGE;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper_util::rt::TokioIo;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn config() -> Config {
        Config::load_from("does-not-exist-handler-config").unwrap()
    }

    fn state(cfg: &Config) -> Arc<AppState> {
        Arc::new(AppState::new(cfg, [("MySecret", "s1")].into_iter().collect()))
    }

    /// Serve one connection and return the raw HTTP/1.1 response to `raw`
    async fn exchange(state: Arc<AppState>, raw: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = async move {
            let (stream, peer_addr) = listener.accept().await.unwrap();
            let service = service_fn(move |req| handle_request(req, Arc::clone(&state), peer_addr));
            let _ = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await;
        };
        let client = async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(raw.as_bytes()).await.unwrap();
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).await.unwrap();
            String::from_utf8(buf).unwrap()
        };

        let ((), response) = tokio::join!(server, client);
        response
    }

    fn post(path: &str, body: &str) -> String {
        format!(
            "POST {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn test_forwarded_request_end_to_end() {
        let raw = "GET /api/HttpExample?name=rust HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";
        let response = exchange(state(&config()), raw).await;

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
        assert!(response.contains("content-type: text/plain"), "{response}");
        assert!(response.ends_with("\r\n\r\nMySecret = s1\nMyNonSecret = undefined"), "{response}");
    }

    #[tokio::test]
    async fn test_invocation_end_to_end() {
        let payload = r#"{"Data":{"req":{"Url":"http://localhost/api/HttpExample","Method":"GET"}},"Metadata":{"sys":{"RandGuid":"guid-1"}}}"#;
        let response = exchange(state(&config()), &post("/HttpExample", payload)).await;

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
        let body = response.split("\r\n\r\n").nth(1).unwrap();
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["Outputs"]["res"]["body"], "MySecret = s1\nMyNonSecret = undefined");
        assert_eq!(json["Logs"], serde_json::json!([DIAGNOSTIC_MESSAGE]));
        assert!(json.get("Error").is_none());
    }

    #[tokio::test]
    async fn test_invocation_missing_binding_is_400() {
        let response = exchange(state(&config()), &post("/HttpExample", r#"{"Data":{}}"#)).await;

        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{response}");
        assert!(response.contains("application/json"), "{response}");
        assert!(response.ends_with(r#"{"error":"missing input binding 'req'"}"#), "{response}");
    }

    #[tokio::test]
    async fn test_invocation_invalid_json_is_400() {
        let response = exchange(state(&config()), &post("/HttpExample", "not json")).await;

        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{response}");
        assert!(response.contains("invalid invocation payload"), "{response}");
    }

    #[tokio::test]
    async fn test_chunked_body_over_limit_is_413() {
        let mut cfg = config();
        cfg.http.max_body_size = 8;
        let raw = "POST /api/HttpExample HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\n\
                   Connection: close\r\n\r\n10\r\n0123456789abcdef\r\n0\r\n\r\n";
        let response = exchange(state(&cfg), raw).await;

        assert!(response.starts_with("HTTP/1.1 413 Payload Too Large\r\n"), "{response}");
    }

    #[tokio::test]
    async fn test_declared_length_over_limit_is_413() {
        let mut cfg = config();
        cfg.http.max_body_size = 8;
        let response = exchange(state(&cfg), &post("/HttpExample", r#"{"Data":{"req":{}}}"#)).await;

        assert!(response.starts_with("HTTP/1.1 413 Payload Too Large\r\n"), "{response}");
    }

    #[tokio::test]
    async fn test_body_error_classification() {
        let Err(limit_err) = Limited::new(Full::new(Bytes::from_static(b"0123456789")), 4)
            .collect()
            .await
        else {
            panic!("body over the limit was collected");
        };
        assert!(matches!(
            body_error(&*limit_err, 4),
            InvocationError::BodyTooLarge(4)
        ));

        let reset = std::io::Error::other("connection reset");
        let err = body_error(&reset, 4);
        assert!(matches!(err, InvocationError::Body(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_resolve_invoke_and_forward() {
        let cfg = config();
        assert_eq!(resolve_route(&Method::POST, "/HttpExample", &cfg), Route::Invoke);
        assert_eq!(resolve_route(&Method::GET, "/api/HttpExample", &cfg), Route::Forward);
        assert_eq!(resolve_route(&Method::POST, "/api/HttpExample", &cfg), Route::Forward);
    }

    #[test]
    fn test_resolve_method_not_allowed() {
        let cfg = config();
        assert_eq!(
            resolve_route(&Method::DELETE, "/api/HttpExample", &cfg),
            Route::MethodNotAllowed
        );
        assert_eq!(
            resolve_route(&Method::GET, "/HttpExample", &cfg),
            Route::MethodNotAllowed
        );
    }

    #[test]
    fn test_resolve_health_options_not_found() {
        let mut cfg = config();
        assert_eq!(resolve_route(&Method::GET, "/healthz", &cfg), Route::Health);
        assert_eq!(resolve_route(&Method::HEAD, "/healthz", &cfg), Route::Health);
        assert_eq!(resolve_route(&Method::OPTIONS, "/anything", &cfg), Route::Options);
        assert_eq!(resolve_route(&Method::GET, "/api/Other", &cfg), Route::NotFound);
        assert_eq!(resolve_route(&Method::GET, "/api/httpexample", &cfg), Route::NotFound);

        cfg.health.enabled = false;
        assert_eq!(resolve_route(&Method::GET, "/healthz", &cfg), Route::NotFound);
    }

    #[test]
    fn test_allow_header() {
        let cfg = config();
        assert_eq!(allow_header("/HttpExample", &cfg), "POST, OPTIONS");
        assert_eq!(allow_header("/api/HttpExample", &cfg), "GET, POST, OPTIONS");
        assert_eq!(allow_header("/healthz", &cfg), "GET, HEAD, OPTIONS");
    }

    #[test]
    fn test_allow_header_without_route_prefix() {
        let mut cfg = config();
        cfg.function.route_prefix = String::new();
        assert_eq!(allow_header("/HttpExample", &cfg), "POST, GET, OPTIONS");
    }

    #[test]
    fn test_to_function_request() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/HttpExample?name=rust&x=1")
            .header("Host", "localhost:7071")
            .header("Accept", "text/plain")
            .header("Accept", "application/json")
            .body(())
            .unwrap();
        let (parts, ()) = req.into_parts();

        let fr = to_function_request(&parts, &Bytes::from_static(b"hello"));
        assert_eq!(fr.method, "POST");
        assert_eq!(fr.url, "http://localhost:7071/api/HttpExample?name=rust&x=1");
        assert_eq!(fr.query.get("name").map(String::as_str), Some("rust"));
        assert_eq!(
            fr.headers.get("accept"),
            Some(&vec!["text/plain".to_string(), "application/json".to_string()])
        );
        assert_eq!(fr.body.as_deref(), Some("hello"));
    }

    #[test]
    fn test_to_function_request_empty_body() {
        let (parts, ()) = Request::builder()
            .uri("/api/HttpExample")
            .body(())
            .unwrap()
            .into_parts();
        let fr = to_function_request(&parts, &Bytes::new());
        assert_eq!(fr.url, "/api/HttpExample");
        assert!(fr.query.is_empty());
        assert_eq!(fr.body, None);
    }

    #[test]
    fn test_http_version() {
        assert_eq!(http_version(Version::HTTP_11), "1.1");
        assert_eq!(http_version(Version::HTTP_10), "1.0");
        assert_eq!(http_version(Version::HTTP_2), "2");
    }
}
