//! HTTP response building module
//!
//! Provides builders for the responses the host writes back, decoupled from
//! function logic.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::function::HttpResponse;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// Write a function's `HttpResponse` as a hyper response
///
/// Status defaults to 200; `Content-Type` defaults to plain text unless the
/// function set one.
pub fn build_function_response(res: &HttpResponse, server_name: &str) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(res.status())
        .header("Server", server_name);

    for (name, value) in &res.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if res.header("content-type").is_none() {
        builder = builder.header("Content-Type", TEXT_PLAIN);
    }

    builder
        .body(Full::new(Bytes::from(res.body.clone())))
        .unwrap_or_else(|e| {
            log_build_error("function", &e);
            Response::new(Full::new(Bytes::from(res.body.clone())))
        })
}

/// Build JSON response
pub fn build_json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_string(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return build_500_response();
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", APPLICATION_JSON)
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error("JSON", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build JSON error response `{"error": message}`
pub fn build_json_error(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    build_json_response(status, &serde_json::json!({ "error": message }))
}

/// Build health probe response
pub fn build_health_response(status: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("Content-Type", "text/plain")
        .header("Cache-Control", "no-cache")
        .body(Full::new(Bytes::from(status.to_string())))
        .unwrap_or_else(|e| {
            log_build_error("health", &e);
            Response::new(Full::new(Bytes::from(status.to_string())))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    text_response(404, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", allow)
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    text_response(413, "413 Payload Too Large")
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<Full<Bytes>> {
    text_response(500, "500 Internal Server Error")
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(allow: &str, enable_cors: bool) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(204).header("Allow", allow);

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", allow)
            .header("Access-Control-Allow-Headers", "Content-Type")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

fn text_response(status: u16, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error(&status.to_string(), &e);
            Response::new(Full::new(Bytes::from(body)))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
