//! HTTP API for question answering.
//!
//! Routes:
//! - `GET /` welcome message
//! - `GET /health` liveness probe
//! - `POST /query` with `{"question": ...}` returns `{"answer": ...}`
//! - `GET /metrics` Prometheus text exposition

use std::convert::Infallible;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::generation::AnswerGenerator;
use crate::observability::Observability;

pub const QUERY_OPERATION: &str = "api.query";

/// Largest request body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared handles for every connection.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<AnswerGenerator>,
    pub obs: Arc<Observability>,
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    #[serde(default)]
    question: Option<String>,
}

fn response(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(body.into()));
    *resp.status_mut() = status;
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    resp
}

fn json_response(status: StatusCode, value: Value) -> Response<Full<Bytes>> {
    response(status, "application/json", value.to_string())
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response<Full<Bytes>> {
    json_response(status, json!({ "error": message.into() }))
}

fn preflight_response() -> Response<Full<Bytes>> {
    let mut resp = response(StatusCode::NO_CONTENT, "text/plain", Bytes::new());
    let headers = resp.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    resp
}

fn metrics_response(obs: &Observability) -> Response<Full<Bytes>> {
    match obs.render_prometheus() {
        Ok((content_type, text)) => {
            let mut resp = response(StatusCode::OK, "text/plain", text);
            if let Ok(value) = HeaderValue::from_str(&content_type) {
                resp.headers_mut().insert(header::CONTENT_TYPE, value);
            }
            resp
        }
        Err(err) => {
            error!("Failed to encode metrics: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "encode error")
        }
    }
}

async fn query_response(state: &AppState, body: &[u8]) -> Response<Full<Bytes>> {
    let mut timer = state.obs.timer(QUERY_OPERATION);

    let question = serde_json::from_slice::<QueryRequest>(body)
        .ok()
        .and_then(|req| req.question)
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty());

    let Some(question) = question else {
        timer.mark_failed();
        return error_response(StatusCode::BAD_REQUEST, "Question is required");
    };

    match state.generator.answer(&question).await {
        Ok(answer) => json_response(StatusCode::OK, json!({ "answer": answer })),
        Err(e) => {
            timer.mark_failed();
            error!("Query failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error generating answer: {}", e),
            )
        }
    }
}

/// Dispatch one request. Separated from the connection plumbing for tests.
pub async fn route(state: &AppState, method: &Method, path: &str, body: &[u8]) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::OPTIONS, _) => preflight_response(),
        (&Method::GET, "/") => json_response(
            StatusCode::OK,
            json!({ "message": "Welcome to Enterprise GenAI Platform API" }),
        ),
        (&Method::GET, "/health") => json_response(StatusCode::OK, json!({ "status": "healthy" })),
        (&Method::POST, "/query") => query_response(state, body).await,
        (&Method::GET, "/metrics") => metrics_response(&state.obs),
        _ => error_response(StatusCode::NOT_FOUND, "Not found"),
    }
}

async fn handle_request<B>(
    state: AppState,
    req: Request<B>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    let body = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            warn!("Request body exceeds {} bytes", MAX_BODY_BYTES);
            return Ok(error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large"));
        }
        Err(err) => {
            warn!("Failed to read request body: {}", err);
            return Ok(error_response(StatusCode::BAD_REQUEST, "Invalid request body"));
        }
    };

    Ok(route(&state, &parts.method, parts.uri.path(), &body).await)
}

/// Serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "API server started");

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down API server");
                return Ok(());
            }
        };

        let state = state.clone();
        let service = service_fn(move |req| handle_request(state.clone(), req));
        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                warn!(?peer, "API connection error: {}", err);
            }
        });
    }
}
