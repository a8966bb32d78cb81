//! globus-oidc-server: native HTTP adapter for the Globus OIDC backend
//!
//! Exposes the two hooks an OIDC client integration needs: the JWKS key to
//! verify an ID token with, and the local account for verified claims.
//! Uses a single-threaded tokio runtime (compatible with core's !Send async
//! traits).

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use globus_oidc_core::config::Config;
use globus_oidc_core::diagnostics::{sink_for, DiagnosticSink};
use globus_oidc_core::error::{ApiError, ErrorResponse};
use globus_oidc_core::identity::{Claims, IdentityMapper};
use globus_oidc_core::oidc;

mod platform;

use platform::{InMemoryAccountStore, InMemoryProfileStore, ProcessEnv, ReqwestHttpClient};

/// Shared application state
struct AppState {
    config: Config,
    http: ReqwestHttpClient,
    accounts: InMemoryAccountStore,
    profiles: InMemoryProfileStore,
    sink: Box<dyn DiagnosticSink>,
}

impl AppState {
    fn mapper(&self) -> IdentityMapper<'_> {
        IdentityMapper::new(
            self.config.identity_policy.clone(),
            &self.accounts,
            Some(&self.profiles),
            self.sink.as_ref(),
        )
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "globus-oidc-server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let port: u16 = match std::env::var("PORT") {
        Ok(raw) => raw.parse().map_err(|_| format!("PORT must be a number, got '{}'", raw))?,
        Err(_) => 8080,
    };

    let config = Config::from_env(&ProcessEnv)?;
    let http = ReqwestHttpClient::new(Duration::from_secs(config.jwks_timeout_secs))?;
    let sink = sink_for(config.debug_log_path.as_deref());

    info!(
        jwks_endpoint = %config.jwks_endpoint,
        policy = ?config.identity_policy,
        debug_log = ?config.debug_log_path,
        "configuration loaded"
    );

    let state = Arc::new(AppState {
        config,
        http,
        accounts: InMemoryAccountStore::default(),
        profiles: InMemoryProfileStore::default(),
        sink,
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!(port, "globus-oidc-server listening");

    loop {
        let (stream, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        let state = state.clone();

        // Each connection is handled sequentially (single-threaded runtime)
        let io = hyper_util::rt::TokioIo::new(stream);
        let service = service_fn(move |req| {
            let state = state.clone();
            async move { handle_request(req, &state).await }
        });

        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
            warn!(error = %e, "connection error");
        }
    }
}

type HyperResponse = Response<Full<Bytes>>;

async fn handle_request(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<HyperResponse, std::convert::Infallible> {
    let result = route_request(req, state).await;
    Ok(result)
}

async fn route_request(req: Request<Incoming>, state: &AppState) -> HyperResponse {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::GET, "/") => handle_health(),
        (Method::POST, "/oidc/jwk") => handle_select_key(req, state).await,
        (Method::POST, "/oidc/user") => handle_resolve_user(req, state).await,
        (Method::POST, "/oidc/candidates") => handle_find_candidates(req, state).await,
        _ => json_response(StatusCode::NOT_FOUND, &serde_json::json!({"error": "not_found"})),
    }
}

fn handle_health() -> HyperResponse {
    json_response(StatusCode::OK, &serde_json::json!({"name": "globus-oidc"}))
}

/// Token comes in as a bearer credential; the response is the JWK to verify it with
async fn handle_select_key(req: Request<Incoming>, state: &AppState) -> HyperResponse {
    let token = match extract_bearer_token(req.headers()) {
        Ok(t) => t,
        Err(e) => return error_response(&e),
    };

    match oidc::select_key(&token, &state.config.jwks_endpoint, &state.http, state.sink.as_ref()).await {
        Ok(jwk) => json_response(StatusCode::OK, &jwk),
        Err(e) => error_response(&e),
    }
}

async fn handle_resolve_user(req: Request<Incoming>, state: &AppState) -> HyperResponse {
    let claims = match read_claims(req).await {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    match state.mapper().resolve_user(&claims).await {
        Ok(account) => json_response(StatusCode::OK, &account),
        Err(e) => error_response(&e),
    }
}

async fn handle_find_candidates(req: Request<Incoming>, state: &AppState) -> HyperResponse {
    let claims = match read_claims(req).await {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    match state.mapper().find_candidates(&claims).await {
        Ok(accounts) => json_response(StatusCode::OK, &accounts),
        Err(e) => error_response(&e),
    }
}

async fn read_claims(req: Request<Incoming>) -> Result<Claims, ApiError> {
    let body = req
        .collect()
        .await
        .map_err(|_| ApiError::invalid_request("failed to read body"))?
        .to_bytes();

    parse_claims(&body)
}

fn parse_claims(body: &[u8]) -> Result<Claims, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::invalid_request(format!("invalid claims JSON: {}", e)))
}

fn extract_bearer_token(headers: &hyper::HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get("Authorization")
        .ok_or_else(|| ApiError::invalid_request("missing Authorization header"))?
        .to_str()
        .map_err(|_| ApiError::invalid_request("invalid Authorization header encoding"))?;

    header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| ApiError::invalid_request("Authorization header must use Bearer scheme"))
}

fn error_response(err: &ApiError) -> HyperResponse {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorResponse::from(err);
    json_response(status, &body)
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> HyperResponse {
    let json = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}
