use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use reqwest::{
    header::{self, HeaderValue},
    Client, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::logging::Logger;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("http"));

/// 錯誤訊息中保留的回應內容長度
const BODY_EXCERPT_LEN: usize = 200;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Failures of a single request. Every variant is recoverable by the caller.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to build the HTTP client: {0}")]
    Client(String),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Response status code does not indicate success: {status} ({url})")]
    Http { status: StatusCode, url: String },

    #[error("Failed to read the response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode the response from {url}: {source}. body: {excerpt}")]
    Decode {
        url: String,
        excerpt: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Builds a client that sends `Authorization: Bearer <token>` with every request.
///
/// No request timeout is set; a hung transport blocks until the OS gives up.
pub fn build_client(bearer_token: &str) -> Result<Client, FetchError> {
    install_crypto_provider();

    let mut auth = HeaderValue::from_str(&format!("Bearer {}", bearer_token.trim()))
        .map_err(|why| FetchError::Client(format!("invalid api key: {}", why)))?;
    auth.set_sensitive(true);

    let mut headers = header::HeaderMap::new();
    headers.insert(header::AUTHORIZATION, auth);
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        // ===== 壓縮 =====
        .brotli(true)
        .gzip(true)
        .zstd(true)
        // ===== TCP =====
        .tcp_nodelay(true)
        .tcp_keepalive(Duration::from_secs(60))
        // ===== 連接池 =====
        .pool_idle_timeout(Duration::from_secs(90))
        .redirect(reqwest::redirect::Policy::limited(5))
        // ===== Headers =====
        .default_headers(headers)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|why| FetchError::Client(format!("{:?}", why)))
}

/// reqwest is built without a bundled TLS provider; register ring once per process.
pub fn install_crypto_provider() {
    // 已安裝過會回傳 Err，忽略即可
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Sends a GET and fails on any non-2xx status.
pub async fn get_response(client: &Client, url: &str) -> Result<Response, FetchError> {
    let start = Instant::now();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;
    let elapsed = start.elapsed().as_millis();
    let status = response.status();

    // 只記錄失敗的請求
    if !status.is_success() {
        LOGGER.error(format!("GET:{} answered {} in {} ms", url, status, elapsed));
        return Err(FetchError::Http {
            status,
            url: url.to_string(),
        });
    }

    Ok(response)
}

/// Performs an HTTP GET request and deserializes the JSON response into the specified type.
///
/// The body is read as text first so a decode failure can report what the
/// server actually sent.
///
/// # Type Parameters
///
/// * `RES`: The type to deserialize the JSON response into.
///
/// # Arguments
///
/// * `client`: A client from [`build_client`].
/// * `url`: The URL to send the GET request to.
pub async fn get_json<RES: DeserializeOwned>(client: &Client, url: &str) -> Result<RES, FetchError> {
    let body = get_response(client, url)
        .await?
        .text()
        .await
        .map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;

    serde_json::from_str::<RES>(&body).map_err(|source| FetchError::Decode {
        url: url.to_string(),
        excerpt: excerpt(&body),
        source,
    })
}

fn excerpt(body: &str) -> String {
    let mut cut: String = body.chars().take(BODY_EXCERPT_LEN).collect();
    if cut.len() < body.len() {
        cut.push_str("...");
    }
    cut
}
