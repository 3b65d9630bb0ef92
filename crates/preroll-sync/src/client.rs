use std::path::Path;
use std::time::Duration;

use preroll_core::config::MediaServerConfig;
use reqwest::multipart::{Form, Part};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::xml::{self, LibrarySection};

/// Longest server body kept in an error message.
const MAX_BODY_CHARS: usize = 512;

/// Status and body of a successful control-API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Thin reqwest wrapper for the media server's control API.
///
/// Every request carries the `X-Plex-*` identification headers and the
/// configured per-request timeout. Non-success statuses come back as
/// [`SyncError::Api`] with the (truncated) response body.
pub struct MediaServerClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    client_identifier: String,
    product: String,
}

impl MediaServerClient {
    pub fn new(config: &MediaServerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.trim().to_string(),
            client_identifier: config.client_identifier.clone(),
            product: config.product.clone(),
        })
    }

    /// Remote sync is only attempted with a token.
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path_and_query: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path_and_query);
        self.http
            .request(method, url)
            .header("X-Plex-Token", &self.token)
            .header("X-Plex-Client-Identifier", &self.client_identifier)
            .header("X-Plex-Product", &self.product)
            .header("X-Plex-Version", env!("CARGO_PKG_VERSION"))
            .header("Accept", "application/xml")
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<HttpReply> {
        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let ok = resp.status().is_success();
        let body = resp.text().await.unwrap_or_default();

        if !ok {
            let message = truncate(body.trim());
            debug!(status, body = %message, "media server rejected request");
            return Err(SyncError::Api { status, message });
        }
        Ok(HttpReply { status, body })
    }

    pub async fn get(&self, path: &str) -> Result<HttpReply> {
        self.send(self.request(reqwest::Method::GET, path)).await
    }

    /// `PUT /:/prefs?{key}={value}`, the server-wide preference endpoint.
    pub async fn put_preference(&self, key: &str, value: &str) -> Result<HttpReply> {
        let path = format!("/:/prefs?{}={}", key, urlencoding::encode(value));
        self.send(self.request(reqwest::Method::PUT, &path)).await
    }

    /// `PUT /library/sections/{section}/prefs?{key}={value}`.
    pub async fn put_section_preference(
        &self,
        section_key: &str,
        key: &str,
        value: &str,
    ) -> Result<HttpReply> {
        let path = format!(
            "/library/sections/{}/prefs?{}={}",
            urlencoding::encode(section_key),
            key,
            urlencoding::encode(value)
        );
        self.send(self.request(reqwest::Method::PUT, &path)).await
    }

    /// Multipart `POST` of one file to `path_and_query`, streamed from disk.
    pub async fn upload(&self, path_and_query: &str, file: &Path) -> Result<HttpReply> {
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "preroll".to_string());
        let handle = tokio::fs::File::open(file).await?;
        let len = handle.metadata().await?.len();

        let body = reqwest::Body::wrap_stream(ReaderStream::new(handle));
        let part = Part::stream_with_length(body, len).file_name(file_name);
        let form = Form::new().part("file", part);

        self.send(
            self.request(reqwest::Method::POST, path_and_query)
                .multipart(form),
        )
        .await
    }

    /// Friendly name of the server, scraped from `GET /identity`.
    pub async fn identity(&self) -> Result<String> {
        let reply = self.get("/identity").await?;
        xml::server_name(&reply.body).ok_or_else(|| {
            warn!("identity response carried no recognisable name");
            SyncError::Api {
                status: reply.status,
                message: "identity response carried no server name".to_string(),
            }
        })
    }

    /// Every library section the server reports.
    pub async fn library_sections(&self) -> Result<Vec<LibrarySection>> {
        let reply = self.get("/library/sections").await?;
        Ok(xml::parse_sections(&reply.body))
    }
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
