// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};

const USER_AGENT: &str = concat!("pod-store/", env!("CARGO_PKG_VERSION"));

/// Used when no timeout is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A streaming response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Status line and streaming body of an audio download
pub struct HttpResponse {
    pub status: u16,
    /// Content-Length header value, if present
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

impl HttpResponse {
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// Network access used by feed fetching and episode downloads
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch a whole (small) document such as a feed, failing on HTTP error statuses
    async fn get_bytes(&self, url: &str) -> Result<Bytes, reqwest::Error>;

    /// Start a download whose body is consumed as a stream
    async fn get_stream(&self, url: &str) -> Result<HttpResponse, reqwest::Error>;
}

/// [`HttpClient`] backed by a shared reqwest connection pool
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestClient {
    /// Client that gives up on stalled connections after `timeout`
    ///
    /// Connecting and every single read are bounded by `timeout`. Whole feed
    /// documents must also arrive within it, while a download may take as long
    /// as its data keeps coming.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_bytes(&self, url: &str) -> Result<Bytes, reqwest::Error> {
        self.client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await
    }

    async fn get_stream(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        let response = self.client.get(url).send().await?;

        Ok(HttpResponse {
            status: response.status().as_u16(),
            content_length: response.content_length(),
            body: response.bytes_stream().boxed(),
        })
    }
}
