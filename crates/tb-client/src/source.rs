//! Where pages come from.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use tb_core::models::IndexProps;

use crate::error::ClientError;
use crate::state::FetchRequest;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketSource: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<IndexProps, ClientError>;
}

/// Re-requests the list page as JSON, with every filter reattached.
pub struct HttpTicketSource {
    client: Client,
    base_url: Url,
}

impl HttpTicketSource {
    /// `base_url` points at the board's list page; a path prefix such as
    /// `http://host/tickets` is kept.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url).map_err(|e| ClientError::Url(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Url(format!("{base_url}: not a base URL")));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        base_url.set_query(None);
        base_url.set_fragment(None);
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    pub fn request_url(&self, request: &FetchRequest) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().extend_pairs(request.query_pairs());
        url
    }
}

#[async_trait]
impl TicketSource for HttpTicketSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<IndexProps, ClientError> {
        let url = self.request_url(request);
        log::debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }
        Ok(response.json::<IndexProps>().await?)
    }
}
