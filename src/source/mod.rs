use std::future::Future;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Url;
use tracing::{debug, trace};

use crate::loader::LoadError;
use crate::record::{self, ResultPage};

pub const DEFAULT_PATH: &str = "/load";
pub const DEFAULT_COUNTER_PARAM: &str = "counter";

/// Where pages come from.
pub trait PageSource {
    /// Fetches the page that starts `offset` records in.
    fn fetch(&self, offset: u64) -> impl Future<Output = Result<ResultPage, LoadError>> + Send;
}

/// Pages served over HTTP as `GET <endpoint>?<param>=<offset>`.
#[derive(Clone, Debug)]
pub struct HttpSource {
    client: reqwest::Client,
    endpoint: Url,
    counter_param: String,
    header: Option<(HeaderName, HeaderValue)>,
}

impl HttpSource {
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self {
            client,
            endpoint,
            counter_param: DEFAULT_COUNTER_PARAM.to_string(),
            header: None,
        }
    }

    pub fn with_counter_param(mut self, name: impl Into<String>) -> Self {
        self.counter_param = name.into();
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.header = Some((name, value));
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The endpoint with the offset appended; existing query pairs are kept.
    pub fn request_url(&self, offset: u64) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair(&self.counter_param, &offset.to_string());
        url
    }
}

impl PageSource for HttpSource {
    async fn fetch(&self, offset: u64) -> Result<ResultPage, LoadError> {
        let url = self.request_url(offset);
        debug!(%url, offset, "requesting page");

        let mut req = self.client.get(url);
        if let Some((name, value)) = self.header.as_ref() {
            req = req.header(name.clone(), value.clone());
        }

        let resp = req.send().await.map_err(|e| LoadError::Transport {
            offset,
            source: Box::new(e),
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                offset,
                status: status.as_u16(),
            });
        }
        let body = resp.bytes().await.map_err(|e| LoadError::Transport {
            offset,
            source: Box::new(e),
        })?;
        trace!(offset, bytes = body.len(), "page body received");

        record::parse_page(&body)
    }
}
