use std::num::NonZeroU32;
use std::time::Duration;

use governor::{Quota, RateLimiter};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::fragment::{self, Template, TemplateError};
use crate::loader::{LoadError, LoadOutcome, ScrollLoader};
use crate::source::{self, HttpSource};
use crate::utils;
use crate::view::{self, PageView};

pub const DEFAULT_USER_AGENT: &str = concat!("userscroll/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug)]
pub struct Options {
    /// Page the feed lives on; the results path is resolved against it.
    pub base_url: String,
    pub path: String,
    pub counter_param: String,
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
    pub header: Option<String>,
    pub user_agent: String,
    /// Stop after this many triggers, 0 = until exhausted.
    pub max_pages: usize,
    /// Triggers per second, 0 = unlimited.
    pub rate: u32,
    pub title_template: String,
    pub content_template: String,
    pub exhausted_message: String,
    pub stop_on_error: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            path: source::DEFAULT_PATH.to_string(),
            counter_param: source::DEFAULT_COUNTER_PARAM.to_string(),
            timeout_seconds: 10,
            proxy: None,
            header: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_pages: 0,
            rate: 0,
            title_template: fragment::DEFAULT_TITLE_TEMPLATE.to_string(),
            content_template: fragment::DEFAULT_CONTENT_TEMPLATE.to_string(),
            exhausted_message: view::DEFAULT_EXHAUSTED_TEXT.to_string(),
            stop_on_error: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid URL: {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid query parameter: {message}")]
    InvalidParam { message: String },

    #[error("invalid header '{header}': {message}")]
    InvalidHeader { header: String, message: String },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("page load failed: {source}")]
    Load {
        #[source]
        source: LoadError,
    },
}

/// Passed to the progress callback after every trigger.
#[derive(Debug)]
pub struct PageProgress<'a> {
    pub trigger: usize,
    pub outcome: Result<&'a LoadOutcome, &'a LoadError>,
    pub offset: u64,
    pub view: &'a PageView,
}

#[derive(Clone, Debug)]
pub struct ScrollResult {
    pub started_at: Instant,
    pub elapsed: Duration,
    pub view: PageView,
    pub offset: u64,
    pub pages: usize,
    pub exhausted: bool,
}

#[derive(Clone, Debug)]
pub struct Runner {
    options: Options,
    template: Template,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        utils::endpoint_url(&options.base_url, &options.path).map_err(|message| {
            RunnerError::InvalidUrl {
                url: options.base_url.clone(),
                message,
            }
        })?;
        utils::parse_query_param(&options.counter_param)
            .map_err(|message| RunnerError::InvalidParam { message })?;
        if let Some(header) = options.header.as_deref().filter(|h| !h.trim().is_empty()) {
            utils::parse_header(header).map_err(|message| RunnerError::InvalidHeader {
                header: header.to_string(),
                message,
            })?;
        }
        let template = Template::new(&options.title_template, &options.content_template)?;
        Ok(Self { options, template })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub async fn run(&self) -> Result<ScrollResult, RunnerError> {
        self.run_with(|_| {}).await
    }

    /// Triggers the loader until the feed is exhausted, `max_pages` triggers
    /// have fired, or a load fails.
    pub async fn run_with<F>(&self, mut on_progress: F) -> Result<ScrollResult, RunnerError>
    where
        F: FnMut(PageProgress<'_>),
    {
        let started_at = Instant::now();
        let source = self.build_source()?;
        info!(endpoint = %source.endpoint(), "loading feed");

        let mut loader = ScrollLoader::new(source, PageView::new())
            .with_template(self.template.clone())
            .with_exhausted_text(self.options.exhausted_message.clone());

        let limiter = NonZeroU32::new(self.options.rate)
            .map(|rate| RateLimiter::direct(Quota::per_second(rate)));

        let mut trigger = 0usize;
        loop {
            if self.options.max_pages != 0 && trigger >= self.options.max_pages {
                debug!(trigger, "page limit reached");
                break;
            }
            if let Some(limiter) = limiter.as_ref() {
                limiter.until_ready().await;
            }
            trigger += 1;

            let result = loader.load_more().await;
            on_progress(PageProgress {
                trigger,
                outcome: result.as_ref(),
                offset: loader.offset(),
                view: loader.view(),
            });
            match result {
                Ok(LoadOutcome::Loaded { .. }) | Ok(LoadOutcome::Busy) => continue,
                Ok(LoadOutcome::Exhausted) => break,
                Err(e) if self.options.stop_on_error => {
                    return Err(RunnerError::Load { source: e });
                }
                Err(_) => break,
            }
        }

        let offset = loader.offset();
        let pages = loader.pages();
        let exhausted = loader.is_exhausted();
        let elapsed = started_at.elapsed();
        Ok(ScrollResult {
            started_at,
            elapsed,
            view: loader.into_view(),
            offset,
            pages,
            exhausted,
        })
    }

    fn build_source(&self) -> Result<HttpSource, RunnerError> {
        let endpoint = utils::endpoint_url(&self.options.base_url, &self.options.path)
            .map_err(|message| RunnerError::InvalidUrl {
                url: self.options.base_url.clone(),
                message,
            })?;
        let client = build_client(
            self.options.proxy.as_deref(),
            self.options.timeout_seconds,
            &self.options.user_agent,
        )?;
        let mut source = HttpSource::new(client, endpoint)
            .with_counter_param(self.options.counter_param.trim());
        if let Some(header) = self.options.header.as_deref().filter(|h| !h.trim().is_empty()) {
            let (name, value) =
                utils::parse_header(header).map_err(|message| RunnerError::InvalidHeader {
                    header: header.to_string(),
                    message,
                })?;
            source = source.with_header(name, value);
        }
        Ok(source)
    }
}

fn build_client(
    proxy: Option<&str>,
    timeout_seconds: usize,
    user_agent: &str,
) -> Result<reqwest::Client, RunnerError> {
    let timeout = Duration::from_secs(timeout_seconds.try_into().unwrap_or(10));
    let mut builder = reqwest::Client::builder()
        .user_agent(user_agent.to_string())
        .timeout(timeout);

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| RunnerError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| RunnerError::HttpClientBuild { source: e })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(base_url: &str) -> Options {
        Options {
            base_url: base_url.to_string(),
            ..Options::default()
        }
    }

    #[test]
    fn rejects_missing_or_bad_base_url() {
        assert!(matches!(
            Runner::new(Options::default()),
            Err(RunnerError::InvalidUrl { .. })
        ));
        assert!(matches!(
            Runner::new(options("file:///tmp/users")),
            Err(RunnerError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn rejects_bad_header_and_template() {
        let err = Runner::new(Options {
            header: Some("missing-colon".to_string()),
            ..options("http://127.0.0.1/")
        })
        .unwrap_err();
        assert!(matches!(err, RunnerError::InvalidHeader { .. }));

        let err = Runner::new(Options {
            title_template: "User - {user}".to_string(),
            ..options("http://127.0.0.1/")
        })
        .unwrap_err();
        assert!(matches!(err, RunnerError::Template(_)));
    }

    #[test]
    fn blank_header_is_ignored() {
        let runner = Runner::new(Options {
            header: Some("  ".to_string()),
            ..options("http://127.0.0.1/")
        })
        .unwrap();
        assert!(runner.build_source().is_ok());
    }

    #[test]
    fn source_targets_resolved_endpoint() {
        let runner = Runner::new(Options {
            path: "/api/load".to_string(),
            counter_param: "offset".to_string(),
            ..options("http://127.0.0.1:8080/users/")
        })
        .unwrap();
        let source = runner.build_source().unwrap();
        assert_eq!(
            source.request_url(3).as_str(),
            "http://127.0.0.1:8080/api/load?offset=3"
        );
    }
}
