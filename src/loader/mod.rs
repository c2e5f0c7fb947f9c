//! The scroll loader.
//!
//! Each call to [`ScrollLoader::load_more`] fetches one page at the current
//! offset and renders it into the view. An empty page is the end of the feed:
//! the sentinel is rewritten once and later calls return
//! [`LoadOutcome::Exhausted`] without touching the network.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::fragment::{self, Template};
use crate::source::PageSource;
use crate::view::{View, DEFAULT_EXHAUSTED_TEXT};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request for offset {offset} failed: {source}")]
    Transport {
        offset: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("server answered {status} for offset {offset}")]
    Status { offset: u64, status: u16 },

    #[error("response body is not a list of [identifier, content] pairs: {source}")]
    MalformedBody {
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A non-empty page was rendered; `offset` is the counter afterwards.
    Loaded { rendered: usize, offset: u64 },
    /// The feed is over. Nothing was rendered.
    Exhausted,
    /// Another load was still in flight, so this trigger was dropped.
    Busy,
}

pub struct ScrollLoader<S, V> {
    source: S,
    view: V,
    template: Template,
    exhausted_text: String,
    offset: u64,
    pages: usize,
    exhausted: bool,
}

impl<S, V> ScrollLoader<S, V>
where
    S: PageSource,
    V: View,
{
    pub fn new(source: S, view: V) -> Self {
        Self {
            source,
            view,
            template: Template::default(),
            exhausted_text: DEFAULT_EXHAUSTED_TEXT.to_string(),
            offset: 0,
            pages: 0,
            exhausted: false,
        }
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    pub fn with_exhausted_text(mut self, text: impl Into<String>) -> Self {
        self.exhausted_text = text.into();
        self
    }

    /// Records rendered so far; also the offset of the next request.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Non-empty pages rendered so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_view(self) -> V {
        self.view
    }

    pub async fn load_more(&mut self) -> Result<LoadOutcome, LoadError> {
        if self.exhausted {
            debug!(offset = self.offset, "feed already exhausted, not requesting");
            return Ok(LoadOutcome::Exhausted);
        }

        let offset = self.offset;
        let page = match self.source.fetch(offset).await {
            Ok(page) => {
                self.view.clear_error();
                page
            }
            Err(e) => {
                warn!(offset, error = %e, "page load failed");
                self.view.show_error(&e.to_string());
                return Err(e);
            }
        };

        if page.is_empty() {
            info!(offset, "empty page, feed exhausted");
            self.view.set_sentinel_text(&self.exhausted_text);
            self.exhausted = true;
            return Ok(LoadOutcome::Exhausted);
        }

        let rendered = page.len();
        for record in page.iter() {
            self.view.append(fragment::render(&self.template, record));
            self.offset += 1;
        }
        self.pages += 1;
        debug!(rendered, offset = self.offset, "page rendered");

        Ok(LoadOutcome::Loaded {
            rendered,
            offset: self.offset,
        })
    }
}

/// Shared access to a loader for hosts that fire triggers from several
/// places. A trigger that arrives while a load is running is dropped with
/// [`LoadOutcome::Busy`] instead of issuing a second request at the same
/// offset.
pub struct ScrollHandle<S, V> {
    inner: Arc<Mutex<ScrollLoader<S, V>>>,
}

impl<S, V> Clone for ScrollHandle<S, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, V> ScrollHandle<S, V>
where
    S: PageSource,
    V: View,
{
    pub fn new(loader: ScrollLoader<S, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(loader)),
        }
    }

    pub async fn trigger(&self) -> Result<LoadOutcome, LoadError> {
        let Ok(mut loader) = self.inner.try_lock() else {
            debug!("load already in flight, trigger dropped");
            return Ok(LoadOutcome::Busy);
        };
        loader.load_more().await
    }

    /// Runs `f` against the loader once no load is in flight.
    pub async fn inspect<R>(&self, f: impl FnOnce(&ScrollLoader<S, V>) -> R) -> R {
        let loader = self.inner.lock().await;
        f(&loader)
    }
}
