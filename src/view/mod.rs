use serde::Serialize;

use crate::fragment::Fragment;

pub const LOADING_TEXT: &str = "Loading...";
pub const DEFAULT_EXHAUSTED_TEXT: &str = "No more users";

/// What the loader needs from the page it renders into.
pub trait View {
    /// Appends one fragment at the end of the container.
    fn append(&mut self, fragment: Fragment);

    /// Rewrites the sentinel placeholder.
    fn set_sentinel_text(&mut self, text: &str);

    /// Reports a failed load. Kept apart from the sentinel so that a failure
    /// never reads as "no more results".
    fn show_error(&mut self, message: &str) {
        let _ = message;
    }

    /// Drops a message left by an earlier failed load.
    fn clear_error(&mut self) {}
}

/// In-memory page: the container, its sentinel and an error slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub container: Vec<Fragment>,
    pub sentinel: String,
    pub error: Option<String>,
}

impl Default for PageView {
    fn default() -> Self {
        Self {
            container: Vec::new(),
            sentinel: LOADING_TEXT.to_string(),
            error: None,
        }
    }
}

impl PageView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.container.len()
    }

    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }
}

impl View for PageView {
    fn append(&mut self, fragment: Fragment) {
        self.container.push(fragment);
    }

    fn set_sentinel_text(&mut self, text: &str) {
        self.sentinel = text.to_string();
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    fn clear_error(&mut self) {
        self.error = None;
    }
}

impl<V: View + ?Sized> View for &mut V {
    fn append(&mut self, fragment: Fragment) {
        (**self).append(fragment)
    }

    fn set_sentinel_text(&mut self, text: &str) {
        (**self).set_sentinel_text(text)
    }

    fn show_error(&mut self, message: &str) {
        (**self).show_error(message)
    }

    fn clear_error(&mut self) {
        (**self).clear_error()
    }
}
