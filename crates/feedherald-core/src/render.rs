//! Notification text
//!
//! Turns a decision into the text handed to the notifier. Kept apart from
//! the classifier: wording is policy, the decision is not.

use crate::classifier::Decision;
use crate::traits::Item;

/// Default title prefix for posts announced with their full body
pub const DEFAULT_INLINE_TITLE_PREFIX: &str = "Thoughts";

/// Wording rules for announcements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPolicy {
    /// New posts whose title starts with this are announced inline
    /// (`"{body} - {link}"`) instead of as a bare link
    pub inline_title_prefix: String,
}

impl RenderPolicy {
    /// Create a policy with the given inline prefix
    pub fn new(inline_title_prefix: impl Into<String>) -> Self {
        Self {
            inline_title_prefix: inline_title_prefix.into(),
        }
    }

    /// Text for a NEW item
    pub fn new_post(&self, item: &Item) -> String {
        if !self.inline_title_prefix.is_empty() && item.title.starts_with(&self.inline_title_prefix)
        {
            format!("{} - {}", item.body, item.link)
        } else {
            format!("New blog post: {}", item.link)
        }
    }

    /// Text for an UPDATED item
    pub fn updated_post(&self, item: &Item) -> String {
        format!("Blog post has been updated: {}", item.link)
    }

    /// Text for any decision; `None` for UNCHANGED
    pub fn render(&self, decision: Decision, item: &Item) -> Option<String> {
        match decision {
            Decision::New => Some(self.new_post(item)),
            Decision::Updated => Some(self.updated_post(item)),
            Decision::Unchanged => None,
        }
    }
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_INLINE_TITLE_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_post_is_a_link() {
        let item = Item::new("Release notes", "https://x/1", "long body");
        assert_eq!(
            RenderPolicy::default().render(Decision::New, &item).as_deref(),
            Some("New blog post: https://x/1")
        );
    }

    #[test]
    fn inline_prefix_includes_body() {
        let item = Item::new("Thoughts on Rust", "https://x/2", "Ownership is neat");
        assert_eq!(
            RenderPolicy::default().render(Decision::New, &item).as_deref(),
            Some("Ownership is neat - https://x/2")
        );
    }

    #[test]
    fn updated_post_stays_generic() {
        let item = Item::new("Thoughts on Rust", "https://x/2", "Ownership is neat");
        assert_eq!(
            RenderPolicy::default().render(Decision::Updated, &item).as_deref(),
            Some("Blog post has been updated: https://x/2")
        );
    }

    #[test]
    fn unchanged_renders_nothing() {
        let item = Item::new("t", "https://x/3", "b");
        assert_eq!(RenderPolicy::default().render(Decision::Unchanged, &item), None);
    }

    #[test]
    fn empty_prefix_disables_inline() {
        let item = Item::new("Thoughts", "https://x/4", "b");
        assert_eq!(
            RenderPolicy::new("").new_post(&item),
            "New blog post: https://x/4"
        );
    }
}
