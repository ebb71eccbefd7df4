//! Category filter
//!
//! Applied to fetched items before classification. An item passes when the
//! last path segment of its link contains the configured category.

use crate::traits::Item;

/// Pre-classification item filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    category: Option<String>,
}

impl CategoryFilter {
    /// Build a filter; `None` or an empty category lets everything through
    pub fn new(category: Option<String>) -> Self {
        Self {
            category: category.filter(|c| !c.is_empty()),
        }
    }

    /// The active category, if any
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Whether the item should be processed
    pub fn accepts(&self, item: &Item) -> bool {
        match &self.category {
            None => true,
            Some(category) => last_segment(&item.link).contains(category.as_str()),
        }
    }
}

/// Last non-empty path segment of a link, ignoring query and fragment
fn last_segment(link: &str) -> &str {
    let path = link.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(link: &str) -> Item {
        Item::new("t", link, "b")
    }

    #[test]
    fn no_category_accepts_everything() {
        let filter = CategoryFilter::new(None);
        assert!(filter.accepts(&item("https://blog/posts/anything")));
        assert!(CategoryFilter::new(Some(String::new())).accepts(&item("https://blog/x")));
    }

    #[test]
    fn matches_last_segment_only() {
        let filter = CategoryFilter::new(Some("rust".to_string()));

        assert!(filter.accepts(&item("https://blog/posts/learning-rust")));
        assert!(filter.accepts(&item("https://blog/posts/rust-2024/")));
        assert!(!filter.accepts(&item("https://blog/rust/cooking")));
    }

    #[test]
    fn ignores_query_and_fragment() {
        let filter = CategoryFilter::new(Some("rust".to_string()));
        assert!(filter.accepts(&item("https://blog/posts/rust-tips?utm=feed#top")));
        assert!(!filter.accepts(&item("https://blog/posts/go-tips?tag=rust")));
    }

    #[test]
    fn segment_extraction() {
        assert_eq!(last_segment("https://x/a/b"), "b");
        assert_eq!(last_segment("https://x/a/b/"), "b");
        assert_eq!(last_segment(""), "");
    }
}
