//! Article input validation.

/// Errors that can occur when building an [`ArticleDraft`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// The title is empty or whitespace only.
    #[error("title cannot be empty")]
    EmptyTitle,
    /// The content is empty or whitespace only.
    #[error("content cannot be empty")]
    EmptyContent,
}

/// A validated, not yet published article.
///
/// The title is trimmed. The content is kept byte-for-byte because articles
/// carry code blocks and ASCII trees where leading whitespace matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDraft {
    title: String,
    content: String,
}

impl ArticleDraft {
    /// Validate a title/content pair.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::EmptyTitle`] or [`DraftError::EmptyContent`] when
    /// the corresponding field has no visible characters.
    pub fn new(title: &str, content: &str) -> Result<Self, DraftError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DraftError::EmptyTitle);
        }
        if content.trim().is_empty() {
            return Err(DraftError::EmptyContent);
        }
        Ok(Self {
            title: title.to_owned(),
            content: content.to_owned(),
        })
    }

    /// The trimmed title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The content as entered.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_draft_trims_title_only() {
        let draft = ArticleDraft::new("  Kafka notes ", "  indented\ncode").unwrap();
        assert_eq!(draft.title(), "Kafka notes");
        assert_eq!(draft.content(), "  indented\ncode");
    }

    #[test]
    fn test_empty_title() {
        assert_eq!(
            ArticleDraft::new("   ", "body"),
            Err(DraftError::EmptyTitle)
        );
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(
            ArticleDraft::new("Title", "\n\t "),
            Err(DraftError::EmptyContent)
        );
    }
}
