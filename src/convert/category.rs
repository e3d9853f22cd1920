use crate::crawler::ContentKind;
use std::fmt;

/// Content families the pipeline knows how to convert
///
/// Resolved once per response from its [`ContentKind`]; anything that maps
/// to `None` is rejected as unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentCategory {
    /// HTML pages
    Web,
    /// Plain text and Markdown
    Text,
    /// Structured payloads (JSON, XML)
    Data,
}

impl ContentCategory {
    /// Maps a response classification onto a category
    pub fn from_kind(kind: ContentKind) -> Option<Self> {
        match kind {
            ContentKind::Html => Some(Self::Web),
            ContentKind::PlainText | ContentKind::Markdown => Some(Self::Text),
            ContentKind::Json | ContentKind::Xml => Some(Self::Data),
            ContentKind::Image | ContentKind::Other => None,
        }
    }

    /// Directory name used at the top of the archive
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Text => "text",
            Self::Data => "data",
        }
    }

    /// Every category, in manifest order
    pub fn all() -> [Self; 3] {
        [Self::Web, Self::Text, Self::Data]
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kind() {
        assert_eq!(
            ContentCategory::from_kind(ContentKind::Html),
            Some(ContentCategory::Web)
        );
        assert_eq!(
            ContentCategory::from_kind(ContentKind::Markdown),
            Some(ContentCategory::Text)
        );
        assert_eq!(
            ContentCategory::from_kind(ContentKind::Xml),
            Some(ContentCategory::Data)
        );
        assert_eq!(ContentCategory::from_kind(ContentKind::Image), None);
        assert_eq!(ContentCategory::from_kind(ContentKind::Other), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ContentCategory::Web.to_string(), "web");
        assert_eq!(ContentCategory::Data.to_string(), "data");
    }
}
