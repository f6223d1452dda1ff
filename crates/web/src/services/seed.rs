//! Example articles published into an empty blog.

use chrono::{DateTime, TimeZone, Utc};

/// One example article.
#[derive(Debug, Clone, Copy)]
pub struct ExampleArticle {
    pub title: &'static str,
    pub content: &'static str,
    /// `(year, month, day, hour, minute)` in UTC.
    published: (i32, u32, u32, u32, u32),
}

impl ExampleArticle {
    /// Original publication time, kept so the examples sort as history.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let (year, month, day, hour, minute) = self.published;
        Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
    }
}

/// The example articles, oldest first.
pub const EXAMPLE_ARTICLES: [ExampleArticle; 2] = [
    ExampleArticle {
        title: "Understanding Kafka Partitions and Message Polling",
        content: include_str!("../../seed/kafka-partitions.md"),
        published: (2025, 2, 15, 10, 0),
    },
    ExampleArticle {
        title: "Golang Project Structure and Goroutines: A Practical Guide",
        content: include_str!("../../seed/golang-structure.md"),
        published: (2025, 2, 16, 14, 30),
    },
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_examples_have_fixed_dates() {
        let kafka = EXAMPLE_ARTICLES[0].created_at().unwrap();
        assert_eq!(kafka.to_rfc3339(), "2025-02-15T10:00:00+00:00");
        let golang = EXAMPLE_ARTICLES[1].created_at().unwrap();
        assert!(golang > kafka);
    }

    #[test]
    fn test_examples_keep_code_blocks() {
        assert!(EXAMPLE_ARTICLES[0].content.contains("```java"));
        assert!(EXAMPLE_ARTICLES[1].content.contains("├── cmd/"));
    }
}
