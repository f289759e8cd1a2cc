//! Input URL extraction.
//!
//! The CLI accepts a single URL, a plain text file with one URL per line, or
//! a Markdown file containing links. This module turns any of those into an
//! ordered, deduplicated list of candidate URLs.

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;

use crate::error::{NotatError, Result};

/// Extract candidate URLs from a CLI input argument.
///
/// - An existing `.md` file: Markdown `[text](url)` links first, then any
///   bare `http(s)` URLs remaining after the linked ones are removed from
///   the text.
/// - Any other existing file: one candidate per line, keeping only lines
///   that literally start with `http://` or `https://`.
/// - Anything else must itself be an `http(s)` URL.
///
/// The result preserves first-seen order with duplicates removed. An input
/// file that yields no URLs is an error.
pub fn extract_urls(input: &str) -> Result<Vec<String>> {
    let path = Path::new(input);
    if path.is_file() {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NotatError::InvalidInput(format!("Cannot read {}: {}", input, e))
        })?;
        let urls = if input.ends_with(".md") {
            from_markdown(&content)
        } else {
            from_lines(&content)
        };
        let urls = dedupe(urls);
        if urls.is_empty() {
            return Err(NotatError::InvalidInput(format!(
                "No URLs found in {}",
                input
            )));
        }
        Ok(urls)
    } else if input.starts_with("http://") || input.starts_with("https://") {
        Ok(vec![input.to_string()])
    } else {
        Err(NotatError::InvalidInput(format!(
            "Expected a URL or a path to an existing file, got: {}",
            input
        )))
    }
}

/// Markdown extraction: `[text](url)` links in order, then bare URLs from
/// the text with the linked URLs removed.
fn from_markdown(content: &str) -> Vec<String> {
    let link_re = Regex::new(r"\[([^\]]*)\]\((https?://[^\s\)]+)\)").expect("Invalid regex");
    let bare_re = Regex::new(r"https?://[^\s\)]+").expect("Invalid regex");

    let mut urls = Vec::new();
    let mut residual = content.to_string();
    for caps in link_re.captures_iter(content) {
        let url = caps[2].to_string();
        residual = residual.replace(&url, "");
        urls.push(url);
    }
    for m in bare_re.find_iter(&residual) {
        urls.push(m.as_str().to_string());
    }
    urls
}

/// Plain-text extraction: one URL per line.
fn from_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("http://") || line.starts_with("https://"))
        .map(String::from)
        .collect()
}

/// Remove duplicates, keeping the first occurrence of each URL.
fn dedupe(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_links_then_bare_urls() {
        let content = "See [demo](https://video.example/a) and raw https://video.example/b";
        assert_eq!(
            dedupe(from_markdown(content)),
            vec![
                "https://video.example/a".to_string(),
                "https://video.example/b".to_string(),
            ]
        );
    }

    #[test]
    fn test_markdown_linked_url_not_double_counted() {
        // The linked URL also appears bare; removal plus dedupe keeps one.
        let content = "[a](https://v.example/1)\nhttps://v.example/1\nhttps://v.example/2";
        assert_eq!(
            dedupe(from_markdown(content)),
            vec![
                "https://v.example/1".to_string(),
                "https://v.example/2".to_string(),
            ]
        );
    }

    #[test]
    fn test_lines_filters_non_urls() {
        let content = "https://v.example/1\n# comment\n  https://v.example/2  \nftp://nope\n";
        assert_eq!(
            from_lines(content),
            vec![
                "https://v.example/1".to_string(),
                "https://v.example/2".to_string(),
            ]
        );
    }

    #[test]
    fn test_dedupe_preserves_first_seen_order() {
        let urls = vec![
            "https://a".to_string(),
            "https://b".to_string(),
            "https://a".to_string(),
            "https://c".to_string(),
        ];
        assert_eq!(
            dedupe(urls),
            vec![
                "https://a".to_string(),
                "https://b".to_string(),
                "https://c".to_string(),
            ]
        );
    }

    #[test]
    fn test_single_url_argument() {
        let urls = extract_urls("https://www.bilibili.com/video/BV1").unwrap();
        assert_eq!(urls, vec!["https://www.bilibili.com/video/BV1".to_string()]);
    }

    #[test]
    fn test_invalid_argument_rejected() {
        assert!(extract_urls("not-a-url-or-file").is_err());
    }

    #[test]
    fn test_markdown_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.md");
        std::fs::write(
            &path,
            "Watch [this](https://v.example/x) plus https://v.example/y\n",
        )
        .unwrap();

        let urls = extract_urls(path.to_str().unwrap()).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://v.example/x".to_string(),
                "https://v.example/y".to_string(),
            ]
        );
    }

    #[test]
    fn test_text_file_without_urls_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "nothing here\n").unwrap();

        assert!(extract_urls(path.to_str().unwrap()).is_err());
    }
}
