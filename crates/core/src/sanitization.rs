//! Input sanitization utilities for preventing XSS and injection attacks

use ammonia::Builder;
use std::collections::HashSet;

/// Sanitize HTML content, removing all potentially dangerous elements
pub fn sanitize_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitize HTML with custom allowed tags
pub fn sanitize_html_with_tags(input: &str, allowed_tags: &[&str]) -> String {
    let tags: HashSet<&str> = allowed_tags.iter().copied().collect();
    Builder::default()
        .tags(tags)
        .clean(input)
        .to_string()
}

/// Sanitize search query - allow only safe characters
pub fn sanitize_search_query(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_' || *c == '\'')
        .take(256)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitize user display name
pub fn sanitize_display_name(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_' || *c == '.')
        .take(64)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitize a generic text field
pub fn sanitize_text(input: &str, max_length: usize) -> String {
    let cleaned = ammonia::clean(input);
    cleaned.chars().take(max_length).collect()
}

/// Check if input contains potential XSS payloads
pub fn contains_xss_patterns(input: &str) -> bool {
    let lower = input.to_lowercase();
    let patterns = [
        "<script",
        "javascript:",
        "onerror=",
        "onload=",
        "onclick=",
        "onmouseover=",
        "onfocus=",
        "onblur=",
        "<iframe",
        "<object",
        "<embed",
        "data:text/html",
        "vbscript:",
    ];
    patterns.iter().any(|p| lower.contains(p))
}

/// Escape special characters for safe JSON embedding
pub fn escape_json_string(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}
