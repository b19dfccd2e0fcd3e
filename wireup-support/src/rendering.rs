//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format dependency chains, shorten type names,
//! and generate "did you mean?" suggestions in error output.

use std::fmt;

/// Renders a dependency chain as a readable string.
///
/// # Examples
/// ```
/// use wireup_support::rendering::render_chain;
///
/// let chain = vec!["UserService", "UserRepo", "Database", "UserService"];
/// let rendered = render_chain(&chain);
/// assert_eq!(rendered, "UserService → UserRepo → Database → UserService");
/// ```
pub fn render_chain<T: fmt::Display>(chain: &[T]) -> String {
    let mut rendered = String::new();
    for (i, entry) in chain.iter().enumerate() {
        if i > 0 {
            rendered.push_str(" → ");
        }
        rendered.push_str(&entry.to_string());
    }
    rendered
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use wireup_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::services::user::UserService");
/// assert_eq!(short, "UserService");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>");
/// assert_eq!(short, "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    // Take the last segment of every path component, keeping generic
    // punctuation intact: "a::b::C<x::Y>" → "C<Y>".
    let mut result = String::with_capacity(full_name.len());
    let mut segment = String::new();
    let mut chars = full_name.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                segment.clear();
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' => {
                result.push_str(&segment);
                result.push(ch);
                segment.clear();
            }
            _ => segment.push(ch),
        }
    }

    result.push_str(&segment);
    result
}

/// Generates "did you mean?" suggestions for a requested type name.
///
/// Scores the available names against the requested one and returns up
/// to `max_suggestions` matches, best first.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    let requested_short = shorten_type_name(requested).to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter_map(|&name| score_candidate(name, &requested_lower, &requested_short).map(|s| (name, s)))
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

fn score_candidate(name: &str, requested_lower: &str, requested_short: &str) -> Option<usize> {
    let name_lower = name.to_lowercase();

    // Full-path substring match
    if name_lower.contains(requested_lower) || requested_lower.contains(&name_lower) {
        return Some(100);
    }

    let name_short = shorten_type_name(name).to_lowercase();

    // Short-name substring match
    if name_short.contains(requested_short) || requested_short.contains(&name_short) {
        return Some(80);
    }

    // Common prefix of the short names
    let common = name_short
        .chars()
        .zip(requested_short.chars())
        .take_while(|(a, b)| a == b)
        .count();

    if common >= 3 { Some(common * 10) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_simple_chain() {
        let chain = vec!["A", "B", "C", "A"];
        assert_eq!(render_chain(&chain), "A → B → C → A");
    }

    #[test]
    fn render_single_element_chain() {
        let chain = vec!["A"];
        assert_eq!(render_chain(&chain), "A");
    }

    #[test]
    fn render_empty_chain() {
        let chain: Vec<&str> = vec![];
        assert_eq!(render_chain(&chain), "");
    }

    #[test]
    fn render_display_values() {
        let chain = vec![1, 2, 3];
        assert_eq!(render_chain(&chain), "1 → 2 → 3");
    }

    #[test]
    fn shorten_simple_path() {
        assert_eq!(
            shorten_type_name("my_app::services::UserService"),
            "UserService"
        );
    }

    #[test]
    fn shorten_with_generics() {
        assert_eq!(
            shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>"),
            "Arc<dyn Logger>"
        );
    }

    #[test]
    fn shorten_tuple() {
        assert_eq!(
            shorten_type_name("(alloc::string::String, core::option::Option<u8>)"),
            "(String, Option<u8>)"
        );
    }

    #[test]
    fn shorten_no_path() {
        assert_eq!(shorten_type_name("String"), "String");
    }

    #[test]
    fn suggest_similar_types() {
        let available = vec![
            "my_app::UserService",
            "my_app::UserRepository",
            "my_app::Logger",
            "my_app::Database",
        ];

        let suggestions = suggest_similar("UserServise", &available, 3);
        assert!(!suggestions.is_empty());
        assert!(suggestions[0].contains("UserService"));
    }

    #[test]
    fn suggest_no_match() {
        let available = vec!["my_app::Database"];
        let suggestions = suggest_similar("XyzQwv", &available, 3);
        assert!(suggestions.is_empty());
    }

    #[test]
    fn suggest_respects_limit() {
        let available = vec![
            "my_app::UserService",
            "my_app::UserServiceFactory",
            "my_app::UserServiceProxy",
        ];
        let suggestions = suggest_similar("UserService", &available, 2);
        assert_eq!(suggestions.len(), 2);
    }
}
