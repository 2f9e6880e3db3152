//! Small text helpers shared by the CLI and the extractor

/// Collapse runs of whitespace to single spaces and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "west bengal" -> "West Bengal"
///
/// The portal lists states and districts in title case; callers normalize user
/// input with this before resolving.
pub fn title_case(text: &str) -> String {
    normalize_whitespace(text)
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
