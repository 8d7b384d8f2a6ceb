//! Outbound shopping links for ingredients.

pub const AMAZON_AFFILIATE_TAG: &str = "awzdigital00-21";
const AMAZON_BASE_URL: &str = "https://www.amazon.in/s";

/// Amazon search URL for `term` carrying the affiliate tag.
///
/// Blank terms yield `"#"` so the link renders but goes nowhere.
pub fn amazon_search_url(term: &str) -> String {
    let term = term.trim();
    if term.is_empty() {
        return "#".to_string();
    }
    format!(
        "{}?k={}&tag={}",
        AMAZON_BASE_URL,
        urlencoding::encode(term),
        AMAZON_AFFILIATE_TAG
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_term_is_inert() {
        assert_eq!(amazon_search_url(""), "#");
        assert_eq!(amazon_search_url("   "), "#");
    }

    #[test]
    fn test_term_is_trimmed_and_encoded() {
        assert_eq!(
            amazon_search_url("  garam masala "),
            "https://www.amazon.in/s?k=garam%20masala&tag=awzdigital00-21"
        );
    }
}
