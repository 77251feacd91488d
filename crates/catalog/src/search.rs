//! Free-text search over catalog documents.
//!
//! The term is matched literally and case-insensitively; it is never compiled as a
//! pattern.

/// A normalized search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm(String);

impl SearchTerm {
    pub fn new(term: &str) -> Self {
        Self(term.trim().to_lowercase())
    }

    /// Blank terms match everything.
    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, haystack: &str) -> bool {
        self.is_blank() || haystack.to_lowercase().contains(&self.0)
    }

    /// True when any of the candidate fields matches.
    pub fn matches_any<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> bool {
        self.is_blank() || fields.into_iter().any(|f| self.matches(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_case_insensitive_substrings() {
        let term = SearchTerm::new("  RUNner ");
        assert!(term.matches("Trail Runner"));
        assert!(!term.matches("Hiking Boot"));
    }

    #[test]
    fn pattern_characters_are_literal() {
        let term = SearchTerm::new(".*");
        assert!(!term.matches("anything"));
        assert!(term.matches("wildcard .* literal"));
    }

    #[test]
    fn blank_term_matches_everything() {
        let term = SearchTerm::new("   ");
        assert!(term.matches_any(["a", "b"]));
        assert!(term.matches_any(std::iter::empty()));
    }

    #[test]
    fn any_field_may_match() {
        let term = SearchTerm::new("acme");
        assert!(term.matches_any(["Trail Runner", "Acme", "Shoes"]));
        assert!(!term.matches_any(["Trail Runner", "Globex", "Shoes"]));
    }
}
