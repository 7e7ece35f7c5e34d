#![forbid(unsafe_code)]

//! Search filtering over page tags.
//!
//! Filtering is synchronous and idempotent: every call starts by clearing
//! `filtered` and `flipped` on all pages, then excludes searchable pages
//! whose key does not contain the term. Fixed leading pages always stay.

use crate::deck::Deck;

/// A normalized search term (lowercased, trimmed).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SearchTerm(String);

impl SearchTerm {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether a page search key passes this term.
    #[must_use]
    pub fn matches(&self, search_key: &str) -> bool {
        self.is_empty() || search_key.contains(self.0.as_str())
    }
}

/// Counts after a filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub visible: usize,
    pub filtered: usize,
}

/// Reset every page, then filter out non-matching searchable pages.
///
/// Stack order and cursor are left to the caller.
pub fn apply(deck: &mut Deck, term: &SearchTerm) -> FilterSummary {
    let mut summary = FilterSummary::default();
    for page in deck.pages_mut() {
        page.flipped = false;
        page.filtered = page.is_filterable() && !term.matches(page.search_key());
        if page.filtered {
            summary.filtered += 1;
        } else {
            summary.visible += 1;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn breeds() -> Deck {
        Deck::with_default_leading([
            None,
            None,
            Some("Labrador"),
            Some("Poodle"),
            Some("Beagle"),
        ])
    }

    fn filtered_flags(deck: &Deck) -> Vec<bool> {
        deck.pages().iter().map(|p| p.is_filtered()).collect()
    }

    #[test]
    fn term_is_trimmed_and_lowercased() {
        assert_eq!(SearchTerm::parse("  PooDLE ").as_str(), "poodle");
        assert!(SearchTerm::parse("   ").is_empty());
    }

    #[test]
    fn substring_match_keeps_fixed_pages() {
        let mut deck = breeds();
        let summary = apply(&mut deck, &SearchTerm::parse("oodle"));
        assert_eq!(filtered_flags(&deck), vec![false, false, true, false, true]);
        assert_eq!(
            summary,
            FilterSummary {
                visible: 3,
                filtered: 2
            }
        );
    }

    #[test]
    fn uppercase_tags_match_lowercase_terms() {
        let mut deck = breeds();
        apply(&mut deck, &SearchTerm::parse("BEAG"));
        assert_eq!(filtered_flags(&deck), vec![false, false, true, true, false]);
    }

    #[test]
    fn empty_term_restores_everything() {
        let mut deck = breeds();
        apply(&mut deck, &SearchTerm::parse("zzz"));
        deck.set_flipped(0, true);
        apply(&mut deck, &SearchTerm::parse(""));
        assert!(deck.pages().iter().all(|p| p.is_visible() && !p.is_flipped()));
    }

    #[test]
    fn untagged_entries_never_match_a_term() {
        let mut deck = Deck::with_default_leading([None, None, None::<&str>]);
        apply(&mut deck, &SearchTerm::parse("a"));
        assert_eq!(filtered_flags(&deck), vec![false, false, true]);
    }
}
