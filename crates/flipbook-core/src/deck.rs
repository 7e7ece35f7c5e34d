#![forbid(unsafe_code)]

//! The fixed, ordered collection of pages.
//!
//! # Invariants
//!
//! 1. Length is fixed at construction; pages are never added or removed.
//! 2. Page `i` always sits at position `i`.
//! 3. Fixed leading pages are never filtered.
//!
//! Stack order is derived state. Two formulas exist:
//!
//! - **settled** (after a flip animation): pages at or after the cursor stack
//!   with lower indices on top (`N - i`), pages before it form the left pile
//!   with higher indices on top (`i + 1`).
//! - **dense visible** (after a filter): visible pages are numbered from the
//!   top, the first visible page getting the highest value. Hidden pages get 0.

use crate::page::{DEFAULT_FIXED_LEADING_PAGES, Page};

#[inline]
fn order(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Ordered deck of pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    pages: Vec<Page>,
    fixed_leading: usize,
}

impl Deck {
    /// Build a deck from per-page tags, in display order.
    #[must_use]
    pub fn from_tags<I, S>(tags: I, fixed_leading: usize) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let pages = tags
            .into_iter()
            .enumerate()
            .map(|(index, tag)| Page::new(index, tag.map(Into::into), fixed_leading))
            .collect();
        Self {
            pages,
            fixed_leading,
        }
    }

    /// Build a deck with the default two fixed leading pages.
    #[must_use]
    pub fn with_default_leading<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self::from_tags(tags, DEFAULT_FIXED_LEADING_PAGES)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[must_use]
    pub const fn fixed_leading(&self) -> usize {
        self.fixed_leading
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub(crate) fn pages_mut(&mut self) -> &mut [Page] {
        &mut self.pages
    }

    /// Nearest non-filtered index strictly after `from`.
    #[must_use]
    pub fn next_visible(&self, from: usize) -> Option<usize> {
        self.pages
            .iter()
            .skip(from.saturating_add(1))
            .find(|p| p.is_visible())
            .map(Page::index)
    }

    /// Nearest non-filtered index strictly before `from`.
    #[must_use]
    pub fn prev_visible(&self, from: usize) -> Option<usize> {
        self.pages
            .iter()
            .take(from.min(self.pages.len()))
            .rev()
            .find(|p| p.is_visible())
            .map(Page::index)
    }

    #[must_use]
    pub fn last_visible(&self) -> Option<usize> {
        self.pages
            .iter()
            .rev()
            .find(|p| p.is_visible())
            .map(Page::index)
    }

    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.pages.iter().filter(|p| p.is_visible()).count()
    }

    /// Indices of visible pages in deck order.
    pub fn visible_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages
            .iter()
            .filter(|p| p.is_visible())
            .map(Page::index)
    }

    /// Mark a page flipped or unflipped. Out-of-range indices are ignored.
    pub fn set_flipped(&mut self, index: usize, flipped: bool) {
        if let Some(page) = self.pages.get_mut(index) {
            page.flipped = flipped;
        }
    }

    /// Give a page the temporary top order `N + 1` for the duration of a flip.
    pub fn raise_to_top(&mut self, index: usize) {
        let top = order(self.pages.len().saturating_add(1));
        if let Some(page) = self.pages.get_mut(index) {
            page.stack_order = top;
        }
    }

    /// Steady-state stack order for a cursor at `current`.
    pub fn settle_stack(&mut self, current: usize) {
        let total = self.pages.len();
        for (i, page) in self.pages.iter_mut().enumerate() {
            page.stack_order = if i >= current {
                order(total - i)
            } else {
                order(i + 1)
            };
        }
    }

    /// Dense stack order over visible pages only; hidden pages get 0.
    pub fn dense_visible_stack(&mut self) {
        let mut remaining = self.visible_count();
        for page in &mut self.pages {
            if page.is_visible() {
                page.stack_order = order(remaining);
                remaining -= 1;
            } else {
                page.stack_order = 0;
            }
        }
    }

    /// Index of the page that currently tops the visual stack, if any page is visible.
    ///
    /// Ties (possible mid-animation) resolve to the later index, matching how
    /// a browser paints equal `z-index` siblings.
    #[must_use]
    pub fn topmost(&self) -> Option<usize> {
        self.pages
            .iter()
            .filter(|p| p.is_visible())
            .max_by_key(|p| (p.stack_order, p.index()))
            .map(Page::index)
    }
}
