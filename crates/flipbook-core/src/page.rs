#![forbid(unsafe_code)]

//! A single page of the book.

/// Number of leading pages that are never filtered (cover + intro).
pub const DEFAULT_FIXED_LEADING_PAGES: usize = 2;

/// What a page is, derived from its position in the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageRole {
    /// Front cover (index 0).
    Cover,
    /// Any other fixed leading page.
    Intro,
    /// Searchable content page.
    Entry,
}

/// One page of the deck.
///
/// `flipped`, `filtered`, and `stack_order` are mutated in place for the life
/// of the widget; `index` and the search key never change after setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    index: usize,
    role: PageRole,
    tag: Option<String>,
    search_key: String,
    pub(crate) flipped: bool,
    pub(crate) filtered: bool,
    pub(crate) stack_order: u32,
}

impl Page {
    /// Create a page at `index`. Fixed leading pages ignore `tag` for search.
    #[must_use]
    pub fn new(index: usize, tag: Option<String>, fixed_leading: usize) -> Self {
        let role = match index {
            0 => PageRole::Cover,
            i if i < fixed_leading => PageRole::Intro,
            _ => PageRole::Entry,
        };
        let search_key = match role {
            PageRole::Entry => tag
                .as_deref()
                .map(|t| t.trim().to_lowercase())
                .unwrap_or_default(),
            PageRole::Cover | PageRole::Intro => String::new(),
        };
        Self {
            index,
            role,
            tag,
            search_key,
            flipped: false,
            filtered: false,
            stack_order: 0,
        }
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn role(&self) -> PageRole {
        self.role
    }

    /// The tag exactly as supplied by the host markup.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Lowercased, trimmed tag used for substring matching. Empty for fixed pages.
    #[must_use]
    pub fn search_key(&self) -> &str {
        &self.search_key
    }

    /// Whether this page can be excluded by a search term.
    #[must_use]
    pub const fn is_filterable(&self) -> bool {
        matches!(self.role, PageRole::Entry)
    }

    #[must_use]
    pub const fn is_flipped(&self) -> bool {
        self.flipped
    }

    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        self.filtered
    }

    /// Hidden iff filtered.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        !self.filtered
    }

    #[must_use]
    pub const fn stack_order(&self) -> u32 {
        self.stack_order
    }
}
