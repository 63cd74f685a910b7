use listing::{paginate, sort_refs, Accessors, PageSpec, SortSpec};
use shared::error::ApiError;
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Issued by [`ListView::begin_fetch`]; a result carrying a ticket from
/// before the last unmount is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Replaced,
    /// The fetch failed; previously shown rows stay and the error is set.
    KeptStale,
    /// The very first fetch failed; the view is empty with an error.
    FailedEmpty,
    /// The view was unmounted after the fetch started.
    Ignored,
}

/// One page of a view, already sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewPage<'a, T> {
    pub rows: Vec<&'a T>,
    pub page_number: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> ViewPage<'_, T> {
    pub fn indicator(&self) -> String {
        format!("{} / {}", self.page_number, self.total_pages)
    }
}

/// State behind one table: the fetched collection, its sort and page, and
/// the last error message.
pub struct ListView<T> {
    items: Vec<T>,
    loaded: bool,
    error: Option<String>,
    sort: SortSpec,
    page: PageSpec,
    accessors: Accessors<T>,
    generation: u64,
    mounted: bool,
}

impl<T> ListView<T> {
    pub fn new(accessors: Accessors<T>) -> Self {
        let sort = SortSpec::ascending(accessors.default_field());
        Self {
            items: Vec::new(),
            loaded: false,
            error: None,
            sort,
            page: PageSpec::first(DEFAULT_PAGE_SIZE),
            accessors,
            generation: 0,
            mounted: true,
        }
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page = self.page.with_page_size(page_size, self.items.len());
        self
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn sort_spec(&self) -> &SortSpec {
        &self.sort
    }

    pub fn page_spec(&self) -> PageSpec {
        self.page
    }

    pub fn accessors(&self) -> &Accessors<T> {
        &self.accessors
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Re-mounts a view after [`ListView::unmount`]; tickets issued before
    /// the unmount stay invalid.
    pub fn mount(&mut self) {
        self.mounted = true;
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
        self.generation += 1;
    }

    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket {
            generation: self.generation,
        }
    }

    /// Applies a fetch result. Whichever response arrives last wins.
    pub fn apply(&mut self, ticket: FetchTicket, result: Result<Vec<T>, ApiError>) -> ApplyOutcome {
        if !self.mounted || ticket.generation != self.generation {
            debug!("dropping fetch result for an unmounted view");
            return ApplyOutcome::Ignored;
        }

        match result {
            Ok(items) => {
                self.items = items;
                self.loaded = true;
                self.error = None;
                self.page = self.page.clamped(self.items.len());
                ApplyOutcome::Replaced
            }
            Err(err) => {
                self.error = Some(err.user_message());
                if self.loaded {
                    ApplyOutcome::KeptStale
                } else {
                    self.items.clear();
                    ApplyOutcome::FailedEmpty
                }
            }
        }
    }

    /// Header click: same field flips direction, a new field starts ascending.
    pub fn toggle_sort(&mut self, field: &str) {
        self.sort.toggle(field);
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page = self.page.with_page_size(page_size, self.items.len());
    }

    pub fn go_to_page(&mut self, page_number: usize) {
        self.page = self.page.with_page_number(page_number, self.items.len());
    }

    pub fn next_page(&mut self) {
        self.page = self.page.next(self.items.len());
    }

    pub fn previous_page(&mut self) {
        self.page = self.page.previous();
    }

    pub fn sorted(&self) -> Vec<&T> {
        sort_refs(&self.items, &self.sort, &self.accessors)
    }

    pub fn rows(&self) -> ViewPage<'_, T> {
        let sorted = self.sorted();
        let page = paginate(&sorted, self.page);
        ViewPage {
            rows: page.rows.to_vec(),
            page_number: page.page_number,
            page_size: page.page_size,
            total_pages: page.total_pages,
            total_items: page.total_items,
        }
    }
}

impl<T> std::fmt::Debug for ListView<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListView")
            .field("items", &self.items.len())
            .field("loaded", &self.loaded)
            .field("error", &self.error)
            .field("sort", &self.sort)
            .field("page", &self.page)
            .field("mounted", &self.mounted)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
