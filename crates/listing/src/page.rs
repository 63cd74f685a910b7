/// Requested page. Both fields are kept at 1 or above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    page_number: usize,
    page_size: usize,
}

impl PageSpec {
    pub fn new(page_number: usize, page_size: usize) -> Self {
        Self {
            page_number: page_number.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn first(page_size: usize) -> Self {
        Self::new(1, page_size)
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self, total_items: usize) -> usize {
        total_items.div_ceil(self.page_size).max(1)
    }

    pub fn clamped(self, total_items: usize) -> Self {
        Self {
            page_number: self.page_number.min(self.total_pages(total_items)),
            page_size: self.page_size,
        }
    }

    pub fn next(self, total_items: usize) -> Self {
        Self::new(self.page_number.saturating_add(1), self.page_size).clamped(total_items)
    }

    pub fn previous(self) -> Self {
        Self::new(self.page_number.saturating_sub(1), self.page_size)
    }

    pub fn with_page_number(self, page_number: usize, total_items: usize) -> Self {
        Self::new(page_number, self.page_size).clamped(total_items)
    }

    pub fn with_page_size(self, page_size: usize, total_items: usize) -> Self {
        Self::new(self.page_number, page_size).clamped(total_items)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub rows: &'a [T],
    pub page_number: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<'_, T> {
    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }

    /// `"2 / 5"`, as shown between the pager buttons.
    pub fn indicator(&self) -> String {
        format!("{} / {}", self.page_number, self.total_pages)
    }
}

/// Slices one page out of an already sorted collection. The requested page
/// number is clamped into range first, so the result never claims to be
/// page N of M with N > M.
pub fn paginate<T>(items: &[T], spec: PageSpec) -> Page<'_, T> {
    let spec = spec.clamped(items.len());
    let start = (spec.page_number - 1)
        .saturating_mul(spec.page_size)
        .min(items.len());
    let end = start.saturating_add(spec.page_size).min(items.len());
    Page {
        rows: &items[start..end],
        page_number: spec.page_number,
        page_size: spec.page_size,
        total_pages: spec.total_pages(items.len()),
        total_items: items.len(),
    }
}

#[cfg(test)]
#[path = "tests/page_tests.rs"]
mod tests;
