use std::cmp::Ordering;

/// Pre-computed comparison key for one cell.
///
/// Two numeric keys compare numerically and two text keys compare
/// case-insensitively. A blank cell is the number zero, so a product without
/// a price sorts with the zero-priced ones. When a column mixes both kinds,
/// numeric keys rank first so the comparator stays a total order.
#[derive(Debug, Clone)]
pub struct SortKey {
    number: Option<f64>,
    folded: String,
}

impl SortKey {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let number = if trimmed.is_empty() {
            Some(0.0)
        } else {
            trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
        };
        Self {
            number,
            folded: raw.to_lowercase(),
        }
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.number, other.number) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.folded.cmp(&other.folded),
        }
    }
}

/// The shared table comparator: numeric when both sides parse as finite
/// numbers (blank counts as zero), case-insensitive text otherwise.
pub fn compare_values(a: &str, b: &str) -> Ordering {
    SortKey::new(a).cmp(&SortKey::new(b))
}
