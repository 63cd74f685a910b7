use std::borrow::Cow;

use crate::compare::SortKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Header-click behavior: the same field flips direction, a different
    /// field starts ascending.
    pub fn toggle(&mut self, field: &str) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field.to_string();
            self.direction = SortDirection::Ascending;
        }
    }

    pub fn toggled(&self, field: &str) -> Self {
        let mut next = self.clone();
        next.toggle(field);
        next
    }
}

pub type Accessor<T> = fn(&T) -> Cow<'_, str>;

fn empty_cell<T>(_: &T) -> Cow<'_, str> {
    Cow::Borrowed("")
}

/// Named field accessors for one record type. Lookups for unknown fields
/// resolve to the default field.
pub struct Accessors<T> {
    default_field: &'static str,
    fields: Vec<(&'static str, Accessor<T>)>,
}

impl<T> Accessors<T> {
    pub fn new(default_field: &'static str, accessor: Accessor<T>) -> Self {
        Self {
            default_field,
            fields: vec![(default_field, accessor)],
        }
    }

    pub fn with(mut self, field: &'static str, accessor: Accessor<T>) -> Self {
        self.fields.retain(|(name, _)| *name != field);
        self.fields.push((field, accessor));
        self
    }

    pub fn default_field(&self) -> &'static str {
        self.default_field
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| *name == field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    pub fn resolve(&self, field: &str) -> Accessor<T> {
        let lookup = |wanted: &str| {
            self.fields
                .iter()
                .find(|(name, _)| *name == wanted)
                .map(|(_, accessor)| *accessor)
        };
        lookup(field)
            .or_else(|| lookup(self.default_field))
            .unwrap_or(empty_cell::<T>)
    }

    /// Reads one cell as text, the way the sort comparator sees it.
    pub fn read<'a>(&self, field: &str, item: &'a T) -> Cow<'a, str> {
        (self.resolve(field))(item)
    }
}

impl<T> std::fmt::Debug for Accessors<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accessors")
            .field("default_field", &self.default_field)
            .field("fields", &self.field_names().collect::<Vec<_>>())
            .finish()
    }
}

fn sorted_indices<T>(items: &[T], spec: &SortSpec, accessors: &Accessors<T>) -> Vec<usize> {
    let accessor = accessors.resolve(&spec.field);
    let keys: Vec<SortKey> = items.iter().map(|item| SortKey::new(&accessor(item))).collect();
    let mut order: Vec<usize> = (0..items.len()).collect();
    // `sort_by` is stable, so equal keys keep their source order in both directions.
    order.sort_by(|&a, &b| {
        let ordering = keys[a].cmp(&keys[b]);
        match spec.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    order
}

/// Returns a sorted copy of `items`; the source slice is left untouched.
pub fn sort<T: Clone>(items: &[T], spec: &SortSpec, accessors: &Accessors<T>) -> Vec<T> {
    sorted_indices(items, spec, accessors)
        .into_iter()
        .map(|idx| items[idx].clone())
        .collect()
}

pub fn sort_refs<'a, T>(items: &'a [T], spec: &SortSpec, accessors: &Accessors<T>) -> Vec<&'a T> {
    sorted_indices(items, spec, accessors)
        .into_iter()
        .map(|idx| &items[idx])
        .collect()
}

#[cfg(test)]
#[path = "tests/sort_tests.rs"]
mod tests;
