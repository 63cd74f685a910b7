use std::{cmp::Ordering, collections::HashMap, hash::Hash};

use shared::{
    domain::ProductId,
    protocol::{InventoryRecord, Product},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a, K, T, A> {
    pub key: K,
    /// First record seen for this key, kept as the group's representative.
    pub first: &'a T,
    pub count: usize,
    pub total: A,
}

/// Groups `items` by `key_fn`, folds each group with `reducer` starting from
/// `A::default()`, and returns the groups by descending total. Records whose
/// key is `None` are skipped. Equal totals keep first-seen order.
///
/// Reducers must not produce NaN; a NaN total has no place in the ordering.
pub fn aggregate_by_key<'a, T, K, A, KF, RF>(
    items: &'a [T],
    key_fn: KF,
    reducer: RF,
) -> Vec<Group<'a, K, T, A>>
where
    K: Eq + Hash + Clone,
    A: Default + PartialOrd,
    KF: Fn(&T) -> Option<K>,
    RF: Fn(A, &T) -> A,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Group<'a, K, T, A>> = Vec::new();

    for item in items {
        let Some(key) = key_fn(item) else {
            continue;
        };
        let slot = *slots.entry(key.clone()).or_insert_with(|| {
            groups.push(Group {
                key,
                first: item,
                count: 0,
                total: A::default(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.count += 1;
        group.total = reducer(std::mem::take(&mut group.total), item);
    }

    groups.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));
    groups
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductTotal {
    pub product: Product,
    pub total: i64,
    pub locations: usize,
}

impl ProductTotal {
    pub fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// A product without a price is worth nothing.
    pub fn unit_price(&self) -> f64 {
        self.product.price.unwrap_or(0.0)
    }

    pub fn value(&self) -> f64 {
        let value = self.total as f64 * self.unit_price();
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

/// Stock per product summed across every warehouse, largest first.
pub fn consolidate_by_product(inventory: &[InventoryRecord]) -> Vec<ProductTotal> {
    aggregate_by_key(
        inventory,
        |record| record.product.as_ref().map(|p| p.id),
        |sum: i64, record| sum.saturating_add(record.stock_level.unwrap_or(0)),
    )
    .into_iter()
    .filter_map(|group| {
        group.first.product.clone().map(|product| ProductTotal {
            product,
            total: group.total,
            locations: group.count,
        })
    })
    .collect()
}

#[cfg(test)]
#[path = "tests/aggregate_tests.rs"]
mod tests;
