use std::collections::HashMap;

use serde::Serialize;

use super::dimension::Dimension;
use super::model::{CellValue, Dataset};

// ---------------------------------------------------------------------------
// Zero policy
// ---------------------------------------------------------------------------

/// Which aggregate buckets are dropped from chart output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroPolicy {
    /// Keep strictly positive sums only (negative sums are dropped as well).
    #[default]
    PositiveOnly,
    /// Drop sums that are exactly zero.
    NonZero,
}

impl ZeroPolicy {
    fn keeps(self, value: f64) -> bool {
        match self {
            ZeroPolicy::PositiveOnly => value > 0.0,
            ZeroPolicy::NonZero => value != 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// GroupEntry
// ---------------------------------------------------------------------------

/// One chart bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupEntry {
    pub key: CellValue,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Group – sum of a measure per dimension key
// ---------------------------------------------------------------------------

/// Sum of one measure column per key of its owning dimension, restricted to
/// rows that pass every *other* dimension's filter.
#[derive(Debug, Clone)]
pub struct Group {
    dimension: usize,
    measure_column: String,
    measure_index: usize,
    /// Every key in first-encountered order over the whole store.
    keys: Vec<CellValue>,
    slots: HashMap<CellValue, usize>,
    sums: Vec<f64>,
}

impl Group {
    /// Index the distinct keys of `dimensions[dimension]` over all rows.
    pub(crate) fn new(
        dataset: &Dataset,
        dimensions: &[Dimension],
        dimension: usize,
        measure_column: String,
        measure_index: usize,
    ) -> Self {
        let dim = &dimensions[dimension];
        let mut keys = Vec::new();
        let mut slots = HashMap::new();
        for row in &dataset.rows {
            let key = dim.key_of(row);
            if !slots.contains_key(key) {
                slots.insert(key.clone(), keys.len());
                keys.push(key.clone());
            }
        }
        let sums = vec![0.0; keys.len()];
        Self {
            dimension,
            measure_column,
            measure_index,
            keys,
            slots,
            sums,
        }
    }

    pub fn measure_column(&self) -> &str {
        &self.measure_column
    }

    /// Rescan all rows, accumulating the measure under each row's key when
    /// every dimension other than the owning one passes.
    pub(crate) fn compute(&mut self, dataset: &Dataset, dimensions: &[Dimension]) {
        self.sums.iter_mut().for_each(|s| *s = 0.0);
        let own = &dimensions[self.dimension];
        for row in &dataset.rows {
            let others_pass = dimensions
                .iter()
                .enumerate()
                .all(|(i, d)| i == self.dimension || d.passes(row));
            if !others_pass {
                continue;
            }
            if let Some(&slot) = self.slots.get(own.key_of(row)) {
                self.sums[slot] += row.get(self.measure_index).as_f64();
            }
        }
    }

    /// Distinct keys in first-encountered order.
    pub fn keys(&self) -> &[CellValue] {
        &self.keys
    }

    /// Entries sorted by descending sum, ties in first-encountered key order,
    /// with buckets rejected by `policy` left out.
    pub fn top_non_zero(&self, policy: ZeroPolicy) -> Vec<GroupEntry> {
        let mut entries: Vec<GroupEntry> = self
            .keys
            .iter()
            .zip(&self.sums)
            .filter(|(_, value)| policy.keeps(**value))
            .map(|(key, &value)| GroupEntry {
                key: key.clone(),
                value,
            })
            .collect();
        // sort_by is stable, so equal sums keep key order
        entries.sort_by(|a, b| b.value.total_cmp(&a.value));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::RawTable;

    fn dataset() -> Dataset {
        let rows = [
            ["B", "x", "5"],
            ["A", "y", "5"],
            ["C", "x", "0"],
            ["D", "y", "-3"],
            ["A", "x", "2"],
        ];
        Dataset::from_raw(RawTable {
            columns: vec!["k".into(), "other".into(), "m".into()],
            rows: rows
                .iter()
                .map(|r| r.iter().map(|v| Some(v.to_string())).collect())
                .collect(),
        })
    }

    fn dims() -> Vec<Dimension> {
        vec![
            Dimension::new("chart1".into(), "k".into(), 0),
            Dimension::new("chart2".into(), "other".into(), 1),
        ]
    }

    #[test]
    fn sorted_descending_without_filters() {
        let ds = dataset();
        let dims = dims();
        let mut group = Group::new(&ds, &dims, 0, "m".into(), 2);
        group.compute(&ds, &dims);

        let top = group.top_non_zero(ZeroPolicy::PositiveOnly);
        let keys: Vec<String> = top.iter().map(|e| e.key.to_string()).collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(top[0].value, 7.0);

        // Only "y" rows remain for the other dimension: B drops to zero
        let mut dims = dims;
        dims[1].set_filter("y".into());
        group.compute(&ds, &dims);
        let top = group.top_non_zero(ZeroPolicy::PositiveOnly);
        assert_eq!(top, vec![GroupEntry { key: "A".into(), value: 5.0 }]);
    }

    #[test]
    fn ties_keep_first_encountered_order() {
        let tie = Dataset::from_raw(RawTable {
            columns: vec!["k".into(), "other".into(), "m".into()],
            rows: [["Q", "x", "4"], ["P", "x", "4"], ["Q", "y", "0"]]
                .iter()
                .map(|r| r.iter().map(|v| Some(v.to_string())).collect())
                .collect(),
        });
        let dims = dims();
        let mut group = Group::new(&tie, &dims, 0, "m".into(), 2);
        group.compute(&tie, &dims);
        let keys: Vec<String> = group
            .top_non_zero(ZeroPolicy::PositiveOnly)
            .iter()
            .map(|e| e.key.to_string())
            .collect();
        assert_eq!(keys, vec!["Q", "P"]);
    }

    #[test]
    fn own_filter_is_ignored() {
        let ds = dataset();
        let mut dims = dims();
        dims[0].set_filter("A".into());
        let mut group = Group::new(&ds, &dims, 0, "m".into(), 2);
        group.compute(&ds, &dims);
        let top = group.top_non_zero(ZeroPolicy::PositiveOnly);
        assert_eq!(
            top,
            vec![
                GroupEntry { key: "A".into(), value: 7.0 },
                GroupEntry { key: "B".into(), value: 5.0 },
            ]
        );
    }

    #[test]
    fn zero_policy_controls_negative_buckets() {
        let ds = dataset();
        let dims = dims();
        let mut group = Group::new(&ds, &dims, 0, "m".into(), 2);
        group.compute(&ds, &dims);

        let positive = group.top_non_zero(ZeroPolicy::PositiveOnly);
        assert!(positive.iter().all(|e| e.value > 0.0));

        let non_zero = group.top_non_zero(ZeroPolicy::NonZero);
        assert_eq!(non_zero.last().map(|e| e.value), Some(-3.0));
        assert!(non_zero.iter().all(|e| e.key != CellValue::from("C")));
    }

    #[test]
    fn groups_by_second_dimension() {
        let ds = dataset();
        let dims = dims();
        let mut group = Group::new(&ds, &dims, 1, "m".into(), 2);
        group.compute(&ds, &dims);
        // x: 5 + 0 + 2 = 7, y: 5 - 3 = 2
        let top = group.top_non_zero(ZeroPolicy::PositiveOnly);
        assert_eq!(
            top,
            vec![
                GroupEntry { key: "x".into(), value: 7.0 },
                GroupEntry { key: "y".into(), value: 2.0 },
            ]
        );
    }
}
