use std::sync::Arc;

use thiserror::Error;

use super::dimension::Dimension;
use super::group::{Group, GroupEntry, ZeroPolicy};
use super::model::{CellValue, Dataset, TypedRow};

// ---------------------------------------------------------------------------
// Configuration and errors
// ---------------------------------------------------------------------------

/// One (key column, measure column) binding.  `None` or blank means the
/// user has not made a selection yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimSpec {
    pub key_column: Option<String>,
    pub measure_column: Option<String>,
}

impl DimSpec {
    pub fn new(key_column: impl Into<String>, measure_column: impl Into<String>) -> Self {
        Self {
            key_column: Some(key_column.into()),
            measure_column: Some(measure_column.into()),
        }
    }
}

/// Rejected dashboard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no dimensions configured")]
    NoDimensions,
    #[error("chart {chart}: select a dimension column")]
    MissingKeyColumn { chart: usize },
    #[error("chart {chart}: select a measure column")]
    MissingMeasureColumn { chart: usize },
    #[error("column `{0}` does not exist in the dataset")]
    UnknownColumn(String),
    #[error("measure column `{0}` is not numerical")]
    MeasureNotNumerical(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("unknown dimension `{0}`")]
    UnknownDimension(String),
}

/// KPI total for a measure over the filtered rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasureTotal {
    Sum(f64),
    NotApplicable,
}

// ---------------------------------------------------------------------------
// FilterSpace – the cross-filter engine
// ---------------------------------------------------------------------------

/// Owns every Dimension and Group built over one dataset and the derived
/// filtered row set.
///
/// All derived state is recomputed inside each mutating call, so a caller
/// can never observe groups and the filtered rows out of step.  Rebuilding
/// (new data or new column bindings) means constructing a new instance.
#[derive(Debug, Clone)]
pub struct FilterSpace {
    dataset: Arc<Dataset>,
    dimensions: Vec<Dimension>,
    groups: Vec<Group>,
    /// Row indices passing every filter, in store order.
    filtered: Vec<usize>,
    policy: ZeroPolicy,
    generation: u64,
}

impl FilterSpace {
    /// Build with the default [`ZeroPolicy`].
    pub fn build(dataset: Arc<Dataset>, specs: &[DimSpec]) -> Result<Self, ConfigError> {
        Self::build_with_policy(dataset, specs, ZeroPolicy::default())
    }

    /// Validate `specs` and construct one Dimension and Group per spec, with
    /// ids `chart1`, `chart2`, ... in order.
    pub fn build_with_policy(
        dataset: Arc<Dataset>,
        specs: &[DimSpec],
        policy: ZeroPolicy,
    ) -> Result<Self, ConfigError> {
        if specs.is_empty() {
            return Err(ConfigError::NoDimensions);
        }

        let mut bindings = Vec::with_capacity(specs.len());
        for (i, spec) in specs.iter().enumerate() {
            let chart = i + 1;
            let key = selected(&spec.key_column).ok_or(ConfigError::MissingKeyColumn { chart })?;
            let measure = selected(&spec.measure_column)
                .ok_or(ConfigError::MissingMeasureColumn { chart })?;
            bindings.push((key, measure));
        }

        let mut dimensions = Vec::with_capacity(bindings.len());
        let mut measures = Vec::with_capacity(bindings.len());
        for (i, (key, measure)) in bindings.into_iter().enumerate() {
            let key_index = dataset
                .column_index(key)
                .ok_or_else(|| ConfigError::UnknownColumn(key.to_string()))?;
            let measure_index = dataset
                .column_index(measure)
                .ok_or_else(|| ConfigError::UnknownColumn(measure.to_string()))?;
            if !dataset.schema.is_numerical(measure) {
                return Err(ConfigError::MeasureNotNumerical(measure.to_string()));
            }
            dimensions.push(Dimension::new(
                format!("chart{}", i + 1),
                key.to_string(),
                key_index,
            ));
            measures.push((measure.to_string(), measure_index));
        }

        let groups = measures
            .into_iter()
            .enumerate()
            .map(|(i, (column, index))| Group::new(&dataset, &dimensions, i, column, index))
            .collect();

        let mut space = FilterSpace {
            dataset,
            dimensions,
            groups,
            filtered: Vec::new(),
            policy,
            generation: 0,
        };
        space.recompute();
        log::info!(
            "Built filter space over {} rows with dimensions {:?}",
            space.total_count(),
            space
                .dimensions
                .iter()
                .map(Dimension::key_column)
                .collect::<Vec<_>>()
        );
        Ok(space)
    }

    // -- Mutations --

    /// Set `dim_id`'s filter to `key`, replacing any previous value.
    pub fn apply_filter(&mut self, dim_id: &str, key: CellValue) -> Result<(), FilterError> {
        let idx = self.position(dim_id)?;
        self.dimensions[idx].set_filter(key);
        self.recompute();
        Ok(())
    }

    /// Clear `dim_id` if `key` is already its filter, otherwise apply `key`.
    pub fn toggle_filter(&mut self, dim_id: &str, key: CellValue) -> Result<(), FilterError> {
        let idx = self.position(dim_id)?;
        if self.dimensions[idx].filter() == Some(&key) {
            self.dimensions[idx].clear_filter();
        } else {
            self.dimensions[idx].set_filter(key);
        }
        self.recompute();
        Ok(())
    }

    pub fn clear_filter(&mut self, dim_id: &str) -> Result<(), FilterError> {
        let idx = self.position(dim_id)?;
        self.dimensions[idx].clear_filter();
        self.recompute();
        Ok(())
    }

    pub fn clear_all_filters(&mut self) {
        self.dimensions.iter_mut().for_each(Dimension::clear_filter);
        self.recompute();
    }

    /// Full rescan: every group first, then the filtered row set.
    fn recompute(&mut self) {
        let dataset = &self.dataset;
        let dimensions = &self.dimensions;
        for group in &mut self.groups {
            group.compute(dataset, dimensions);
        }

        self.filtered = dataset
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| dimensions.iter().all(|d| d.passes(row)))
            .map(|(i, _)| i)
            .collect();

        self.generation += 1;
        log::debug!(
            "Recomputed generation {}: {}/{} rows pass",
            self.generation,
            self.filtered.len(),
            dataset.len()
        );
    }

    // -- Queries --

    fn position(&self, dim_id: &str) -> Result<usize, FilterError> {
        self.dimensions
            .iter()
            .position(|d| d.id() == dim_id)
            .ok_or_else(|| FilterError::UnknownDimension(dim_id.to_string()))
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn dimension(&self, dim_id: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.id() == dim_id)
    }

    /// Measure column bound to `dim_id`'s group.
    pub fn measure_column(&self, dim_id: &str) -> Option<&str> {
        let idx = self.position(dim_id).ok()?;
        Some(self.groups[idx].measure_column())
    }

    /// Bumped by every build and mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rows passing every active filter, in store order.
    pub fn filtered_rows(&self) -> impl ExactSizeIterator<Item = &TypedRow> + '_ {
        self.filtered.iter().map(move |&i| &self.dataset.rows[i])
    }

    /// Store positions of [`filtered_rows`](Self::filtered_rows).
    pub fn filtered_indices(&self) -> &[usize] {
        &self.filtered
    }

    pub fn total_count(&self) -> usize {
        self.dataset.len()
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    /// Chart-ready buckets for `dim_id`.
    pub fn aggregate(&self, dim_id: &str) -> Result<Vec<GroupEntry>, FilterError> {
        let idx = self.position(dim_id)?;
        Ok(self.groups[idx].top_non_zero(self.policy))
    }

    /// Every key of `dim_id` over the whole store, first-encountered first.
    pub fn keys(&self, dim_id: &str) -> Result<&[CellValue], FilterError> {
        let idx = self.position(dim_id)?;
        Ok(self.groups[idx].keys())
    }

    /// Sum of `column` over the filtered rows, or `NotApplicable` when the
    /// column is not numerical.
    pub fn measure_total(&self, column: &str) -> MeasureTotal {
        if !self.dataset.schema.is_numerical(column) {
            return MeasureTotal::NotApplicable;
        }
        let Some(index) = self.dataset.column_index(column) else {
            return MeasureTotal::NotApplicable;
        };
        MeasureTotal::Sum(self.filtered_rows().map(|row| row.get(index).as_f64()).sum())
    }

    /// [`measure_total`](Self::measure_total) of the first chart's measure.
    pub fn primary_measure_total(&self) -> MeasureTotal {
        match self.groups.first() {
            Some(group) => self.measure_total(group.measure_column()),
            None => MeasureTotal::NotApplicable,
        }
    }
}

fn selected(column: &Option<String>) -> Option<&str> {
    column.as_deref().filter(|c| !c.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::data::model::RawTable;

    fn dataset(columns: &[&str], rows: &[Vec<String>]) -> Arc<Dataset> {
        Arc::new(Dataset::from_raw(RawTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().cloned().map(Some).collect())
                .collect(),
        }))
    }

    fn regions() -> Arc<Dataset> {
        let rows: Vec<Vec<String>> = [("N", "10"), ("N", "20"), ("S", "30"), ("S", "40")]
            .iter()
            .map(|(r, s)| vec![r.to_string(), s.to_string()])
            .collect();
        dataset(&["region", "sales"], &rows)
    }

    fn sales() -> Arc<Dataset> {
        let rows: Vec<Vec<String>> = [
            ("N", "apple", "10"),
            ("N", "pear", "20"),
            ("S", "apple", "30"),
            ("S", "pear", "40"),
            ("E", "apple", "0"),
        ]
        .iter()
        .map(|(r, p, s)| vec![r.to_string(), p.to_string(), s.to_string()])
        .collect();
        dataset(&["region", "product", "sales"], &rows)
    }

    fn two_charts(ds: Arc<Dataset>) -> FilterSpace {
        FilterSpace::build(
            ds,
            &[DimSpec::new("region", "sales"), DimSpec::new("product", "sales")],
        )
        .unwrap()
    }

    fn keys(entries: &[GroupEntry]) -> Vec<String> {
        entries.iter().map(|e| e.key.to_string()).collect()
    }

    #[test]
    fn region_sales_walkthrough() {
        let mut space = FilterSpace::build(regions(), &[DimSpec::new("region", "sales")]).unwrap();
        assert_eq!(
            space.aggregate("chart1").unwrap(),
            vec![
                GroupEntry { key: "S".into(), value: 70.0 },
                GroupEntry { key: "N".into(), value: 30.0 },
            ]
        );

        space.apply_filter("chart1", "N".into()).unwrap();
        assert_eq!(space.filtered_count(), 2);
        assert!(space.filtered_rows().all(|row| row.get(0) == &CellValue::from("N")));
        assert_eq!(space.primary_measure_total(), MeasureTotal::Sum(30.0));
        assert_eq!(space.total_count(), 4);

        space.clear_filter("chart1").unwrap();
        assert_eq!(space.filtered_count(), 4);
    }

    #[test]
    fn categorical_measure_is_rejected() {
        let err = FilterSpace::build(regions(), &[DimSpec::new("region", "region")]).unwrap_err();
        assert_eq!(err, ConfigError::MeasureNotNumerical("region".into()));
    }

    #[test]
    fn missing_selections_are_rejected() {
        let no_key = DimSpec {
            key_column: None,
            measure_column: Some("sales".into()),
        };
        assert_eq!(
            FilterSpace::build(regions(), &[DimSpec::new("region", "sales"), no_key]).unwrap_err(),
            ConfigError::MissingKeyColumn { chart: 2 }
        );

        let blank_measure = DimSpec {
            key_column: Some("region".into()),
            measure_column: Some("  ".into()),
        };
        assert_eq!(
            FilterSpace::build(regions(), &[blank_measure]).unwrap_err(),
            ConfigError::MissingMeasureColumn { chart: 1 }
        );
        assert_eq!(
            FilterSpace::build(regions(), &[]).unwrap_err(),
            ConfigError::NoDimensions
        );
        assert_eq!(
            FilterSpace::build(regions(), &[DimSpec::new("city", "sales")]).unwrap_err(),
            ConfigError::UnknownColumn("city".into())
        );
    }

    #[test]
    fn own_bucket_survives_own_filter() {
        let mut space = two_charts(sales());
        space.apply_filter("chart1", "N".into()).unwrap();

        // region chart still shows every region with product filter unset
        assert_eq!(keys(&space.aggregate("chart1").unwrap()), vec!["S", "N"]);
        // product chart only sees region N
        assert_eq!(
            space.aggregate("chart2").unwrap(),
            vec![
                GroupEntry { key: "pear".into(), value: 20.0 },
                GroupEntry { key: "apple".into(), value: 10.0 },
            ]
        );

        space.apply_filter("chart2", "apple".into()).unwrap();
        let region = space.aggregate("chart1").unwrap();
        assert_eq!(
            region,
            vec![
                GroupEntry { key: "S".into(), value: 30.0 },
                GroupEntry { key: "N".into(), value: 10.0 },
            ]
        );
        assert_eq!(space.filtered_count(), 1);
    }

    #[test]
    fn zero_buckets_are_hidden() {
        let space = two_charts(sales());
        assert!(!keys(&space.aggregate("chart1").unwrap()).contains(&"E".to_string()));
        // E still passes the filters and counts as a row
        assert_eq!(space.filtered_count(), 5);
    }

    #[test]
    fn non_zero_policy_keeps_negative_buckets() {
        let rows: Vec<Vec<String>> = [("a", "-5"), ("b", "3"), ("c", "0")]
            .iter()
            .map(|(k, v)| vec![k.to_string(), v.to_string()])
            .collect();
        let ds = dataset(&["k", "v"], &rows);

        let default = FilterSpace::build(ds.clone(), &[DimSpec::new("k", "v")]).unwrap();
        assert_eq!(keys(&default.aggregate("chart1").unwrap()), vec!["b"]);

        let signed =
            FilterSpace::build_with_policy(ds, &[DimSpec::new("k", "v")], ZeroPolicy::NonZero)
                .unwrap();
        assert_eq!(keys(&signed.aggregate("chart1").unwrap()), vec!["b", "a"]);
    }

    #[test]
    fn toggle_clears_active_value() {
        let mut space = two_charts(sales());
        space.toggle_filter("chart1", "S".into()).unwrap();
        assert_eq!(space.filtered_count(), 2);
        space.toggle_filter("chart1", "N".into()).unwrap();
        assert_eq!(space.dimension("chart1").unwrap().filter(), Some(&CellValue::from("N")));
        space.toggle_filter("chart1", "N".into()).unwrap();
        assert_eq!(space.dimension("chart1").unwrap().filter(), None);
        assert_eq!(space.filtered_count(), 5);
    }

    #[test]
    fn unknown_dimension_leaves_state_alone() {
        let mut space = two_charts(sales());
        let generation = space.generation();
        assert_eq!(
            space.apply_filter("chart9", "N".into()),
            Err(FilterError::UnknownDimension("chart9".into()))
        );
        assert!(space.clear_filter("nope").is_err());
        assert!(space.aggregate("nope").is_err());
        assert_eq!(space.generation(), generation);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut space = two_charts(sales());
        space.apply_filter("chart1", "S".into()).unwrap();
        space.apply_filter("chart2", "pear".into()).unwrap();

        space.clear_all_filters();
        let once: Vec<usize> = space.filtered_indices().to_vec();
        space.clear_all_filters();
        assert_eq!(space.filtered_indices(), once.as_slice());
        assert_eq!(once, (0..5).collect::<Vec<_>>());
    }

    #[test]
    fn measure_total_reports_not_applicable() {
        let space = two_charts(sales());
        assert_eq!(space.measure_total("region"), MeasureTotal::NotApplicable);
        assert_eq!(space.measure_total("missing"), MeasureTotal::NotApplicable);
        assert_eq!(space.measure_total("sales"), MeasureTotal::Sum(100.0));
    }

    #[test]
    fn missing_keys_form_their_own_bucket() {
        let ds = Arc::new(Dataset::from_raw(RawTable {
            columns: vec!["k".into(), "v".into()],
            rows: vec![
                vec![Some("a".into()), Some("1".into())],
                vec![None, Some("4".into())],
            ],
        }));
        let mut space = FilterSpace::build(ds, &[DimSpec::new("k", "v")]).unwrap();
        let top = space.aggregate("chart1").unwrap();
        assert_eq!(top[0].key, CellValue::Missing);
        space.apply_filter("chart1", CellValue::Missing).unwrap();
        assert_eq!(space.filtered_indices(), &[1]);
    }

    // -- Properties --

    fn arb_rows() -> impl Strategy<Value = Vec<(u8, u8, i32)>> {
        prop::collection::vec((0u8..4, 0u8..3, -20i32..100), 0..40)
    }

    fn arb_dataset(rows: &[(u8, u8, i32)]) -> Arc<Dataset> {
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|(r, p, s)| vec![format!("r{r}"), format!("p{p}"), s.to_string()])
            .collect();
        // a leading numeric row keeps `sales` numerical for any generated data
        let mut all = vec![vec!["r0".to_string(), "p0".to_string(), "0".to_string()]];
        all.extend(rows);
        dataset(&["region", "product", "sales"], &all)
    }

    proptest! {
        #[test]
        fn filters_compose_by_intersection(rows in arb_rows(), a in 0u8..4, b in 0u8..3) {
            let ds = arb_dataset(&rows);
            let region: CellValue = format!("r{a}").as_str().into();
            let product: CellValue = format!("p{b}").as_str().into();

            let mut forward = two_charts(ds.clone());
            forward.apply_filter("chart1", region.clone()).unwrap();
            forward.apply_filter("chart2", product.clone()).unwrap();

            let mut backward = two_charts(ds.clone());
            backward.apply_filter("chart2", product.clone()).unwrap();
            backward.apply_filter("chart1", region.clone()).unwrap();

            let expected: Vec<usize> = ds
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| row.get(0) == &region && row.get(1) == &product)
                .map(|(i, _)| i)
                .collect();
            prop_assert_eq!(forward.filtered_indices(), expected.as_slice());
            prop_assert_eq!(backward.filtered_indices(), expected.as_slice());
            prop_assert_eq!(forward.aggregate("chart1").unwrap(), backward.aggregate("chart1").unwrap());
        }

        #[test]
        fn replay_is_deterministic(rows in arb_rows(), ops in prop::collection::vec((0u8..3, 0u8..4), 0..12)) {
            let ds = arb_dataset(&rows);
            let run = || {
                let mut space = two_charts(ds.clone());
                for (op, v) in &ops {
                    match op {
                        0 => space.apply_filter("chart1", format!("r{v}").as_str().into()).unwrap(),
                        1 => space.toggle_filter("chart2", format!("p{}", v % 3).as_str().into()).unwrap(),
                        _ => space.clear_all_filters(),
                    }
                }
                (
                    space.filtered_indices().to_vec(),
                    space.aggregate("chart1").unwrap(),
                    space.aggregate("chart2").unwrap(),
                )
            };
            prop_assert_eq!(run(), run());
        }

        #[test]
        fn aggregates_match_cross_filtered_sums(rows in arb_rows(), a in 0u8..4) {
            let ds = arb_dataset(&rows);
            let mut space = two_charts(ds.clone());
            let region: CellValue = format!("r{a}").as_str().into();
            space.apply_filter("chart1", region.clone()).unwrap();

            for entry in space.aggregate("chart2").unwrap() {
                let expected: f64 = ds
                    .rows
                    .iter()
                    .filter(|row| row.get(0) == &region && row.get(1) == &entry.key)
                    .map(|row| row.get(2).as_f64())
                    .sum();
                prop_assert!(entry.value > 0.0);
                prop_assert_eq!(entry.value, expected);
            }
            // the region chart ignores its own filter
            let own: f64 = space.aggregate("chart1").unwrap().iter().map(|e| e.value).sum();
            let positive: f64 = {
                let mut unfiltered = two_charts(ds.clone());
                unfiltered.clear_all_filters();
                unfiltered.aggregate("chart1").unwrap().iter().map(|e| e.value).sum()
            };
            prop_assert_eq!(own, positive);
        }
    }
}
