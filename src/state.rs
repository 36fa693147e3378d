use std::sync::Arc;

use crate::color::ColorMap;
use crate::data::filter_space::{DimSpec, FilterSpace};
use crate::data::group::ZeroPolicy;
use crate::data::model::{CellValue, Dataset};
use crate::ui::grid::GridState;

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// How a chart draws its aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    Bar,
    HorizontalBar,
    Line,
    Pie,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Bar,
        ChartKind::HorizontalBar,
        ChartKind::Line,
        ChartKind::Pie,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Bar => "Bar",
            ChartKind::HorizontalBar => "Horizontal bar",
            ChartKind::Line => "Line",
            ChartKind::Pie => "Pie",
        }
    }
}

/// Column selections for one chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartConfig {
    pub dimension: Option<String>,
    pub measure: Option<String>,
    pub kind: ChartKind,
}

impl ChartConfig {
    pub fn title(&self) -> String {
        format!(
            "{} by {}",
            self.measure.as_deref().unwrap_or("?"),
            self.dimension.as_deref().unwrap_or("?")
        )
    }
}

pub const CHART_COUNT: usize = 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardConfig {
    pub charts: [ChartConfig; CHART_COUNT],
    /// Which buckets the charts hide; signed measures use `NonZero`.
    pub zero_policy: ZeroPolicy,
}

impl DashboardConfig {
    /// First numerical column as measure; the first two categorical columns
    /// (or the first one twice) as dimensions.
    pub fn defaults_for(dataset: &Dataset) -> Self {
        let categorical = dataset.schema.categorical();
        let measure = dataset.schema.numerical().first().cloned();
        let first = categorical.first().cloned();
        let second = categorical.get(1).cloned().or_else(|| first.clone());
        Self {
            charts: [
                ChartConfig {
                    dimension: first,
                    measure: measure.clone(),
                    kind: ChartKind::Bar,
                },
                ChartConfig {
                    dimension: second,
                    measure,
                    kind: ChartKind::Pie,
                },
            ],
            zero_policy: ZeroPolicy::default(),
        }
    }

    pub fn dim_specs(&self) -> Vec<DimSpec> {
        self.charts
            .iter()
            .map(|c| DimSpec {
                key_column: c.dimension.clone(),
                measure_column: c.measure.clone(),
            })
            .collect()
    }
}

/// Engine id of the chart at position `index`.
pub fn chart_id(index: usize) -> String {
    format!("chart{}", index + 1)
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<Arc<Dataset>>,

    /// Current chart selections.
    pub config: DashboardConfig,

    /// Engine for the current dataset + selections (None until built).
    pub space: Option<FilterSpace>,

    /// Per-chart key colours, rebuilt with the engine.
    pub colors: Vec<ColorMap>,

    /// Sort state of the row grid.
    pub grid: GridState,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Ingest a newly loaded dataset and reset selections.  The dashboard is
    /// built once the user confirms the configuration.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.config = DashboardConfig::defaults_for(&dataset);
        self.dataset = Some(Arc::new(dataset));
        self.space = None;
        self.colors.clear();
        self.grid = GridState::default();
        self.status_message = None;
    }

    /// Replace the engine with one built from the current selections.
    /// On rejection the previous engine stays in place.
    pub fn rebuild(&mut self) {
        let Some(dataset) = &self.dataset else {
            return;
        };
        let specs = self.config.dim_specs();
        match FilterSpace::build_with_policy(dataset.clone(), &specs, self.config.zero_policy) {
            Ok(space) => {
                self.colors = (0..CHART_COUNT)
                    .map(|i| ColorMap::new(space.keys(&chart_id(i)).unwrap_or_default()))
                    .collect();
                self.space = Some(space);
                self.grid = GridState::default();
                self.status_message = None;
            }
            Err(e) => {
                log::warn!("Dashboard configuration rejected: {e}");
                self.status_message = Some(format!("Please complete the selections: {e}"));
            }
        }
    }

    /// Handle a click on a chart bucket.
    pub fn toggle_filter(&mut self, dim_id: &str, key: CellValue) {
        let Some(space) = &mut self.space else {
            return;
        };
        if let Err(e) = space.toggle_filter(dim_id, key) {
            log::error!("Filter event dropped: {e}");
        }
    }

    pub fn clear_filter(&mut self, dim_id: &str) {
        if let Some(space) = &mut self.space {
            if let Err(e) = space.clear_filter(dim_id) {
                log::error!("Clear event dropped: {e}");
            }
        }
    }

    pub fn reset_filters(&mut self) {
        if let Some(space) = &mut self.space {
            space.clear_all_filters();
        }
    }
}
