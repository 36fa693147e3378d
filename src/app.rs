use eframe::egui::{self, Ui};

use crate::color::ColorMap;
use crate::data::model::CellValue;
use crate::state::{chart_id, AppState, CHART_COUNT};
use crate::ui::chart::{aggregate_chart, ChartInput};
use crate::ui::{grid, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CrossdashApp {
    pub state: AppState,
}

impl eframe::App for CrossdashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: chart configuration ----
        egui::SidePanel::left("config_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::config_panel(ui, &mut self.state);
            });

        // ---- Central panel: KPIs, charts, grid ----
        egui::CentralPanel::default().show(ctx, |ui| {
            dashboard(ui, &mut self.state);
        });
    }
}

fn dashboard(ui: &mut Ui, state: &mut AppState) {
    if state.space.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            if state.dataset.is_some() {
                ui.heading("Choose dimensions and measures, then Update dashboard");
            } else {
                ui.heading("Open a file to build a dashboard  (File → Open…)");
            }
        });
        return;
    }

    panels::kpi_strip(ui, state);
    ui.separator();

    // Charts read one snapshot; clicks are applied after both are drawn.
    let mut clicks: Vec<(String, CellValue)> = Vec::new();
    ui.columns(CHART_COUNT, |columns: &mut [Ui]| {
        for (i, col) in columns.iter_mut().enumerate() {
            panels::chart_header(col, state, i);
            let Some(space) = &state.space else {
                continue;
            };
            let id = chart_id(i);
            let entries = space.aggregate(&id).unwrap_or_default();
            let fallback = ColorMap::default();
            let input = ChartInput {
                id: &id,
                measure: space.measure_column(&id).unwrap_or_default(),
                kind: state.config.charts[i].kind,
                entries: &entries,
                active: space.dimension(&id).and_then(|d| d.filter()),
                colors: state.colors.get(i).unwrap_or(&fallback),
            };
            if let Some(key) = aggregate_chart(col, &input) {
                clicks.push((id.clone(), key));
            }
        }
    });
    for (id, key) in clicks {
        log::debug!("Chart {id} clicked on {key}");
        state.toggle_filter(&id, key);
    }

    ui.separator();
    let AppState { space, grid, .. } = state;
    if let Some(space) = space {
        grid::row_grid(ui, space, grid);
    }
}
