use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::filter_space::MeasureTotal;
use crate::data::group::ZeroPolicy;
use crate::data::model::Dataset;
use crate::state::{chart_id, AppState, ChartKind, CHART_COUNT};

// ---------------------------------------------------------------------------
// Left side panel – dashboard configuration
// ---------------------------------------------------------------------------

/// Render the configuration panel: dimension / measure / chart type per chart.
pub fn config_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Configuration");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    let mut changed = false;
    for i in 0..CHART_COUNT {
        ui.strong(format!("Chart {}", i + 1));
        changed |= chart_selectors(ui, state, &dataset, i);
        ui.add_space(6.0);
    }

    let mut show_negative = state.config.zero_policy == ZeroPolicy::NonZero;
    if ui
        .checkbox(&mut show_negative, "Show negative sums")
        .on_hover_text("Keep buckets whose sum is below zero; empty buckets stay hidden")
        .changed()
    {
        state.config.zero_policy = if show_negative {
            ZeroPolicy::NonZero
        } else {
            ZeroPolicy::PositiveOnly
        };
        changed = true;
    }

    ui.separator();
    let update = ui.button("Update dashboard").clicked();

    // Any change while data is loaded rebuilds, like the explicit button.
    if changed || update {
        state.rebuild();
    }
}

fn chart_selectors(ui: &mut Ui, state: &mut AppState, dataset: &Dataset, i: usize) -> bool {
    let chart = &mut state.config.charts[i];
    let mut changed = false;

    egui::Grid::new(("chart_config", i))
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            ui.label("Dimension");
            changed |= column_combo(ui, ("dim", i), &mut chart.dimension, dataset.schema.categorical());
            ui.end_row();

            ui.label("Measure");
            changed |= column_combo(ui, ("measure", i), &mut chart.measure, dataset.schema.numerical());
            ui.end_row();

            ui.label("Type");
            egui::ComboBox::from_id_salt(("kind", i))
                .selected_text(chart.kind.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for kind in ChartKind::ALL {
                        changed |= ui
                            .selectable_value(&mut chart.kind, kind, kind.label())
                            .changed();
                    }
                });
            ui.end_row();
        });

    changed
}

fn column_combo(
    ui: &mut Ui,
    salt: impl std::hash::Hash,
    current: &mut Option<String>,
    options: &[String],
) -> bool {
    let mut changed = false;
    egui::ComboBox::from_id_salt(salt)
        .selected_text(current.as_deref().unwrap_or("—"))
        .show_ui(ui, |ui: &mut Ui| {
            for col in options {
                let is_current = current.as_deref() == Some(col.as_str());
                if ui.selectable_label(is_current, col).clicked() && !is_current {
                    *current = Some(col.clone());
                    changed = true;
                }
            }
        });
    changed
}

// ---------------------------------------------------------------------------
// KPI strip
// ---------------------------------------------------------------------------

/// Total records, filtered records and the primary measure's total.
pub fn kpi_strip(ui: &mut Ui, state: &AppState) {
    let Some(space) = &state.space else {
        return;
    };
    let primary = space.measure_column("chart1").unwrap_or_default();

    ui.horizontal(|ui: &mut Ui| {
        kpi_card(ui, "Total records", &format_count(space.total_count()));
        kpi_card(ui, "Filtered records", &format_count(space.filtered_count()));
        match space.primary_measure_total() {
            MeasureTotal::Sum(total) => {
                kpi_card(ui, &format!("Total {primary}"), &format_total(total))
            }
            MeasureTotal::NotApplicable => kpi_card(ui, "Total Value", "N/A"),
        }
    });
}

fn kpi_card(ui: &mut Ui, title: &str, value: &str) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_min_width(160.0);
        ui.vertical(|ui: &mut Ui| {
            ui.label(RichText::new(title).small());
            ui.label(RichText::new(value).heading().strong());
        });
    });
}

/// Group digits by thousands: `1234567` → `1,234,567`.
pub fn format_count(n: usize) -> String {
    group_thousands(&n.to_string())
}

/// Round to a whole number and group digits: `-1234.6` → `-1,235`.
pub fn format_total(value: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "NaN".to_string()
        } else if value > 0.0 {
            "∞".to_string()
        } else {
            "-∞".to_string()
        };
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}{}", group_thousands(&digits))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!("{} rows, {} columns", ds.len(), ds.columns.len()));
        }

        if state.space.is_some() {
            ui.separator();
            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

/// Per-chart header: title, active filter chip, JSON export.
pub fn chart_header(ui: &mut Ui, state: &mut AppState, i: usize) {
    let id = chart_id(i);
    let title = state.config.charts[i].title();
    ui.horizontal(|ui: &mut Ui| {
        ui.strong(title);
        let Some(space) = &state.space else {
            return;
        };
        if let Some(active) = space.dimension(&id).and_then(|d| d.filter()) {
            if ui.small_button(format!("{active} ✖")).clicked() {
                state.clear_filter(&id);
                return;
            }
        }
        if ui.small_button("Copy as JSON").clicked() {
            match space.aggregate(&id).map(|entries| serde_json::to_string_pretty(&entries)) {
                Ok(Ok(json)) => ui.ctx().copy_text(json),
                Ok(Err(e)) => log::error!("Failed to serialise {id}: {e}"),
                Err(e) => log::error!("Failed to export {id}: {e}"),
            }
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open tabular data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(raw) => {
                let dataset = Dataset::from_raw(raw);
                log::info!(
                    "Loaded {} rows; categorical {:?}, numerical {:?}",
                    dataset.len(),
                    dataset.schema.categorical(),
                    dataset.schema.numerical()
                );
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
