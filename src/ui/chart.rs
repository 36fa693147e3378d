use std::f64::consts::TAU;

use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points, Polygon};

use crate::color::{ColorMap, ACTIVE_COLOR, SERIES_COLOR};
use crate::data::group::GroupEntry;
use crate::data::model::CellValue;
use crate::state::ChartKind;

// ---------------------------------------------------------------------------
// Aggregate chart
// ---------------------------------------------------------------------------

const BAR_WIDTH: f64 = 0.7;
const CHART_HEIGHT: f32 = 280.0;
const PIE_SEGMENTS_PER_TURN: f64 = 120.0;

/// Everything a chart needs from the engine for one frame.
pub struct ChartInput<'a> {
    pub id: &'a str,
    pub measure: &'a str,
    pub kind: ChartKind,
    pub entries: &'a [GroupEntry],
    pub active: Option<&'a CellValue>,
    pub colors: &'a ColorMap,
}

/// Draw one aggregate chart.  Returns the key of a clicked bucket.
pub fn aggregate_chart(ui: &mut Ui, input: &ChartInput<'_>) -> Option<CellValue> {
    if input.entries.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No data under the current filters.");
        });
        return None;
    }

    let labels: Vec<String> = input.entries.iter().map(|e| e.key.to_string()).collect();
    let mut plot = Plot::new(input.id)
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false);

    plot = match input.kind {
        ChartKind::Bar | ChartKind::Line => {
            let axis_labels = labels.clone();
            plot.x_axis_formatter(move |mark, _range| category_label(&axis_labels, mark.value))
                .y_axis_label(input.measure)
        }
        ChartKind::HorizontalBar => {
            let axis_labels = labels.clone();
            plot.y_axis_formatter(move |mark, _range| category_label(&axis_labels, mark.value))
                .x_axis_label(input.measure)
        }
        ChartKind::Pie => plot
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .legend(Legend::default()),
    };

    let response = plot.show(ui, |plot_ui| {
        match input.kind {
            ChartKind::Bar | ChartKind::HorizontalBar => {
                let bars = input
                    .entries
                    .iter()
                    .enumerate()
                    .map(|(i, e)| {
                        Bar::new(i as f64, e.value)
                            .name(&labels[i])
                            .width(BAR_WIDTH)
                            .fill(fill_for(input, &e.key, SERIES_COLOR))
                    })
                    .collect();
                let mut chart = BarChart::new(bars).name(input.measure);
                if input.kind == ChartKind::HorizontalBar {
                    chart = chart.horizontal();
                }
                plot_ui.bar_chart(chart);
            }
            ChartKind::Line => {
                let points: PlotPoints = input
                    .entries
                    .iter()
                    .enumerate()
                    .map(|(i, e)| [i as f64, e.value])
                    .collect();
                plot_ui.line(Line::new(points).color(SERIES_COLOR).width(2.0).name(input.measure));
                for (i, e) in input.entries.iter().enumerate() {
                    let marker = Points::new(PlotPoints::from(vec![[i as f64, e.value]]))
                        .radius(4.0)
                        .color(fill_for(input, &e.key, SERIES_COLOR));
                    plot_ui.points(marker);
                }
            }
            ChartKind::Pie => {
                let total: f64 = input.entries.iter().map(|e| e.value).sum();
                let mut start = 0.0;
                for (i, e) in input.entries.iter().enumerate() {
                    let sweep = e.value / total * TAU;
                    let slice = Polygon::new(wedge(start, sweep))
                        .name(&labels[i])
                        .fill_color(fill_for(input, &e.key, input.colors.color_for(&e.key)))
                        .stroke(Stroke::new(2.0, Color32::WHITE));
                    plot_ui.polygon(slice);
                    start += sweep;
                }
            }
        }
        plot_ui.pointer_coordinate()
    });

    if !response.response.clicked() {
        return None;
    }
    let point = response.inner?;
    resolve_click(input.kind, input.entries, [point.x, point.y])
        .map(|i| input.entries[i].key.clone())
}

fn fill_for(input: &ChartInput<'_>, key: &CellValue, base: Color32) -> Color32 {
    match input.active {
        Some(active) if active == key => ACTIVE_COLOR,
        Some(_) => base.gamma_multiply(0.45),
        None => base,
    }
}

fn category_label(labels: &[String], value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Pie slice polygon starting at 12 o'clock, running clockwise.
fn wedge(start: f64, sweep: f64) -> PlotPoints<'static> {
    let steps = ((sweep / TAU) * PIE_SEGMENTS_PER_TURN).ceil().max(1.0) as usize;
    let mut points = vec![[0.0, 0.0]];
    for s in 0..=steps {
        let angle = start + sweep * s as f64 / steps as f64;
        points.push([angle.sin(), angle.cos()]);
    }
    PlotPoints::from(points)
}

/// Map a click in plot coordinates to the index of the bucket under it.
pub fn resolve_click(kind: ChartKind, entries: &[GroupEntry], point: [f64; 2]) -> Option<usize> {
    let [x, y] = point;
    match kind {
        ChartKind::Bar | ChartKind::HorizontalBar => {
            let (along, across) = if kind == ChartKind::Bar { (x, y) } else { (y, x) };
            let idx = along.round();
            if idx < 0.0 || (along - idx).abs() > BAR_WIDTH / 2.0 {
                return None;
            }
            let entry = entries.get(idx as usize)?;
            let (lo, hi) = if entry.value >= 0.0 { (0.0, entry.value) } else { (entry.value, 0.0) };
            (lo..=hi).contains(&across).then_some(idx as usize)
        }
        ChartKind::Line => {
            let idx = x.round();
            if idx < 0.0 {
                return None;
            }
            let idx = idx as usize;
            (idx < entries.len()).then_some(idx)
        }
        ChartKind::Pie => {
            if x * x + y * y > 1.0 {
                return None;
            }
            let total: f64 = entries.iter().map(|e| e.value).sum();
            if total <= 0.0 {
                return None;
            }
            // clockwise from 12 o'clock, as drawn by `wedge`
            let angle = x.atan2(y).rem_euclid(TAU);
            let mut start = 0.0;
            for (i, e) in entries.iter().enumerate() {
                let end = start + e.value / total * TAU;
                if angle < end {
                    return Some(i);
                }
                start = end;
            }
            entries.len().checked_sub(1)
        }
    }
}
