use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::filter_space::FilterSpace;
use crate::data::model::CellValue;

// ---------------------------------------------------------------------------
// Grid sort state
// ---------------------------------------------------------------------------

/// View-side sort of the filtered rows.  The sorted order is cached per
/// engine generation and thrown away whenever the filters change.
#[derive(Debug, Clone, Default)]
pub struct GridState {
    /// (column index, ascending)
    sort: Option<(usize, bool)>,
    order: Vec<usize>,
    cached: Option<(u64, Option<(usize, bool)>)>,
}

impl GridState {
    /// Click on a header: first ascending, then flip direction.
    pub fn sort_by(&mut self, column: usize) {
        self.sort = match self.sort {
            Some((col, ascending)) if col == column => Some((col, !ascending)),
            _ => Some((column, true)),
        };
    }

    pub fn sort(&self) -> Option<(usize, bool)> {
        self.sort
    }

    /// Store indices of the filtered rows in display order.
    pub fn rows(&mut self, space: &FilterSpace) -> &[usize] {
        let key = (space.generation(), self.sort);
        if self.cached != Some(key) {
            self.order = space.filtered_indices().to_vec();
            if let Some((col, ascending)) = self.sort {
                let rows = &space.dataset().rows;
                // stable, so equal cells keep source order
                self.order.sort_by(|&a, &b| {
                    let ord = rows[a].get(col).display_cmp(rows[b].get(col));
                    if ascending { ord } else { ord.reverse() }
                });
            }
            self.cached = Some(key);
        }
        &self.order
    }
}

// ---------------------------------------------------------------------------
// Row grid
// ---------------------------------------------------------------------------

const ROW_HEIGHT: f32 = 20.0;

/// Render the filtered rows as a sortable table.
pub fn row_grid(ui: &mut Ui, space: &FilterSpace, grid: &mut GridState) {
    let dataset = space.dataset().clone();
    let n_cols = dataset.columns.len();
    if n_cols == 0 {
        ui.label("Dataset has no columns.");
        return;
    }

    let sort = grid.sort();
    let mut clicked_header = None;
    let order = grid.rows(space).to_vec();

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto().at_least(60.0).clip(true), n_cols)
        .min_scrolled_height(0.0)
        .header(ROW_HEIGHT, |mut header| {
            for (idx, name) in dataset.columns.iter().enumerate() {
                header.col(|ui| {
                    let arrow = match sort {
                        Some((col, true)) if col == idx => " ⏶",
                        Some((col, false)) if col == idx => " ⏷",
                        _ => "",
                    };
                    if ui.button(format!("{name}{arrow}")).clicked() {
                        clicked_header = Some(idx);
                    }
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, order.len(), |mut row| {
                let record = &dataset.rows[order[row.index()]];
                for idx in 0..n_cols {
                    row.col(|ui| {
                        ui.label(cell_text(record.get(idx)));
                    });
                }
            });
        });

    if let Some(idx) = clicked_header {
        grid.sort_by(idx);
    }
}

fn cell_text(value: &CellValue) -> String {
    match value {
        CellValue::Missing => String::new(),
        other => other.to_string(),
    }
}
