use super::model::{CellValue, TypedRow};

// ---------------------------------------------------------------------------
// Dimension – one filterable projection of the row store
// ---------------------------------------------------------------------------

/// A named projection along one key column holding at most one equality
/// filter.  Mutated only through [`FilterSpace`](super::filter_space::FilterSpace).
#[derive(Debug, Clone)]
pub struct Dimension {
    id: String,
    key_column: String,
    key_index: usize,
    filter: Option<CellValue>,
}

impl Dimension {
    pub(crate) fn new(id: String, key_column: String, key_index: usize) -> Self {
        Self {
            id,
            key_column,
            key_index,
            filter: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// The row's key for this dimension.
    pub fn key_of<'r>(&self, row: &'r TypedRow) -> &'r CellValue {
        row.get(self.key_index)
    }

    /// Currently active filter value, if any.
    pub fn filter(&self) -> Option<&CellValue> {
        self.filter.as_ref()
    }

    /// Replaces any previous value.
    pub(crate) fn set_filter(&mut self, value: CellValue) {
        self.filter = Some(value);
    }

    pub(crate) fn clear_filter(&mut self) {
        self.filter = None;
    }

    /// True when no filter is active or the row's key equals it.
    pub fn passes(&self, row: &TypedRow) -> bool {
        match &self.filter {
            None => true,
            Some(value) => self.key_of(row) == value,
        }
    }
}
