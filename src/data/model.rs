use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// CellValue – a single typed cell
// ---------------------------------------------------------------------------

/// A typed cell value.  Categorical columns keep their text, numerical
/// columns are coerced to `f64`, and a cell absent from its row is `Missing`.
///
/// Dimension keys are `CellValue`s, so it must be usable as a hash key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Missing,
}

// -- Manual Eq/Hash so CellValue can key a HashMap --
// Coerced numbers are never NaN and -0 is normalised, so bitwise
// hashing agrees with `==`.

impl Eq for CellValue {}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Number(v) => v.to_bits().hash(state),
            CellValue::Missing => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Missing => write!(f, "undefined"),
        }
    }
}

impl CellValue {
    /// Numeric view of the cell; `Text`/`Missing` contribute 0 to sums.
    pub fn as_f64(&self) -> f64 {
        match self {
            CellValue::Number(v) => *v,
            _ => 0.0,
        }
    }

    /// Total order used only for display sorting (grid columns).
    pub fn display_cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (CellValue::Missing, CellValue::Missing) => Ordering::Equal,
            (CellValue::Missing, _) => Ordering::Greater,
            (_, CellValue::Missing) => Ordering::Less,
            (CellValue::Number(_), CellValue::Text(_)) => Ordering::Less,
            (CellValue::Text(_), CellValue::Number(_)) => Ordering::Greater,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

// ---------------------------------------------------------------------------
// Number recognition
// ---------------------------------------------------------------------------

/// Parse loosely formatted numeric text.
///
/// Accepts surrounding whitespace, decimal and exponent forms, `0x`/`0o`/`0b`
/// integer literals and a signed or unsigned `Infinity`.  Returns `None` for
/// blank input and for words Rust's float parser would otherwise accept
/// (`inf`, `nan`, ...).
pub fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    match t {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    for (prefix, radix) in RADIX_PREFIXES {
        if let Some(digits) = t.strip_prefix(prefix) {
            return parse_radix_digits(digits, radix);
        }
    }
    if !t
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    t.parse::<f64>().ok()
}

const RADIX_PREFIXES: [(&str, u32); 6] = [
    ("0x", 16),
    ("0X", 16),
    ("0o", 8),
    ("0O", 8),
    ("0b", 2),
    ("0B", 2),
];

/// Digits of a prefixed integer literal.  No sign is allowed after the
/// prefix; values beyond `u64` keep growing as floats.
fn parse_radix_digits(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
    })
}

/// Coerce raw text for a numerical column: unparseable or empty → 0.
pub fn coerce_number(s: &str) -> f64 {
    match parse_number(s) {
        // -0 and NaN both collapse to 0
        Some(v) if v == 0.0 || v.is_nan() => 0.0,
        Some(v) => v,
        None => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Column schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Categorical,
    Numerical,
}

/// Column name → kind, inferred once per loaded dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSchema {
    kinds: BTreeMap<String, ColumnKind>,
    categorical: Vec<String>,
    numerical: Vec<String>,
}

impl ColumnSchema {
    /// Classify each header from the first data row.  Blank headers are
    /// left out of the schema.
    pub fn infer(columns: &[String], sample: Option<&[Option<String>]>) -> Self {
        let mut schema = ColumnSchema::default();
        for (idx, header) in columns.iter().enumerate() {
            if header.trim().is_empty() {
                continue;
            }
            let sample_value = sample.and_then(|row| row.get(idx)).and_then(|v| v.as_deref());
            let kind = match sample_value.and_then(parse_number) {
                Some(_) => ColumnKind::Numerical,
                None => ColumnKind::Categorical,
            };
            schema.insert(header, kind);
        }
        schema
    }

    fn insert(&mut self, column: &str, kind: ColumnKind) {
        if self.kinds.insert(column.to_string(), kind).is_some() {
            return;
        }
        match kind {
            ColumnKind::Categorical => self.categorical.push(column.to_string()),
            ColumnKind::Numerical => self.numerical.push(column.to_string()),
        }
    }

    pub fn kind(&self, column: &str) -> Option<ColumnKind> {
        self.kinds.get(column).copied()
    }

    pub fn is_numerical(&self, column: &str) -> bool {
        self.kind(column) == Some(ColumnKind::Numerical)
    }

    /// Categorical columns in source order.
    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    /// Numerical columns in source order.
    pub fn numerical(&self) -> &[String] {
        &self.numerical
    }
}

// ---------------------------------------------------------------------------
// RawTable – output of the loader
// ---------------------------------------------------------------------------

/// Untyped rows as read from a file.  `None` marks a cell the source row
/// did not carry at all (short CSV record, key absent from a JSON object).
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

// ---------------------------------------------------------------------------
// TypedRow / Dataset – the TypedRow Store
// ---------------------------------------------------------------------------

/// One immutable row, cells aligned with [`Dataset::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRow {
    cells: Vec<CellValue>,
}

static MISSING: CellValue = CellValue::Missing;

impl TypedRow {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Cell at `col`, or `Missing` past the end of the row.
    pub fn get(&self, col: usize) -> &CellValue {
        self.cells.get(col).unwrap_or(&MISSING)
    }

}

/// The loaded dataset: rows in source order plus the inferred schema.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<TypedRow>,
    pub schema: ColumnSchema,
}

impl Dataset {
    /// Infer the schema from the first row and coerce every cell.
    pub fn from_raw(raw: RawTable) -> Self {
        let schema = ColumnSchema::infer(&raw.columns, raw.rows.first().map(Vec::as_slice));
        let kinds: Vec<Option<ColumnKind>> =
            raw.columns.iter().map(|c| schema.kind(c)).collect();

        let rows = raw
            .rows
            .into_iter()
            .map(|raw_row| {
                let cells = kinds
                    .iter()
                    .enumerate()
                    .map(|(idx, kind)| {
                        let cell = raw_row.get(idx).cloned().flatten();
                        match (kind, cell) {
                            (Some(ColumnKind::Numerical), Some(text)) => {
                                CellValue::Number(coerce_number(&text))
                            }
                            (Some(ColumnKind::Numerical), None) => CellValue::Number(0.0),
                            (_, Some(text)) => CellValue::Text(text),
                            (_, None) => CellValue::Missing,
                        }
                    })
                    .collect();
                TypedRow::new(cells)
            })
            .collect();

        Dataset {
            columns: raw.columns,
            rows,
            schema,
        }
    }

    /// Position of a column by name (first match for duplicate headers).
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
