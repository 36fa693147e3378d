/// Data layer: typed row store, loading, and the cross-filter engine.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable (text cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  infer schema, coerce → Dataset (Vec<TypedRow>)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ filter_space  │  Dimensions + Groups → aggregates, filtered rows
///   └──────────────┘
/// ```

pub mod dimension;
pub mod filter_space;
pub mod group;
pub mod loader;
pub mod model;
