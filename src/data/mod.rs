//! Data layer: core types, loading, filtering and rollups.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Dataset (immutable snapshot)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  DateRange → FilteredView { rows, unique_items }
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  pure rollups: regions, daily, category, RFM
//!   └───────────┘
//! ```

pub mod aggregate;
pub mod columns;
pub mod filter;
pub mod loader;
pub mod model;
