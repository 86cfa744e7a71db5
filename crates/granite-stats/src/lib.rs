//! Statistics for cost-based query planning.
//!
//! Implements fixed-width histograms, per-table statistics built by scanning
//! the table through the storage collaborator, and a process-wide registry
//! the planner consults for selectivity and scan-cost numbers.
//!
//! # Estimation model
//! - Equality: average per-unit density of the probe value's bucket,
//!   `(height / width) / total`.
//! - Range (`<`, `<=`, `>`, `>=`): linear interpolation inside the probe's
//!   bucket plus the full mass of the buckets beyond it.
//! - Scan cost: `page_count × io_cost_per_page` — a partially filled final
//!   page costs a full page read, since storage is addressable only at page
//!   granularity.
//!
//! Space and time are bounded by the bucket count, never by the row count:
//! histograms ingest values one at a time and retain only bucket tallies.

pub mod histogram;
pub mod registry;
pub mod table_stats;

pub use histogram::{IntHistogram, StringHistogram};
pub use registry::StatsRegistry;
pub use table_stats::{TableStats, DEFAULT_IO_COST_PER_PAGE, HIST_BUCKETS};
