//! Telemetry metric name constants.
//!
//! Centralised metric names for muninn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `muninn_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `cache` — cache instance name (e.g. "document", "group")
//! - `method` — RPC method path (e.g. "DocumentService/GetDocument")
//! - `code` — status code name, or "local" for unclassified errors
//! - `outcome` — suggestion fetch result: "added" | "ended"

/// Total cache reads answered from a resolved entry.
///
/// Labels: `cache`.
pub const CACHE_HITS_TOTAL: &str = "muninn_cache_hits_total";

/// Total cache reads that fell through to a fetch.
///
/// Labels: `cache`.
pub const CACHE_MISSES_TOTAL: &str = "muninn_cache_misses_total";

/// Total cache reads that joined an already in-flight fetch.
///
/// Labels: `cache`.
pub const CACHE_JOINS_TOTAL: &str = "muninn_cache_joins_total";

/// Total errors dispatched through the middleware chain.
///
/// Labels: `method`, `code`.
pub const RPC_ERRORS_TOTAL: &str = "muninn_rpc_errors_total";

/// Total suggestion fetch rounds.
///
/// Labels: `outcome` ("added" | "ended").
pub const SUGGESTION_FETCHES_TOTAL: &str = "muninn_suggestion_fetches_total";
