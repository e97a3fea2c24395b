//! Structured logging schema and field name constants for sightline.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (cache rebuilds), operation completions |
//! | DEBUG | Decision points, intermediate values |
//! | TRACE | Per-item iteration (field resolution, per-area expansion) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "filter", "resolver", "taxonomy", "authorization"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "taxon_tree_cache", "normalizer", "field_resolver"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "normalize_filter", "build_authorization", "rebuild"
pub const OPERATION: &str = "op";

/// Caller identity for authorization lookups.
pub const USER_ID: &str = "user_id";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Dotted field path being resolved.
pub const FIELD_PATH: &str = "field_path";

/// Area type of an area reference.
pub const AREA_TYPE: &str = "area_type";

/// Feature id of an area reference.
pub const FEATURE_ID: &str = "feature_id";

/// Taxon id of the node being processed.
pub const TAXON_ID: &str = "taxon_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of taxa in a tree, seed set, or expansion result.
pub const TAXON_COUNT: &str = "taxon_count";

/// Number of authority grants before/after usability filtering.
pub const GRANT_COUNT: &str = "grant_count";

/// Number of geometries resolved for a geographic filter.
pub const GEOMETRY_COUNT: &str = "geometry_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
