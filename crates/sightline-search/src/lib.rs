//! # sightline-search
//!
//! Search-filter compilation and field-projection engine for sightline.
//!
//! Translates rich, partially overlapping observation filters (taxon,
//! geography, date, verification status, per-project parameters) into a
//! normalized query description, applies authorization-driven record
//! restriction, and projects named output fields from heterogeneous result
//! records via a string-keyed field-path resolver.
//!
//! The pipeline: a raw caller-supplied [`sightline_core::SearchFilter`]
//! passes through the [`normalizer`] (taxon/area expansion) and, for
//! protected-data requests, the [`authorization`] builder, then goes to the
//! external query executor; its result records are projected per requested
//! field path through the [`resolver`].

pub mod authorization;
pub mod engine;
pub mod normalizer;
pub mod resolver;
pub mod taxon_cache;
pub mod taxon_tree;

pub use authorization::AuthorizationBuilder;
pub use engine::{CallerContext, FilterEngine};
pub use normalizer::FilterNormalizer;
pub use resolver::{is_mapped, resolve, resolve_as_string, resolve_output_fields};
pub use taxon_cache::TaxonTreeCache;
pub use taxon_tree::{TaxonNode, TaxonTree};
