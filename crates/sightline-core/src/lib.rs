//! # sightline-core
//!
//! Core types, traits, and abstractions for the sightline library.
//!
//! This crate provides the observation record model, the search-filter data
//! model, output-field descriptions, and the trait seams to external
//! collaborators (taxon store, geometry cache, user directory, query
//! executor) that the sightline-search crate builds on.

pub mod error;
pub mod fields;
pub mod filter;
pub mod logging;
pub mod observation;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use fields::{FieldDataType, FieldValue, PropertyFieldDescription};
pub use filter::{
    AreaFilterRef, AreaType, BoundingBox, DateFilter, DateFilterType,
    ExtendedAuthorizationFilter, ExtendedAuthorizationGeographicFilter, GeographicFilter,
    Geometry, OccurrenceStatusFilter, SearchFilter, TaxonFilter, TaxonListOperator,
    VerificationStatus, BIOTA_TAXON_ID, WHOLE_COUNTRY_FEATURE_ID,
};
pub use observation::{
    AreaRef, Event, GeologicalContext, Identification, Location, Observation, Occurrence,
    Organism, Project, ProjectParameter, TaxonAttributes, TaxonInfo, VocabularyValue,
};
pub use traits::{
    AreaGeometryCache, BasicTaxon, ObservationSearcher, TaxonSnapshotProvider, UserAuthority,
    UserAuthorityProvider,
};
