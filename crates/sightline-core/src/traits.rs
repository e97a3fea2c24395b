//! Core traits for sightline abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy: the taxon snapshot store, the area-geometry cache, the user
//! directory, and the document-store query executor. All are external
//! collaborators; this crate ships no implementations beyond test fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::filter::{AreaFilterRef, AreaType, Geometry, SearchFilter};
use crate::observation::Observation;

// =============================================================================
// TAXON SNAPSHOT
// =============================================================================

/// One taxon as delivered by the processed-taxon store.
///
/// `secondary_parent_ids` makes the taxonomy a DAG: a taxon may hang under
/// more than one parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicTaxon {
    pub id: i32,
    pub scientific_name: String,
    #[serde(default)]
    pub parent_id: Option<i32>,
    #[serde(default)]
    pub secondary_parent_ids: Vec<i32>,
}

/// Provider of full taxon snapshots, backed by the processed-taxon store.
#[async_trait]
pub trait TaxonSnapshotProvider: Send + Sync {
    /// Fetch the complete current taxon list.
    async fn get_all_basic_taxa(&self) -> Result<Vec<BasicTaxon>>;
}

// =============================================================================
// AREA GEOMETRY CACHE
// =============================================================================

/// Cache of area geometries keyed by area type and feature id.
#[async_trait]
pub trait AreaGeometryCache: Send + Sync {
    /// Fetch the geometry for one area. `Ok(None)` means the area is known
    /// to have no geometry; `Err` means the cache itself is unavailable.
    async fn get_geometry(&self, area_type: AreaType, feature_id: &str)
        -> Result<Option<Geometry>>;
}

// =============================================================================
// USER AUTHORITIES
// =============================================================================

/// One raw authority grant from the user directory, before expansion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAuthority {
    /// Highest sensitivity level the grant exposes.
    pub max_protection_level: i32,
    /// Granted taxon ids, not yet underlying-expanded. Mandatory: a grant
    /// with no taxon scope grants nothing.
    #[serde(default)]
    pub taxon_ids: Vec<i32>,
    /// Granted areas. Mandatory: a grant with no area scope grants nothing.
    #[serde(default)]
    pub areas: Vec<AreaFilterRef>,
}

/// Provider of a caller's authority grants, backed by the user directory.
#[async_trait]
pub trait UserAuthorityProvider: Send + Sync {
    /// Fetch all grants for a user. `Ok(None)` means the user has no
    /// extended grants at all.
    async fn get_user_authorities(&self, user_id: &str) -> Result<Option<Vec<UserAuthority>>>;
}

// =============================================================================
// QUERY EXECUTOR
// =============================================================================

/// The document-store query executor. Consumes a fully normalized
/// [`SearchFilter`]; execution details are out of scope for this crate.
#[async_trait]
pub trait ObservationSearcher: Send + Sync {
    /// Run the filter and return a page of raw observation records.
    async fn search(&self, filter: &SearchFilter, skip: u64, take: u64)
        -> Result<Vec<Observation>>;

    /// Count records matching the filter.
    async fn count(&self, filter: &SearchFilter) -> Result<u64>;
}
