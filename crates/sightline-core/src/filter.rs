//! Unified search filter for observation queries.
//!
//! This module provides the `SearchFilter` type that composes all filtering
//! dimensions into a single, cohesive filtering interface:
//!
//! - **Taxon**: taxon-id scope with underlying-taxa expansion
//! - **Temporal**: observation date range with overlap semantics
//! - **Geographic**: indexed administrative areas and raw geometries
//! - **Provenance**: data providers, projects, verification status
//! - **Authorization**: server-populated extended-authorization clauses
//!
//! A filter passes through two stages before query execution: the normalizer
//! expands requested taxa and areas into the concrete `taxon_ids` /
//! `geographic` fields, and the authorization builder attaches
//! `extended_authorizations` when protected data was requested. The query
//! layer OR-combines each extended clause with the base filter.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::fields::PropertyFieldDescription;

/// Distinguished root taxon id ("Biota", all life). A taxon scope that
/// expands from this root is unbounded, not a literal enumeration.
pub const BIOTA_TAXON_ID: i32 = 0;

/// Feature id of the whole-country sentinel area. Every record is already
/// within this scope, so it never becomes a concrete area restriction.
pub const WHOLE_COUNTRY_FEATURE_ID: &str = "100";

// =============================================================================
// TAXON DIMENSION
// =============================================================================

/// How caller-supplied taxon ids combine with resolved taxon-list ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaxonListOperator {
    /// Union of the two id sets.
    #[default]
    Merge,
    /// Ids present in both sets.
    Intersect,
}

/// Caller-supplied taxon scope, before underlying-taxa expansion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonFilter {
    /// Requested taxon ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<i32>,

    /// Expand each id to include all underlying taxa.
    #[serde(default)]
    pub include_underlying_taxa: bool,

    /// Ids contributed by caller-curated taxon lists, already resolved.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taxon_list_ids: Vec<i32>,

    /// How `taxon_list_ids` combines with `ids`.
    #[serde(default)]
    pub taxon_list_operator: TaxonListOperator,
}

impl TaxonFilter {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.taxon_list_ids.is_empty()
    }
}

// =============================================================================
// TEMPORAL DIMENSION
// =============================================================================

/// How the filter's date range matches an observation's event dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateFilterType {
    /// Event overlaps the range at any point.
    #[default]
    OverlapStartDateAndEndDate,
    /// Both event start and end fall inside the range.
    BetweenStartDateAndEndDate,
    /// Only the event start date is constrained.
    OnlyStartDate,
    /// Only the event end date is constrained.
    OnlyEndDate,
}

/// Observation date constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub date_filter_type: DateFilterType,
}

// =============================================================================
// GEOGRAPHIC DIMENSION
// =============================================================================

/// Administrative area kinds a filter may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AreaType {
    County,
    Municipality,
    Province,
    Parish,
    BirdValidationArea,
    ProtectedNature,
    Spa,
    Sci,
    WaterArea,
}

impl AreaType {
    /// Area types stored as id lists on the observation index. Everything
    /// else must be resolved to a geometry for a spatial lookup.
    pub fn is_indexed(&self) -> bool {
        matches!(
            self,
            AreaType::County
                | AreaType::Municipality
                | AreaType::Province
                | AreaType::Parish
                | AreaType::BirdValidationArea
        )
    }
}

/// A caller-supplied reference to one administrative area.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaFilterRef {
    pub area_type: AreaType,
    pub feature_id: String,
}

/// A GeoJSON-shaped geometry, passed through to the spatial query layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Geometry(pub JsonValue);

/// Axis-aligned bounding box in WGS84 decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub top_left_latitude: f64,
    pub top_left_longitude: f64,
    pub bottom_right_latitude: f64,
    pub bottom_right_longitude: f64,
}

/// Normalized geographic scope: indexed id lists plus resolved geometries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub county_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub municipality_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub province_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parish_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bird_validation_area_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geometries: Vec<Geometry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    /// Buffer geometry matches by each record's coordinate uncertainty.
    #[serde(default)]
    pub use_point_accuracy: bool,
}

impl GeographicFilter {
    pub fn is_empty(&self) -> bool {
        self.county_ids.is_empty()
            && self.municipality_ids.is_empty()
            && self.province_ids.is_empty()
            && self.parish_ids.is_empty()
            && self.bird_validation_area_ids.is_empty()
            && self.geometries.is_empty()
            && self.bounding_box.is_none()
    }

    /// Append an indexed area's feature id to the matching id list.
    /// Returns false for non-indexed area types, which need a geometry.
    pub fn push_indexed(&mut self, area_type: AreaType, feature_id: String) -> bool {
        match area_type {
            AreaType::County => self.county_ids.push(feature_id),
            AreaType::Municipality => self.municipality_ids.push(feature_id),
            AreaType::Province => self.province_ids.push(feature_id),
            AreaType::Parish => self.parish_ids.push(feature_id),
            AreaType::BirdValidationArea => self.bird_validation_area_ids.push(feature_id),
            _ => return false,
        }
        true
    }
}

// =============================================================================
// PROVENANCE DIMENSIONS
// =============================================================================

/// Record verification requirement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerificationStatus {
    NotVerified,
    Verified,
    #[default]
    BothVerifiedAndNotVerified,
}

/// Presence/absence requirement for the sighted taxon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OccurrenceStatusFilter {
    #[default]
    Present,
    Absent,
    BothPresentAndAbsent,
}

// =============================================================================
// EXTENDED AUTHORIZATION
// =============================================================================

/// Geographic scope of one extended-authorization grant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedAuthorizationGeographicFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub county_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub municipality_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub province_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parish_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geometries: Vec<Geometry>,
    /// Set when the grant covers the whole country; shortcuts all area lists.
    #[serde(default)]
    pub authorized_to_whole_country: bool,
}

impl ExtendedAuthorizationGeographicFilter {
    /// A grant with no geographic scope at all grants nothing.
    pub fn has_scope(&self) -> bool {
        self.authorized_to_whole_country
            || !self.county_ids.is_empty()
            || !self.municipality_ids.is_empty()
            || !self.province_ids.is_empty()
            || !self.parish_ids.is_empty()
            || !self.geometries.is_empty()
    }
}

/// One usable authority grant: protection ceiling plus expanded taxon and
/// geographic scope. OR-combined with the base filter by the query layer;
/// a record matching any retained clause is visible up to that clause's
/// protection level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedAuthorizationFilter {
    /// Highest sensitivity level this grant exposes.
    pub max_protection_level: i32,

    /// Underlying-expanded taxon scope. `None` means the grant covers the
    /// taxonomic root and carries no taxon restriction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxon_ids: Option<HashSet<i32>>,

    /// Expanded geographic scope.
    pub geographic_areas: ExtendedAuthorizationGeographicFilter,
}

impl ExtendedAuthorizationFilter {
    /// A grant is usable only with a taxon scope (or explicit root) and a
    /// non-empty geographic scope. Anything less grants nothing and must
    /// not silently widen into "unrestricted".
    pub fn is_usable(&self) -> bool {
        let has_taxa = match &self.taxon_ids {
            None => true,
            Some(ids) => !ids.is_empty(),
        };
        has_taxa && self.geographic_areas.has_scope()
    }
}

// =============================================================================
// UNIFIED SEARCH FILTER
// =============================================================================

/// Unified search filter composing all filtering dimensions.
///
/// Caller-supplied fields (`taxon`, `areas`, `date`, provenance) describe the
/// request; `taxon_ids`, `geographic`, and `extended_authorizations` are
/// populated by normalization and must not be trusted from the wire —
/// `extended_authorizations` is skipped on deserialization outright.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    /// Requested taxon scope, pre-expansion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxon: Option<TaxonFilter>,

    /// Requested areas, pre-resolution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub areas: Vec<AreaFilterRef>,

    /// Force geometry resolution even for indexed area types.
    #[serde(default)]
    pub force_geometry_search: bool,

    /// Observation date constraint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateFilter>,

    /// Restrict to these data providers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_provider_ids: Vec<i32>,

    /// Restrict to records belonging to these projects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub project_ids: Vec<i32>,

    /// Verification requirement.
    #[serde(default)]
    pub verification_status: VerificationStatus,

    /// Verification-status vocabulary ids (current field).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_status_ids: Vec<i32>,

    /// Legacy verification-status ids; consulted only when
    /// `validation_status_ids` is empty. Backward-compatibility contract
    /// with existing callers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_status_ids: Vec<i32>,

    /// Presence/absence requirement.
    #[serde(default)]
    pub occurrence_status: OccurrenceStatusFilter,

    /// Requested output columns, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_fields: Vec<PropertyFieldDescription>,

    /// Caller asked to see protected (sensitive) observations. Triggers
    /// extended-authorization augmentation during normalization.
    #[serde(default)]
    pub protected_observations: bool,

    // ─── Server-populated, never trusted from the wire ───────────────────

    /// Effective taxon-id scope after expansion. `None` means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxon_ids: Option<HashSet<i32>>,

    /// Resolved geographic scope.
    #[serde(default)]
    pub geographic: GeographicFilter,

    /// Extended-authorization clauses. Exclusively server-populated; any
    /// value arriving on the wire is discarded.
    #[serde(default, skip_deserializing)]
    pub extended_authorizations: Vec<ExtendedAuthorizationFilter>,
}

impl SearchFilter {
    /// Create a new empty filter (matches all observations the caller may
    /// see at base visibility).
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective verification-status ids: the current field wins; the
    /// legacy field applies only when the current one is empty.
    pub fn effective_verification_status_ids(&self) -> &[i32] {
        if !self.validation_status_ids.is_empty() {
            &self.validation_status_ids
        } else {
            &self.verification_status_ids
        }
    }
}
