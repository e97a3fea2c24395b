//! The filter engine: the surface the API layer consumes.
//!
//! Composes the normalizer and the authorization builder into the full
//! pipeline: raw caller-supplied filter → expand taxa and areas → attach
//! extended authorization (only when protected data was requested) → fully
//! normalized filter for the query executor. Result projection is exposed
//! alongside via [`crate::resolver`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use sightline_core::{
    AreaGeometryCache, Error, Result, SearchFilter, UserAuthorityProvider,
};

use crate::authorization::AuthorizationBuilder;
use crate::normalizer::FilterNormalizer;
use crate::taxon_cache::TaxonTreeCache;

/// Identity of the caller issuing a search.
#[derive(Debug, Clone, Default)]
pub struct CallerContext {
    /// Authenticated user id, when present. Required for any extended
    /// authorization to apply.
    pub user_id: Option<String>,
}

impl CallerContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }
}

/// Search-filter compilation engine.
pub struct FilterEngine {
    normalizer: FilterNormalizer,
    authorization: AuthorizationBuilder,
    taxon_cache: Arc<TaxonTreeCache>,
}

impl FilterEngine {
    pub fn new(
        taxon_cache: Arc<TaxonTreeCache>,
        geometry_cache: Arc<dyn AreaGeometryCache>,
        authority_provider: Arc<dyn UserAuthorityProvider>,
    ) -> Self {
        Self {
            normalizer: FilterNormalizer::new(
                Arc::clone(&taxon_cache),
                Arc::clone(&geometry_cache),
            ),
            authorization: AuthorizationBuilder::new(
                authority_provider,
                Arc::clone(&taxon_cache),
                geometry_cache,
            ),
            taxon_cache,
        }
    }

    /// Normalize a raw caller-supplied filter into query-ready form.
    ///
    /// Expands taxon scope through the taxon tree, resolves area references,
    /// and attaches extended-authorization clauses when the caller requested
    /// protected observations. The returned filter is complete: this
    /// function either finishes every stage or fails, never returning a
    /// partially populated filter.
    pub async fn normalize_filter(
        &self,
        mut raw: SearchFilter,
        caller: &CallerContext,
    ) -> Result<SearchFilter> {
        let started = Instant::now();
        validate(&raw)?;

        let tree = self.normalizer.taxon_tree().await?;
        let taxon_ids = match &raw.taxon {
            Some(taxon) => FilterNormalizer::populate_taxon_filter(&tree, taxon),
            None => None,
        };

        let mut geographic = self
            .normalizer
            .populate_geographic_filter(&raw.areas, raw.force_geometry_search)
            .await?;
        // Caller-supplied spatial input is carried through area resolution
        // unchanged: ad hoc geometries, bounding box, accuracy buffering.
        geographic
            .geometries
            .extend(std::mem::take(&mut raw.geographic.geometries));
        geographic.bounding_box = raw.geographic.bounding_box;
        geographic.use_point_accuracy = raw.geographic.use_point_accuracy;

        let extended_authorizations = if raw.protected_observations {
            match &caller.user_id {
                Some(user_id) => self.authorization.build_authorization(user_id).await,
                None => {
                    warn!(
                        subsystem = "filter",
                        component = "engine",
                        "protected observations requested without caller identity"
                    );
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        debug!(
            subsystem = "filter",
            component = "engine",
            op = "normalize_filter",
            taxon_count = taxon_ids.as_ref().map(|t| t.len()).unwrap_or(0),
            grant_count = extended_authorizations.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "filter normalized"
        );

        Ok(SearchFilter {
            taxon_ids,
            geographic,
            extended_authorizations,
            ..raw
        })
    }

    /// Expand taxon ids to all underlying taxa. Exposed directly for
    /// callers needing expansion outside full filter normalization.
    pub async fn underlying_taxon_ids(
        &self,
        ids: impl IntoIterator<Item = i32>,
        include_self: bool,
    ) -> Result<HashSet<i32>> {
        let tree = self.taxon_cache.get().await?;
        Ok(tree.underlying_taxon_ids(ids, include_self))
    }

    /// Drop the cached taxon tree; the next use rebuilds from a fresh
    /// snapshot.
    pub fn invalidate_taxon_cache(&self) {
        self.taxon_cache.invalidate();
    }
}

/// Structural validation of caller input.
fn validate(filter: &SearchFilter) -> Result<()> {
    if let Some(date) = &filter.date {
        if let (Some(start), Some(end)) = (date.start_date, date.end_date) {
            if start > end {
                return Err(Error::Validation(format!(
                    "date range start {start} is after end {end}"
                )));
            }
        }
    }

    if let Some(bbox) = &filter.geographic.bounding_box {
        if bbox.top_left_latitude <= bbox.bottom_right_latitude
            || bbox.top_left_longitude >= bbox.bottom_right_longitude
        {
            return Err(Error::Validation(
                "bounding box corners are inverted or degenerate".into(),
            ));
        }
    }

    for field in &filter.output_fields {
        if field.path.is_empty() {
            return Err(Error::Validation("output field with empty path".into()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;
    use sightline_core::{
        AreaFilterRef, AreaType, BasicTaxon, BoundingBox, DateFilter, Geometry, TaxonFilter,
        TaxonSnapshotProvider, UserAuthority, BIOTA_TAXON_ID,
    };

    struct StaticTaxa;

    #[async_trait]
    impl TaxonSnapshotProvider for StaticTaxa {
        async fn get_all_basic_taxa(&self) -> Result<Vec<BasicTaxon>> {
            Ok(vec![
                BasicTaxon {
                    id: BIOTA_TAXON_ID,
                    scientific_name: "Biota".into(),
                    parent_id: None,
                    secondary_parent_ids: vec![],
                },
                BasicTaxon {
                    id: 10,
                    scientific_name: "Aves".into(),
                    parent_id: Some(BIOTA_TAXON_ID),
                    secondary_parent_ids: vec![],
                },
                BasicTaxon {
                    id: 20,
                    scientific_name: "Parus major".into(),
                    parent_id: Some(10),
                    secondary_parent_ids: vec![],
                },
            ])
        }
    }

    struct StaticGeometry;

    #[async_trait]
    impl AreaGeometryCache for StaticGeometry {
        async fn get_geometry(
            &self,
            _area_type: AreaType,
            _feature_id: &str,
        ) -> Result<Option<Geometry>> {
            Ok(Some(Geometry(json!({"type": "Polygon", "coordinates": []}))))
        }
    }

    struct StaticAuthorities;

    #[async_trait]
    impl UserAuthorityProvider for StaticAuthorities {
        async fn get_user_authorities(&self, user_id: &str) -> Result<Option<Vec<UserAuthority>>> {
            if user_id == "granted" {
                Ok(Some(vec![UserAuthority {
                    max_protection_level: 3,
                    taxon_ids: vec![10],
                    areas: vec![AreaFilterRef {
                        area_type: AreaType::County,
                        feature_id: "3".into(),
                    }],
                }]))
            } else {
                Ok(None)
            }
        }
    }

    fn engine() -> FilterEngine {
        FilterEngine::new(
            Arc::new(TaxonTreeCache::new(Arc::new(StaticTaxa))),
            Arc::new(StaticGeometry),
            Arc::new(StaticAuthorities),
        )
    }

    #[tokio::test]
    async fn test_normalize_expands_taxa_and_areas() {
        let raw = SearchFilter {
            taxon: Some(TaxonFilter {
                ids: vec![10],
                include_underlying_taxa: true,
                ..Default::default()
            }),
            areas: vec![AreaFilterRef {
                area_type: AreaType::Municipality,
                feature_id: "180".into(),
            }],
            ..Default::default()
        };
        let filter = engine()
            .normalize_filter(raw, &CallerContext::anonymous())
            .await
            .unwrap();
        assert_eq!(filter.taxon_ids.unwrap(), HashSet::from([10, 20]));
        assert_eq!(filter.geographic.municipality_ids, vec!["180"]);
        assert!(filter.extended_authorizations.is_empty());
    }

    #[tokio::test]
    async fn test_protected_request_attaches_authorization() {
        let raw = SearchFilter {
            protected_observations: true,
            ..Default::default()
        };
        let filter = engine()
            .normalize_filter(raw, &CallerContext::for_user("granted"))
            .await
            .unwrap();
        assert_eq!(filter.extended_authorizations.len(), 1);
        assert_eq!(filter.extended_authorizations[0].max_protection_level, 3);
    }

    #[tokio::test]
    async fn test_protected_without_identity_gets_no_grants() {
        let raw = SearchFilter {
            protected_observations: true,
            ..Default::default()
        };
        let filter = engine()
            .normalize_filter(raw, &CallerContext::anonymous())
            .await
            .unwrap();
        assert!(filter.extended_authorizations.is_empty());
    }

    #[tokio::test]
    async fn test_unprotected_request_never_consults_directory() {
        let raw = SearchFilter::default();
        let filter = engine()
            .normalize_filter(raw, &CallerContext::for_user("granted"))
            .await
            .unwrap();
        assert!(filter.extended_authorizations.is_empty());
    }

    #[tokio::test]
    async fn test_inverted_date_range_rejected() {
        let raw = SearchFilter {
            date: Some(DateFilter {
                start_date: Some(chrono::Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap()),
                end_date: Some(chrono::Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = engine()
            .normalize_filter(raw, &CallerContext::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_degenerate_bounding_box_rejected() {
        let mut raw = SearchFilter::default();
        raw.geographic.bounding_box = Some(BoundingBox {
            top_left_latitude: 58.0,
            top_left_longitude: 14.0,
            bottom_right_latitude: 59.0,
            bottom_right_longitude: 15.0,
        });
        let err = engine()
            .normalize_filter(raw, &CallerContext::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_bounding_box_survives_normalization() {
        let mut raw = SearchFilter::default();
        raw.geographic.bounding_box = Some(BoundingBox {
            top_left_latitude: 59.0,
            top_left_longitude: 14.0,
            bottom_right_latitude: 58.0,
            bottom_right_longitude: 15.0,
        });
        raw.geographic.use_point_accuracy = true;
        let filter = engine()
            .normalize_filter(raw, &CallerContext::anonymous())
            .await
            .unwrap();
        assert!(filter.geographic.bounding_box.is_some());
        assert!(filter.geographic.use_point_accuracy);
    }

    #[tokio::test]
    async fn test_caller_geometries_survive_normalization() {
        let mut raw = SearchFilter::default();
        raw.geographic
            .geometries
            .push(Geometry(json!({"type": "Point", "coordinates": [15.0, 58.0]})));
        raw.areas.push(AreaFilterRef {
            area_type: AreaType::WaterArea,
            feature_id: "5".into(),
        });
        let filter = engine()
            .normalize_filter(raw, &CallerContext::anonymous())
            .await
            .unwrap();
        // One resolved from the area reference, one passed through.
        assert_eq!(filter.geographic.geometries.len(), 2);
        assert!(filter
            .geographic
            .geometries
            .iter()
            .any(|g| g.0["type"] == "Point"));
    }

    #[tokio::test]
    async fn test_direct_underlying_taxon_expansion() {
        let ids = engine().underlying_taxon_ids([10], true).await.unwrap();
        assert_eq!(ids, HashSet::from([10, 20]));
    }
}
