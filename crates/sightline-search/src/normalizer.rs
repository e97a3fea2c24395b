//! Taxon and area filter normalization.
//!
//! Expands a caller-supplied filter into the concrete scope the query layer
//! consumes: requested taxon ids become underlying-expanded id sets via the
//! taxon tree, and area references become either indexed id lists (cheap
//! downstream lookup) or resolved geometries (expensive spatial lookup).

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use sightline_core::{
    AreaFilterRef, AreaGeometryCache, AreaType, GeographicFilter, Result, TaxonFilter,
    TaxonListOperator, BIOTA_TAXON_ID, WHOLE_COUNTRY_FEATURE_ID,
};

use crate::taxon_cache::TaxonTreeCache;
use crate::taxon_tree::TaxonTree;

/// Expands taxon and geographic scope for search filters.
pub struct FilterNormalizer {
    taxon_cache: Arc<TaxonTreeCache>,
    geometry_cache: Arc<dyn AreaGeometryCache>,
}

impl FilterNormalizer {
    pub fn new(
        taxon_cache: Arc<TaxonTreeCache>,
        geometry_cache: Arc<dyn AreaGeometryCache>,
    ) -> Self {
        Self {
            taxon_cache,
            geometry_cache,
        }
    }

    /// Current taxon tree, building it on first access.
    pub async fn taxon_tree(&self) -> Result<Arc<TaxonTree>> {
        self.taxon_cache.get().await
    }

    /// Compute the effective taxon-id scope for a filter.
    ///
    /// Returns `None` for an unbounded scope (no taxon restriction), which
    /// must not be conflated with `Some(empty)` — an empty restriction
    /// matches nothing. Unbounded arises two ways: the caller requested no
    /// taxa at all, or the scope expands from the "Biota" root, in which
    /// case enumerating every taxon would be a pointless restriction.
    pub fn populate_taxon_filter(
        tree: &TaxonTree,
        filter: &TaxonFilter,
    ) -> Option<HashSet<i32>> {
        if filter.is_empty() {
            return None;
        }

        let ids: HashSet<i32> = filter.ids.iter().copied().collect();
        let effective: HashSet<i32> = if filter.taxon_list_ids.is_empty() {
            ids
        } else {
            let list: HashSet<i32> = filter.taxon_list_ids.iter().copied().collect();
            match filter.taxon_list_operator {
                TaxonListOperator::Merge => ids.union(&list).copied().collect(),
                TaxonListOperator::Intersect => ids.intersection(&list).copied().collect(),
            }
        };

        if !filter.include_underlying_taxa {
            return Some(effective);
        }
        if effective.contains(&BIOTA_TAXON_ID) {
            return None;
        }
        Some(tree.underlying_taxon_ids(effective, true))
    }

    /// Resolve area references into a normalized geographic filter.
    ///
    /// Indexed area types land in their id lists unless geometry search is
    /// forced. The whole-country sentinel is dropped outright: every record
    /// is already within that scope. Everything else fans out concurrently
    /// to the geometry cache; an area the cache cannot resolve is skipped
    /// with a warning so one bad reference never fails a multi-area filter.
    pub async fn populate_geographic_filter(
        &self,
        areas: &[AreaFilterRef],
        force_geometry_search: bool,
    ) -> Result<GeographicFilter> {
        let mut geographic = GeographicFilter::default();
        let mut geometry_areas: Vec<&AreaFilterRef> = Vec::new();

        for area in areas {
            if area.area_type == AreaType::BirdValidationArea
                && area.feature_id == WHOLE_COUNTRY_FEATURE_ID
            {
                debug!(
                    subsystem = "filter",
                    component = "normalizer",
                    feature_id = %area.feature_id,
                    "whole-country sentinel dropped from geographic filter"
                );
                continue;
            }
            if !force_geometry_search
                && geographic.push_indexed(area.area_type, area.feature_id.clone())
            {
                continue;
            }
            geometry_areas.push(area);
        }

        let fetches = geometry_areas.iter().map(|area| {
            let cache = Arc::clone(&self.geometry_cache);
            async move {
                (
                    *area,
                    cache.get_geometry(area.area_type, &area.feature_id).await,
                )
            }
        });

        for (area, outcome) in join_all(fetches).await {
            match outcome {
                Ok(Some(geometry)) => geographic.geometries.push(geometry),
                Ok(None) => {
                    warn!(
                        subsystem = "filter",
                        component = "normalizer",
                        area_type = ?area.area_type,
                        feature_id = %area.feature_id,
                        "area has no geometry, skipped"
                    );
                }
                Err(e) => {
                    warn!(
                        subsystem = "filter",
                        component = "normalizer",
                        area_type = ?area.area_type,
                        feature_id = %area.feature_id,
                        error = %e,
                        "geometry resolution failed, area skipped"
                    );
                }
            }
        }

        Ok(geographic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;
    use sightline_core::{BasicTaxon, Error, Geometry, TaxonSnapshotProvider};

    struct StaticTaxa(Vec<BasicTaxon>);

    #[async_trait]
    impl TaxonSnapshotProvider for StaticTaxa {
        async fn get_all_basic_taxa(&self) -> Result<Vec<BasicTaxon>> {
            Ok(self.0.clone())
        }
    }

    struct FakeGeometryCache {
        geometries: HashMap<(AreaType, String), Geometry>,
        fail_feature: Option<String>,
        calls: AtomicUsize,
    }

    impl FakeGeometryCache {
        fn new() -> Self {
            let mut geometries = HashMap::new();
            geometries.insert(
                (AreaType::WaterArea, "5".to_string()),
                Geometry(json!({"type": "Polygon", "coordinates": []})),
            );
            geometries.insert(
                (AreaType::ProtectedNature, "88".to_string()),
                Geometry(json!({"type": "Polygon", "coordinates": []})),
            );
            geometries.insert(
                (AreaType::County, "3".to_string()),
                Geometry(json!({"type": "Polygon", "coordinates": []})),
            );
            Self {
                geometries,
                fail_feature: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AreaGeometryCache for FakeGeometryCache {
        async fn get_geometry(
            &self,
            area_type: AreaType,
            feature_id: &str,
        ) -> Result<Option<Geometry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_feature.as_deref() == Some(feature_id) {
                return Err(Error::Upstream("geometry store down".into()));
            }
            Ok(self
                .geometries
                .get(&(area_type, feature_id.to_string()))
                .cloned())
        }
    }

    fn biota_tree() -> TaxonTree {
        // Biota(0) → 10 → {20, 21}, 20 → 30
        TaxonTree::build(vec![
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
                scientific_name: "Parus".into(),
                parent_id: Some(10),
                secondary_parent_ids: vec![],
            },
            BasicTaxon {
                id: 21,
                scientific_name: "Corvus".into(),
                parent_id: Some(10),
                secondary_parent_ids: vec![],
            },
            BasicTaxon {
                id: 30,
                scientific_name: "Parus major".into(),
                parent_id: Some(20),
                secondary_parent_ids: vec![],
            },
        ])
    }

    fn normalizer(cache: Arc<FakeGeometryCache>) -> FilterNormalizer {
        let taxa = Arc::new(TaxonTreeCache::new(Arc::new(StaticTaxa(Vec::new()))));
        FilterNormalizer::new(taxa, cache)
    }

    #[test]
    fn test_empty_taxon_filter_is_unbounded() {
        let tree = biota_tree();
        let filter = TaxonFilter::default();
        assert!(FilterNormalizer::populate_taxon_filter(&tree, &filter).is_none());
    }

    #[test]
    fn test_no_expansion_without_underlying_flag() {
        let tree = biota_tree();
        let filter = TaxonFilter {
            ids: vec![10],
            include_underlying_taxa: false,
            ..Default::default()
        };
        let ids = FilterNormalizer::populate_taxon_filter(&tree, &filter).unwrap();
        assert_eq!(ids, HashSet::from([10]));
    }

    #[test]
    fn test_underlying_expansion() {
        let tree = biota_tree();
        let filter = TaxonFilter {
            ids: vec![10],
            include_underlying_taxa: true,
            ..Default::default()
        };
        let ids = FilterNormalizer::populate_taxon_filter(&tree, &filter).unwrap();
        assert_eq!(ids, HashSet::from([10, 20, 21, 30]));
    }

    #[test]
    fn test_biota_root_short_circuits_to_unbounded() {
        let tree = biota_tree();
        let filter = TaxonFilter {
            ids: vec![BIOTA_TAXON_ID, 20],
            include_underlying_taxa: true,
            ..Default::default()
        };
        // Root present: unbounded, regardless of what else is in the set.
        assert!(FilterNormalizer::populate_taxon_filter(&tree, &filter).is_none());
    }

    #[test]
    fn test_taxon_list_merge_and_intersect() {
        let tree = biota_tree();
        let merged = FilterNormalizer::populate_taxon_filter(
            &tree,
            &TaxonFilter {
                ids: vec![20],
                taxon_list_ids: vec![21],
                taxon_list_operator: TaxonListOperator::Merge,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(merged, HashSet::from([20, 21]));

        let intersected = FilterNormalizer::populate_taxon_filter(
            &tree,
            &TaxonFilter {
                ids: vec![20, 21],
                taxon_list_ids: vec![21, 30],
                taxon_list_operator: TaxonListOperator::Intersect,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(intersected, HashSet::from([21]));
    }

    #[test]
    fn test_empty_intersection_stays_empty_not_unbounded() {
        let tree = biota_tree();
        let ids = FilterNormalizer::populate_taxon_filter(
            &tree,
            &TaxonFilter {
                ids: vec![20],
                taxon_list_ids: vec![21],
                taxon_list_operator: TaxonListOperator::Intersect,
                ..Default::default()
            },
        )
        .unwrap();
        // A requested scope that collapses to nothing matches nothing; it
        // must not silently widen into "no restriction".
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_indexed_areas_skip_geometry_cache() {
        let cache = Arc::new(FakeGeometryCache::new());
        let n = normalizer(cache.clone());
        let areas = vec![
            AreaFilterRef {
                area_type: AreaType::County,
                feature_id: "3".into(),
            },
            AreaFilterRef {
                area_type: AreaType::Municipality,
                feature_id: "180".into(),
            },
        ];
        let geo = n.populate_geographic_filter(&areas, false).await.unwrap();
        assert_eq!(geo.county_ids, vec!["3"]);
        assert_eq!(geo.municipality_ids, vec!["180"]);
        assert!(geo.geometries.is_empty());
        assert_eq!(cache.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_force_geometry_search_resolves_indexed_areas() {
        let cache = Arc::new(FakeGeometryCache::new());
        let n = normalizer(cache.clone());
        let areas = vec![AreaFilterRef {
            area_type: AreaType::County,
            feature_id: "3".into(),
        }];
        let geo = n.populate_geographic_filter(&areas, true).await.unwrap();
        assert!(geo.county_ids.is_empty());
        assert_eq!(geo.geometries.len(), 1);
        assert_eq!(cache.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_indexed_area_resolves_to_geometry() {
        let cache = Arc::new(FakeGeometryCache::new());
        let n = normalizer(cache.clone());
        let areas = vec![AreaFilterRef {
            area_type: AreaType::WaterArea,
            feature_id: "5".into(),
        }];
        let geo = n.populate_geographic_filter(&areas, false).await.unwrap();
        assert_eq!(geo.geometries.len(), 1);
    }

    #[tokio::test]
    async fn test_whole_country_sentinel_dropped_entirely() {
        let cache = Arc::new(FakeGeometryCache::new());
        let n = normalizer(cache.clone());
        let areas = vec![AreaFilterRef {
            area_type: AreaType::BirdValidationArea,
            feature_id: WHOLE_COUNTRY_FEATURE_ID.into(),
        }];
        let geo = n.populate_geographic_filter(&areas, false).await.unwrap();
        // Never a geometry call, never an id-list entry.
        assert!(geo.bird_validation_area_ids.is_empty());
        assert!(geo.is_empty());
        assert_eq!(cache.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_bird_validation_areas_kept() {
        let cache = Arc::new(FakeGeometryCache::new());
        let n = normalizer(cache);
        let areas = vec![AreaFilterRef {
            area_type: AreaType::BirdValidationArea,
            feature_id: "17".into(),
        }];
        let geo = n.populate_geographic_filter(&areas, false).await.unwrap();
        assert_eq!(geo.bird_validation_area_ids, vec!["17"]);
    }

    #[tokio::test]
    async fn test_unresolvable_area_skipped_not_fatal() {
        let mut cache = FakeGeometryCache::new();
        cache.fail_feature = Some("99".into());
        let n = normalizer(Arc::new(cache));
        let areas = vec![
            AreaFilterRef {
                area_type: AreaType::WaterArea,
                feature_id: "5".into(),
            },
            AreaFilterRef {
                area_type: AreaType::WaterArea,
                feature_id: "99".into(),
            },
            AreaFilterRef {
                area_type: AreaType::ProtectedNature,
                feature_id: "88".into(),
            },
        ];
        let geo = n.populate_geographic_filter(&areas, false).await.unwrap();
        // One bad area reference must not fail the multi-area filter.
        assert_eq!(geo.geometries.len(), 2);
    }
}
