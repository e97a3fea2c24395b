//! Extended-authorization augmentation.
//!
//! A caller asking for protected observations gets extra visibility from
//! their authority grants: each grant names a taxon scope, a geographic
//! scope, and a protection-level ceiling. Grants are expanded here into
//! [`ExtendedAuthorizationFilter`] clauses the query layer OR-combines with
//! the base filter — a record is visible if it matches the base filter, or
//! if it falls within at least one retained clause. The per-grant ceiling is
//! preserved clause by clause; collapsing grants together would over- or
//! under-expose sensitive records.
//!
//! Authorization failures fail closed: if the user directory is unreachable
//! the caller gets no extended grants and falls back to base-filter-only
//! visibility, never "treat as fully authorized".

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use sightline_core::{
    AreaGeometryCache, AreaType, ExtendedAuthorizationFilter,
    ExtendedAuthorizationGeographicFilter, UserAuthority, UserAuthorityProvider,
    BIOTA_TAXON_ID, WHOLE_COUNTRY_FEATURE_ID,
};

use crate::taxon_cache::TaxonTreeCache;
use crate::taxon_tree::TaxonTree;

/// Builds the usable extended-authorization clauses for a caller.
pub struct AuthorizationBuilder {
    authority_provider: Arc<dyn UserAuthorityProvider>,
    taxon_cache: Arc<TaxonTreeCache>,
    geometry_cache: Arc<dyn AreaGeometryCache>,
}

impl AuthorizationBuilder {
    pub fn new(
        authority_provider: Arc<dyn UserAuthorityProvider>,
        taxon_cache: Arc<TaxonTreeCache>,
        geometry_cache: Arc<dyn AreaGeometryCache>,
    ) -> Self {
        Self {
            authority_provider,
            taxon_cache,
            geometry_cache,
        }
    }

    /// Expand a caller's authority grants into usable filter clauses.
    ///
    /// Grants missing a taxon scope or an area scope are skipped outright —
    /// a grant with either dimension empty grants nothing and must not
    /// silently become "unrestricted". Grants still empty after expansion
    /// are dropped as unusable. Any upstream failure returns an empty list.
    pub async fn build_authorization(&self, user_id: &str) -> Vec<ExtendedAuthorizationFilter> {
        let authorities = match self.authority_provider.get_user_authorities(user_id).await {
            Ok(Some(authorities)) => authorities,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(
                    subsystem = "authorization",
                    user_id = %user_id,
                    error = %e,
                    "user directory unavailable, no extended grants applied"
                );
                return Vec::new();
            }
        };

        let tree = match self.taxon_cache.get().await {
            Ok(tree) => tree,
            Err(e) => {
                warn!(
                    subsystem = "authorization",
                    user_id = %user_id,
                    error = %e,
                    "taxon tree unavailable, no extended grants applied"
                );
                return Vec::new();
            }
        };

        let total = authorities.len();
        let mut clauses = Vec::new();
        for authority in authorities {
            if authority.taxon_ids.is_empty() || authority.areas.is_empty() {
                continue;
            }
            let clause = self.expand_grant(&tree, &authority).await;
            if clause.is_usable() {
                clauses.push(clause);
            }
        }

        debug!(
            subsystem = "authorization",
            user_id = %user_id,
            grant_count = clauses.len(),
            "extended authorization built, {} of {} grants usable",
            clauses.len(),
            total
        );
        clauses
    }

    async fn expand_grant(
        &self,
        tree: &TaxonTree,
        authority: &UserAuthority,
    ) -> ExtendedAuthorizationFilter {
        let taxon_ids: Option<HashSet<i32>> =
            if authority.taxon_ids.contains(&BIOTA_TAXON_ID) {
                None
            } else {
                Some(tree.underlying_taxon_ids(authority.taxon_ids.iter().copied(), true))
            };

        let mut geographic = ExtendedAuthorizationGeographicFilter::default();
        for area in &authority.areas {
            if area.feature_id == WHOLE_COUNTRY_FEATURE_ID
                && area.area_type == AreaType::BirdValidationArea
            {
                geographic.authorized_to_whole_country = true;
                continue;
            }
            match area.area_type {
                AreaType::County => geographic.county_ids.push(area.feature_id.clone()),
                AreaType::Municipality => {
                    geographic.municipality_ids.push(area.feature_id.clone())
                }
                AreaType::Province => geographic.province_ids.push(area.feature_id.clone()),
                AreaType::Parish => geographic.parish_ids.push(area.feature_id.clone()),
                _ => {
                    match self
                        .geometry_cache
                        .get_geometry(area.area_type, &area.feature_id)
                        .await
                    {
                        Ok(Some(geometry)) => geographic.geometries.push(geometry),
                        Ok(None) => {
                            warn!(
                                subsystem = "authorization",
                                area_type = ?area.area_type,
                                feature_id = %area.feature_id,
                                "granted area has no geometry, skipped"
                            );
                        }
                        Err(e) => {
                            warn!(
                                subsystem = "authorization",
                                area_type = ?area.area_type,
                                feature_id = %area.feature_id,
                                error = %e,
                                "granted area geometry unavailable, skipped"
                            );
                        }
                    }
                }
            }
        }

        ExtendedAuthorizationFilter {
            max_protection_level: authority.max_protection_level,
            taxon_ids,
            geographic_areas: geographic,
        }
    }
}
