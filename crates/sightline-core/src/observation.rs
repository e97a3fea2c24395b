//! The processed observation record.
//!
//! This is the shape the document store hands back for each species
//! sighting. Every leaf is optional: records arrive from dozens of source
//! providers with wildly different completeness, and the field-path resolver
//! must navigate any missing intermediate object without failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A controlled-vocabulary value: a stable numeric id plus its label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyValue {
    pub id: Option<i32>,
    pub value: Option<String>,
}

/// A named administrative area the record falls within.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRef {
    pub feature_id: Option<String>,
    pub name: Option<String>,
}

/// One processed species-sighting record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    // Record-level (Darwin Core record terms)
    pub id: Option<String>,
    pub data_provider_id: Option<i32>,
    pub basis_of_record: Option<VocabularyValue>,
    pub collection_code: Option<String>,
    pub collection_id: Option<String>,
    pub institution_code: Option<VocabularyValue>,
    pub institution_id: Option<String>,
    pub dataset_id: Option<String>,
    pub dataset_name: Option<String>,
    pub owner_institution_code: Option<String>,
    pub rights_holder: Option<String>,
    pub access_rights: Option<VocabularyValue>,
    pub license: Option<String>,
    pub language: Option<String>,
    pub modified: Option<DateTime<Utc>>,
    pub references: Option<String>,
    pub record_type: Option<VocabularyValue>,
    pub bibliographic_citation: Option<String>,
    pub information_withheld: Option<String>,
    pub protected: Option<bool>,
    pub sensitive: Option<bool>,

    // Nested sections
    pub event: Option<Event>,
    pub occurrence: Option<Occurrence>,
    pub location: Option<Location>,
    pub taxon: Option<TaxonInfo>,
    pub identification: Option<Identification>,
    pub geological_context: Option<GeologicalContext>,
    pub organism: Option<Organism>,
    pub projects: Option<Vec<Project>>,
}

/// The sampling event that produced the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: Option<String>,
    pub parent_event_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Seconds past midnight, local time.
    pub start_time: Option<i64>,
    /// Seconds past midnight, local time.
    pub end_time: Option<i64>,
    pub event_remarks: Option<String>,
    pub field_notes: Option<String>,
    pub field_number: Option<String>,
    pub habitat: Option<String>,
    pub sample_size_unit: Option<String>,
    pub sample_size_value: Option<String>,
    pub sampling_effort: Option<String>,
    pub sampling_protocol: Option<String>,
    pub verbatim_event_date: Option<String>,
    pub discovery_method: Option<VocabularyValue>,
}

/// The occurrence itself: what was seen, how many, in what state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub occurrence_id: Option<String>,
    pub catalog_number: Option<String>,
    pub activity: Option<VocabularyValue>,
    pub behavior: Option<VocabularyValue>,
    pub biotope: Option<VocabularyValue>,
    pub biotope_description: Option<String>,
    pub life_stage: Option<VocabularyValue>,
    pub sex: Option<VocabularyValue>,
    pub reproductive_condition: Option<VocabularyValue>,
    pub occurrence_status: Option<VocabularyValue>,
    pub establishment_means: Option<VocabularyValue>,
    pub organism_quantity: Option<String>,
    pub organism_quantity_int: Option<i64>,
    pub organism_quantity_unit: Option<VocabularyValue>,
    pub individual_count: Option<String>,
    pub is_natural_occurrence: Option<bool>,
    pub is_never_found_observation: Option<bool>,
    pub is_not_rediscovered_observation: Option<bool>,
    pub is_positive_observation: Option<bool>,
    pub occurrence_remarks: Option<String>,
    pub recorded_by: Option<String>,
    pub reported_by: Option<String>,
    pub reported_date: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub associated_media: Option<String>,
    pub associated_references: Option<String>,
    pub associated_taxa: Option<String>,
    pub disposition: Option<String>,
    pub preparations: Option<String>,
    pub protection_level: Option<i32>,
    pub sensitivity_category: Option<i32>,
    pub substrate_description: Option<String>,
}

/// Where the sighting happened.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub location_id: Option<String>,
    pub locality: Option<String>,
    pub location_remarks: Option<String>,
    pub county: Option<AreaRef>,
    pub municipality: Option<AreaRef>,
    pub province: Option<AreaRef>,
    pub parish: Option<AreaRef>,
    pub country: Option<VocabularyValue>,
    pub country_code: Option<String>,
    pub continent: Option<VocabularyValue>,
    pub decimal_latitude: Option<f64>,
    pub decimal_longitude: Option<f64>,
    pub coordinate_uncertainty_in_meters: Option<i32>,
    pub geodetic_datum: Option<String>,
    pub georeferenced_by: Option<String>,
    pub georeferenced_date: Option<String>,
    pub georeference_remarks: Option<String>,
    pub maximum_depth_in_meters: Option<f64>,
    pub minimum_depth_in_meters: Option<f64>,
    pub maximum_elevation_in_meters: Option<f64>,
    pub minimum_elevation_in_meters: Option<f64>,
    pub water_body: Option<String>,
    pub verbatim_latitude: Option<String>,
    pub verbatim_longitude: Option<String>,
}

/// Resolved taxonomy for the sighted organism.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonInfo {
    pub id: Option<i32>,
    pub scientific_name: Option<String>,
    pub scientific_name_authorship: Option<String>,
    pub vernacular_name: Option<String>,
    pub taxon_rank: Option<String>,
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub higher_classification: Option<String>,
    pub nomenclatural_status: Option<String>,
    pub taxonomic_status: Option<String>,
    pub taxon_remarks: Option<String>,
    pub attributes: Option<TaxonAttributes>,
}

/// National checklist attributes attached to the taxon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonAttributes {
    pub organism_group: Option<String>,
    pub protection_level: Option<VocabularyValue>,
    pub redlist_category: Option<String>,
    pub action_plan: Option<String>,
    pub disturbance_radius: Option<i32>,
    pub natura2000: Option<bool>,
    pub protected_by_law: Option<bool>,
    pub swedish_occurrence: Option<String>,
    pub swedish_history: Option<String>,
}

/// Who determined the species and how certain they were.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    pub verified: Option<bool>,
    pub verification_status: Option<VocabularyValue>,
    pub confirmed_by: Option<String>,
    pub confirmed_date: Option<String>,
    pub date_identified: Option<String>,
    pub identified_by: Option<String>,
    pub identification_remarks: Option<String>,
    pub identification_references: Option<String>,
    pub uncertain_identification: Option<bool>,
    pub determination_method: Option<VocabularyValue>,
    pub verified_by: Option<String>,
}

/// Geological context for paleo records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeologicalContext {
    pub geological_context_id: Option<String>,
    pub bed: Option<String>,
    pub formation: Option<String>,
    pub group: Option<String>,
    pub member: Option<String>,
    pub earliest_age_or_lowest_stage: Option<String>,
    pub latest_age_or_highest_stage: Option<String>,
    pub earliest_eon_or_lowest_eonothem: Option<String>,
    pub latest_eon_or_highest_eonothem: Option<String>,
    pub earliest_epoch_or_lowest_series: Option<String>,
    pub latest_epoch_or_highest_series: Option<String>,
    pub earliest_era_or_lowest_erathem: Option<String>,
    pub latest_era_or_highest_erathem: Option<String>,
    pub earliest_period_or_lowest_system: Option<String>,
    pub latest_period_or_highest_system: Option<String>,
    pub highest_biostratigraphic_zone: Option<String>,
    pub lowest_biostratigraphic_zone: Option<String>,
}

/// The individual organism, when tracked across observations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organism {
    pub organism_id: Option<String>,
    pub organism_name: Option<String>,
    pub organism_scope: Option<String>,
    pub associated_organisms: Option<String>,
    pub previous_identifications: Option<String>,
    pub organism_remarks: Option<String>,
}

/// A source-provider project the record was collected under.
///
/// Projects carry a variable-length list of typed parameters; these surface
/// as dynamically created output fields (`project-<id>.parameter-<id>`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i32,
    pub name: Option<String>,
    pub category: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub is_public: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parameters: Vec<ProjectParameter>,
}

/// One typed parameter captured for a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectParameter {
    pub id: i32,
    pub name: Option<String>,
    pub value: Option<String>,
    pub unit: Option<String>,
    pub data_type: Option<String>,
    pub description: Option<String>,
}

impl Observation {
    /// Find a project on this record by its numeric id.
    pub fn project_by_id(&self, project_id: i32) -> Option<&Project> {
        self.projects
            .as_ref()?
            .iter()
            .find(|p| p.id == project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_is_fully_empty() {
        let obs = Observation::default();
        assert!(obs.event.is_none());
        assert!(obs.occurrence.is_none());
        assert!(obs.project_by_id(7).is_none());
    }

    #[test]
    fn test_project_lookup_by_id() {
        let obs = Observation {
            projects: Some(vec![
                Project {
                    id: 7,
                    name: Some("Bird atlas".into()),
                    ..Default::default()
                },
                Project {
                    id: 9,
                    ..Default::default()
                },
            ]),
            ..Default::default()
        };
        assert_eq!(
            obs.project_by_id(7).and_then(|p| p.name.as_deref()),
            Some("Bird atlas")
        );
        assert!(obs.project_by_id(8).is_none());
    }

    #[test]
    fn test_record_roundtrips_through_serde() {
        let obs = Observation {
            id: Some("obs:1".into()),
            occurrence: Some(Occurrence {
                life_stage: Some(VocabularyValue {
                    id: Some(3),
                    value: Some("adult".into()),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let json = serde_json::to_string(&obs).unwrap();
        let back: Observation = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.occurrence
                .unwrap()
                .life_stage
                .unwrap()
                .value
                .as_deref(),
            Some("adult")
        );
    }
}
