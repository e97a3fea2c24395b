//! Field-path resolver: dotted path strings to typed record values.
//!
//! Search callers name output columns as dotted field paths. Resolution is
//! a case-insensitive exact match against a fixed table of path →
//! extraction-function entries built once at process start, covering every
//! leaf of the observation record. A dictionary of plain function pointers
//! is used instead of reflection-style path walking: no per-row string
//! parsing, and the table itself documents exactly which paths are public
//! surface.
//!
//! Paths absent from the static table are tested against the dynamic
//! per-project patterns (`project-<id>`, `project-<id>.name|category|url|
//! parameter-<id>`). A dynamic path whose project is missing from the
//! record resolves to `Null` — the field exists but has no value for this
//! record. A path matching neither table nor pattern is a caller error
//! unless the field was marked dynamically created.

use std::borrow::Cow;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use sightline_core::observation::{AreaRef, Observation, VocabularyValue};
use sightline_core::{Error, FieldValue, PropertyFieldDescription, Result};

type Accessor = fn(&Observation) -> FieldValue;

/// Shape check for dynamic per-project paths. Ids embedded in the path are
/// taken from the descriptor's pre-parsed `dynamic_ids`, but the shape is
/// still verified so malformed or renamed dynamic fields fail closed.
static PROJECT_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^project-\d+(\.(name|category|url|parameter-\d+))?$")
        .unwrap_or_else(|e| panic!("invalid project path pattern: {e}"))
});

fn vocab_value(v: Option<&VocabularyValue>) -> FieldValue {
    v.and_then(|v| v.value.clone()).into()
}

fn vocab_id(v: Option<&VocabularyValue>) -> FieldValue {
    v.and_then(|v| v.id).into()
}

fn area_feature_id(a: Option<&AreaRef>) -> FieldValue {
    a.and_then(|a| a.feature_id.clone()).into()
}

fn area_name(a: Option<&AreaRef>) -> FieldValue {
    a.and_then(|a| a.name.clone()).into()
}

/// The static path table. Keys are lowercase; every accessor navigates
/// missing intermediate objects to `Null` instead of panicking.
static FIELD_ACCESSORS: Lazy<HashMap<&'static str, Accessor>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, Accessor> = HashMap::new();

    // ─── Record-level terms ────────────────────────────────────────────
    m.insert("id", |o| o.id.clone().into());
    m.insert("dataproviderid", |o| o.data_provider_id.into());
    m.insert("basisofrecord", |o| vocab_value(o.basis_of_record.as_ref()));
    m.insert("basisofrecord.id", |o| vocab_id(o.basis_of_record.as_ref()));
    m.insert("collectioncode", |o| o.collection_code.clone().into());
    m.insert("collectionid", |o| o.collection_id.clone().into());
    m.insert("institutioncode", |o| vocab_value(o.institution_code.as_ref()));
    m.insert("institutioncode.id", |o| vocab_id(o.institution_code.as_ref()));
    m.insert("institutionid", |o| o.institution_id.clone().into());
    m.insert("datasetid", |o| o.dataset_id.clone().into());
    m.insert("datasetname", |o| o.dataset_name.clone().into());
    m.insert("ownerinstitutioncode", |o| o.owner_institution_code.clone().into());
    m.insert("rightsholder", |o| o.rights_holder.clone().into());
    m.insert("accessrights", |o| vocab_value(o.access_rights.as_ref()));
    m.insert("accessrights.id", |o| vocab_id(o.access_rights.as_ref()));
    m.insert("license", |o| o.license.clone().into());
    m.insert("language", |o| o.language.clone().into());
    m.insert("modified", |o| o.modified.into());
    m.insert("references", |o| o.references.clone().into());
    // Defined exactly once; maps to the record-level Darwin Core term.
    m.insert("type", |o| vocab_value(o.record_type.as_ref()));
    m.insert("type.id", |o| vocab_id(o.record_type.as_ref()));
    m.insert("bibliographiccitation", |o| o.bibliographic_citation.clone().into());
    m.insert("informationwithheld", |o| o.information_withheld.clone().into());
    m.insert("protected", |o| o.protected.into());
    m.insert("sensitive", |o| o.sensitive.into());

    // ─── event.* ───────────────────────────────────────────────────────
    m.insert("event.eventid", |o| o.event.as_ref().and_then(|e| e.event_id.clone()).into());
    m.insert("event.parenteventid", |o| o.event.as_ref().and_then(|e| e.parent_event_id.clone()).into());
    m.insert("event.startdate", |o| o.event.as_ref().and_then(|e| e.start_date).into());
    m.insert("event.enddate", |o| o.event.as_ref().and_then(|e| e.end_date).into());
    m.insert("event.starttime", |o| {
        o.event.as_ref().and_then(|e| e.start_time).map(FieldValue::TimeSpan).unwrap_or(FieldValue::Null)
    });
    m.insert("event.endtime", |o| {
        o.event.as_ref().and_then(|e| e.end_time).map(FieldValue::TimeSpan).unwrap_or(FieldValue::Null)
    });
    m.insert("event.eventremarks", |o| o.event.as_ref().and_then(|e| e.event_remarks.clone()).into());
    m.insert("event.fieldnotes", |o| o.event.as_ref().and_then(|e| e.field_notes.clone()).into());
    m.insert("event.fieldnumber", |o| o.event.as_ref().and_then(|e| e.field_number.clone()).into());
    m.insert("event.habitat", |o| o.event.as_ref().and_then(|e| e.habitat.clone()).into());
    m.insert("event.samplesizeunit", |o| o.event.as_ref().and_then(|e| e.sample_size_unit.clone()).into());
    m.insert("event.samplesizevalue", |o| o.event.as_ref().and_then(|e| e.sample_size_value.clone()).into());
    m.insert("event.samplingeffort", |o| o.event.as_ref().and_then(|e| e.sampling_effort.clone()).into());
    m.insert("event.samplingprotocol", |o| o.event.as_ref().and_then(|e| e.sampling_protocol.clone()).into());
    m.insert("event.verbatimeventdate", |o| o.event.as_ref().and_then(|e| e.verbatim_event_date.clone()).into());
    m.insert("event.discoverymethod", |o| vocab_value(o.event.as_ref().and_then(|e| e.discovery_method.as_ref())));
    m.insert("event.discoverymethod.id", |o| vocab_id(o.event.as_ref().and_then(|e| e.discovery_method.as_ref())));

    // ─── occurrence.* ──────────────────────────────────────────────────
    m.insert("occurrence.occurrenceid", |o| o.occurrence.as_ref().and_then(|c| c.occurrence_id.clone()).into());
    m.insert("occurrence.catalognumber", |o| o.occurrence.as_ref().and_then(|c| c.catalog_number.clone()).into());
    m.insert("occurrence.activity", |o| vocab_value(o.occurrence.as_ref().and_then(|c| c.activity.as_ref())));
    m.insert("occurrence.activity.id", |o| vocab_id(o.occurrence.as_ref().and_then(|c| c.activity.as_ref())));
    m.insert("occurrence.activity.value", |o| vocab_value(o.occurrence.as_ref().and_then(|c| c.activity.as_ref())));
    m.insert("occurrence.behavior", |o| vocab_value(o.occurrence.as_ref().and_then(|c| c.behavior.as_ref())));
    m.insert("occurrence.behavior.id", |o| vocab_id(o.occurrence.as_ref().and_then(|c| c.behavior.as_ref())));
    m.insert("occurrence.biotope", |o| vocab_value(o.occurrence.as_ref().and_then(|c| c.biotope.as_ref())));
    m.insert("occurrence.biotope.id", |o| vocab_id(o.occurrence.as_ref().and_then(|c| c.biotope.as_ref())));
    m.insert("occurrence.biotopedescription", |o| o.occurrence.as_ref().and_then(|c| c.biotope_description.clone()).into());
    m.insert("occurrence.lifestage", |o| vocab_value(o.occurrence.as_ref().and_then(|c| c.life_stage.as_ref())));
    m.insert("occurrence.lifestage.id", |o| vocab_id(o.occurrence.as_ref().and_then(|c| c.life_stage.as_ref())));
    m.insert("occurrence.lifestage.value", |o| vocab_value(o.occurrence.as_ref().and_then(|c| c.life_stage.as_ref())));
    m.insert("occurrence.sex", |o| vocab_value(o.occurrence.as_ref().and_then(|c| c.sex.as_ref())));
    m.insert("occurrence.sex.id", |o| vocab_id(o.occurrence.as_ref().and_then(|c| c.sex.as_ref())));
    m.insert("occurrence.sex.value", |o| vocab_value(o.occurrence.as_ref().and_then(|c| c.sex.as_ref())));
    m.insert("occurrence.reproductivecondition", |o| vocab_value(o.occurrence.as_ref().and_then(|c| c.reproductive_condition.as_ref())));
    m.insert("occurrence.reproductivecondition.id", |o| vocab_id(o.occurrence.as_ref().and_then(|c| c.reproductive_condition.as_ref())));
    m.insert("occurrence.occurrencestatus", |o| vocab_value(o.occurrence.as_ref().and_then(|c| c.occurrence_status.as_ref())));
    m.insert("occurrence.occurrencestatus.id", |o| vocab_id(o.occurrence.as_ref().and_then(|c| c.occurrence_status.as_ref())));
    m.insert("occurrence.establishmentmeans", |o| vocab_value(o.occurrence.as_ref().and_then(|c| c.establishment_means.as_ref())));
    m.insert("occurrence.establishmentmeans.id", |o| vocab_id(o.occurrence.as_ref().and_then(|c| c.establishment_means.as_ref())));
    m.insert("occurrence.organismquantity", |o| o.occurrence.as_ref().and_then(|c| c.organism_quantity.clone()).into());
    m.insert("occurrence.organismquantityint", |o| o.occurrence.as_ref().and_then(|c| c.organism_quantity_int).into());
    m.insert("occurrence.organismquantityunit", |o| vocab_value(o.occurrence.as_ref().and_then(|c| c.organism_quantity_unit.as_ref())));
    m.insert("occurrence.individualcount", |o| o.occurrence.as_ref().and_then(|c| c.individual_count.clone()).into());
    m.insert("occurrence.isnaturaloccurrence", |o| o.occurrence.as_ref().and_then(|c| c.is_natural_occurrence).into());
    m.insert("occurrence.isneverfoundobservation", |o| o.occurrence.as_ref().and_then(|c| c.is_never_found_observation).into());
    m.insert("occurrence.isnotrediscoveredobservation", |o| o.occurrence.as_ref().and_then(|c| c.is_not_rediscovered_observation).into());
    m.insert("occurrence.ispositiveobservation", |o| o.occurrence.as_ref().and_then(|c| c.is_positive_observation).into());
    m.insert("occurrence.occurrenceremarks", |o| o.occurrence.as_ref().and_then(|c| c.occurrence_remarks.clone()).into());
    m.insert("occurrence.recordedby", |o| o.occurrence.as_ref().and_then(|c| c.recorded_by.clone()).into());
    m.insert("occurrence.reportedby", |o| o.occurrence.as_ref().and_then(|c| c.reported_by.clone()).into());
    m.insert("occurrence.reporteddate", |o| o.occurrence.as_ref().and_then(|c| c.reported_date).into());
    m.insert("occurrence.url", |o| o.occurrence.as_ref().and_then(|c| c.url.clone()).into());
    m.insert("occurrence.associatedmedia", |o| o.occurrence.as_ref().and_then(|c| c.associated_media.clone()).into());
    m.insert("occurrence.associatedreferences", |o| o.occurrence.as_ref().and_then(|c| c.associated_references.clone()).into());
    m.insert("occurrence.associatedtaxa", |o| o.occurrence.as_ref().and_then(|c| c.associated_taxa.clone()).into());
    m.insert("occurrence.disposition", |o| o.occurrence.as_ref().and_then(|c| c.disposition.clone()).into());
    m.insert("occurrence.preparations", |o| o.occurrence.as_ref().and_then(|c| c.preparations.clone()).into());
    m.insert("occurrence.protectionlevel", |o| o.occurrence.as_ref().and_then(|c| c.protection_level).into());
    m.insert("occurrence.sensitivitycategory", |o| o.occurrence.as_ref().and_then(|c| c.sensitivity_category).into());
    m.insert("occurrence.substratedescription", |o| o.occurrence.as_ref().and_then(|c| c.substrate_description.clone()).into());

    // ─── location.* ────────────────────────────────────────────────────
    m.insert("location.locationid", |o| o.location.as_ref().and_then(|l| l.location_id.clone()).into());
    m.insert("location.locality", |o| o.location.as_ref().and_then(|l| l.locality.clone()).into());
    m.insert("location.locationremarks", |o| o.location.as_ref().and_then(|l| l.location_remarks.clone()).into());
    m.insert("location.county", |o| area_name(o.location.as_ref().and_then(|l| l.county.as_ref())));
    m.insert("location.county.featureid", |o| area_feature_id(o.location.as_ref().and_then(|l| l.county.as_ref())));
    m.insert("location.county.name", |o| area_name(o.location.as_ref().and_then(|l| l.county.as_ref())));
    m.insert("location.municipality", |o| area_name(o.location.as_ref().and_then(|l| l.municipality.as_ref())));
    m.insert("location.municipality.featureid", |o| area_feature_id(o.location.as_ref().and_then(|l| l.municipality.as_ref())));
    m.insert("location.municipality.name", |o| area_name(o.location.as_ref().and_then(|l| l.municipality.as_ref())));
    m.insert("location.province", |o| area_name(o.location.as_ref().and_then(|l| l.province.as_ref())));
    m.insert("location.province.featureid", |o| area_feature_id(o.location.as_ref().and_then(|l| l.province.as_ref())));
    m.insert("location.province.name", |o| area_name(o.location.as_ref().and_then(|l| l.province.as_ref())));
    m.insert("location.parish", |o| area_name(o.location.as_ref().and_then(|l| l.parish.as_ref())));
    m.insert("location.parish.featureid", |o| area_feature_id(o.location.as_ref().and_then(|l| l.parish.as_ref())));
    m.insert("location.parish.name", |o| area_name(o.location.as_ref().and_then(|l| l.parish.as_ref())));
    m.insert("location.country", |o| vocab_value(o.location.as_ref().and_then(|l| l.country.as_ref())));
    m.insert("location.country.id", |o| vocab_id(o.location.as_ref().and_then(|l| l.country.as_ref())));
    m.insert("location.countrycode", |o| o.location.as_ref().and_then(|l| l.country_code.clone()).into());
    m.insert("location.continent", |o| vocab_value(o.location.as_ref().and_then(|l| l.continent.as_ref())));
    m.insert("location.continent.id", |o| vocab_id(o.location.as_ref().and_then(|l| l.continent.as_ref())));
    m.insert("location.decimallatitude", |o| o.location.as_ref().and_then(|l| l.decimal_latitude).into());
    m.insert("location.decimallongitude", |o| o.location.as_ref().and_then(|l| l.decimal_longitude).into());
    m.insert("location.coordinateuncertaintyinmeters", |o| o.location.as_ref().and_then(|l| l.coordinate_uncertainty_in_meters).into());
    m.insert("location.geodeticdatum", |o| o.location.as_ref().and_then(|l| l.geodetic_datum.clone()).into());
    m.insert("location.georeferencedby", |o| o.location.as_ref().and_then(|l| l.georeferenced_by.clone()).into());
    m.insert("location.georeferenceddate", |o| o.location.as_ref().and_then(|l| l.georeferenced_date.clone()).into());
    m.insert("location.georeferenceremarks", |o| o.location.as_ref().and_then(|l| l.georeference_remarks.clone()).into());
    m.insert("location.maximumdepthinmeters", |o| o.location.as_ref().and_then(|l| l.maximum_depth_in_meters).into());
    m.insert("location.minimumdepthinmeters", |o| o.location.as_ref().and_then(|l| l.minimum_depth_in_meters).into());
    m.insert("location.maximumelevationinmeters", |o| o.location.as_ref().and_then(|l| l.maximum_elevation_in_meters).into());
    m.insert("location.minimumelevationinmeters", |o| o.location.as_ref().and_then(|l| l.minimum_elevation_in_meters).into());
    m.insert("location.waterbody", |o| o.location.as_ref().and_then(|l| l.water_body.clone()).into());
    m.insert("location.verbatimlatitude", |o| o.location.as_ref().and_then(|l| l.verbatim_latitude.clone()).into());
    m.insert("location.verbatimlongitude", |o| o.location.as_ref().and_then(|l| l.verbatim_longitude.clone()).into());

    // ─── taxon.* ───────────────────────────────────────────────────────
    m.insert("taxon.id", |o| o.taxon.as_ref().and_then(|t| t.id).into());
    m.insert("taxon.scientificname", |o| o.taxon.as_ref().and_then(|t| t.scientific_name.clone()).into());
    m.insert("taxon.scientificnameauthorship", |o| o.taxon.as_ref().and_then(|t| t.scientific_name_authorship.clone()).into());
    m.insert("taxon.vernacularname", |o| o.taxon.as_ref().and_then(|t| t.vernacular_name.clone()).into());
    m.insert("taxon.taxonrank", |o| o.taxon.as_ref().and_then(|t| t.taxon_rank.clone()).into());
    m.insert("taxon.kingdom", |o| o.taxon.as_ref().and_then(|t| t.kingdom.clone()).into());
    m.insert("taxon.phylum", |o| o.taxon.as_ref().and_then(|t| t.phylum.clone()).into());
    m.insert("taxon.class", |o| o.taxon.as_ref().and_then(|t| t.class.clone()).into());
    m.insert("taxon.order", |o| o.taxon.as_ref().and_then(|t| t.order.clone()).into());
    m.insert("taxon.family", |o| o.taxon.as_ref().and_then(|t| t.family.clone()).into());
    m.insert("taxon.genus", |o| o.taxon.as_ref().and_then(|t| t.genus.clone()).into());
    m.insert("taxon.higherclassification", |o| o.taxon.as_ref().and_then(|t| t.higher_classification.clone()).into());
    m.insert("taxon.nomenclaturalstatus", |o| o.taxon.as_ref().and_then(|t| t.nomenclatural_status.clone()).into());
    m.insert("taxon.taxonomicstatus", |o| o.taxon.as_ref().and_then(|t| t.taxonomic_status.clone()).into());
    m.insert("taxon.taxonremarks", |o| o.taxon.as_ref().and_then(|t| t.taxon_remarks.clone()).into());
    m.insert("taxon.attributes.organismgroup", |o| o.taxon.as_ref().and_then(|t| t.attributes.as_ref()).and_then(|a| a.organism_group.clone()).into());
    m.insert("taxon.attributes.protectionlevel", |o| vocab_value(o.taxon.as_ref().and_then(|t| t.attributes.as_ref()).and_then(|a| a.protection_level.as_ref())));
    m.insert("taxon.attributes.protectionlevel.id", |o| vocab_id(o.taxon.as_ref().and_then(|t| t.attributes.as_ref()).and_then(|a| a.protection_level.as_ref())));
    m.insert("taxon.attributes.protectionlevel.value", |o| vocab_value(o.taxon.as_ref().and_then(|t| t.attributes.as_ref()).and_then(|a| a.protection_level.as_ref())));
    m.insert("taxon.attributes.redlistcategory", |o| o.taxon.as_ref().and_then(|t| t.attributes.as_ref()).and_then(|a| a.redlist_category.clone()).into());
    m.insert("taxon.attributes.actionplan", |o| o.taxon.as_ref().and_then(|t| t.attributes.as_ref()).and_then(|a| a.action_plan.clone()).into());
    m.insert("taxon.attributes.disturbanceradius", |o| o.taxon.as_ref().and_then(|t| t.attributes.as_ref()).and_then(|a| a.disturbance_radius).into());
    m.insert("taxon.attributes.natura2000", |o| o.taxon.as_ref().and_then(|t| t.attributes.as_ref()).and_then(|a| a.natura2000).into());
    m.insert("taxon.attributes.protectedbylaw", |o| o.taxon.as_ref().and_then(|t| t.attributes.as_ref()).and_then(|a| a.protected_by_law).into());
    m.insert("taxon.attributes.swedishoccurrence", |o| o.taxon.as_ref().and_then(|t| t.attributes.as_ref()).and_then(|a| a.swedish_occurrence.clone()).into());
    m.insert("taxon.attributes.swedishhistory", |o| o.taxon.as_ref().and_then(|t| t.attributes.as_ref()).and_then(|a| a.swedish_history.clone()).into());

    // ─── identification.* ──────────────────────────────────────────────
    m.insert("identification.verified", |o| o.identification.as_ref().and_then(|i| i.verified).into());
    m.insert("identification.verificationstatus", |o| vocab_value(o.identification.as_ref().and_then(|i| i.verification_status.as_ref())));
    m.insert("identification.verificationstatus.id", |o| vocab_id(o.identification.as_ref().and_then(|i| i.verification_status.as_ref())));
    m.insert("identification.verificationstatus.value", |o| vocab_value(o.identification.as_ref().and_then(|i| i.verification_status.as_ref())));
    m.insert("identification.confirmedby", |o| o.identification.as_ref().and_then(|i| i.confirmed_by.clone()).into());
    m.insert("identification.confirmeddate", |o| o.identification.as_ref().and_then(|i| i.confirmed_date.clone()).into());
    m.insert("identification.dateidentified", |o| o.identification.as_ref().and_then(|i| i.date_identified.clone()).into());
    m.insert("identification.identifiedby", |o| o.identification.as_ref().and_then(|i| i.identified_by.clone()).into());
    m.insert("identification.identificationremarks", |o| o.identification.as_ref().and_then(|i| i.identification_remarks.clone()).into());
    m.insert("identification.identificationreferences", |o| o.identification.as_ref().and_then(|i| i.identification_references.clone()).into());
    m.insert("identification.uncertainidentification", |o| o.identification.as_ref().and_then(|i| i.uncertain_identification).into());
    m.insert("identification.determinationmethod", |o| vocab_value(o.identification.as_ref().and_then(|i| i.determination_method.as_ref())));
    m.insert("identification.determinationmethod.id", |o| vocab_id(o.identification.as_ref().and_then(|i| i.determination_method.as_ref())));
    m.insert("identification.verifiedby", |o| o.identification.as_ref().and_then(|i| i.verified_by.clone()).into());

    // ─── geologicalcontext.* ───────────────────────────────────────────
    // Defined exactly once; maps to the record's geological context block.
    m.insert("geologicalcontext.geologicalcontextid", |o| o.geological_context.as_ref().and_then(|g| g.geological_context_id.clone()).into());
    m.insert("geologicalcontext.bed", |o| o.geological_context.as_ref().and_then(|g| g.bed.clone()).into());
    m.insert("geologicalcontext.formation", |o| o.geological_context.as_ref().and_then(|g| g.formation.clone()).into());
    m.insert("geologicalcontext.group", |o| o.geological_context.as_ref().and_then(|g| g.group.clone()).into());
    m.insert("geologicalcontext.member", |o| o.geological_context.as_ref().and_then(|g| g.member.clone()).into());
    m.insert("geologicalcontext.earliestageorloweststage", |o| o.geological_context.as_ref().and_then(|g| g.earliest_age_or_lowest_stage.clone()).into());
    m.insert("geologicalcontext.latestageorhigheststage", |o| o.geological_context.as_ref().and_then(|g| g.latest_age_or_highest_stage.clone()).into());
    m.insert("geologicalcontext.earliesteonorlowesteonothem", |o| o.geological_context.as_ref().and_then(|g| g.earliest_eon_or_lowest_eonothem.clone()).into());
    m.insert("geologicalcontext.latesteonorhighesteonothem", |o| o.geological_context.as_ref().and_then(|g| g.latest_eon_or_highest_eonothem.clone()).into());
    m.insert("geologicalcontext.earliestepochorlowestseries", |o| o.geological_context.as_ref().and_then(|g| g.earliest_epoch_or_lowest_series.clone()).into());
    m.insert("geologicalcontext.latestepochorhighestseries", |o| o.geological_context.as_ref().and_then(|g| g.latest_epoch_or_highest_series.clone()).into());
    m.insert("geologicalcontext.earliesteraorlowesterathem", |o| o.geological_context.as_ref().and_then(|g| g.earliest_era_or_lowest_erathem.clone()).into());
    m.insert("geologicalcontext.latesteraorhighesterathem", |o| o.geological_context.as_ref().and_then(|g| g.latest_era_or_highest_erathem.clone()).into());
    m.insert("geologicalcontext.earliestperiodorlowestsystem", |o| o.geological_context.as_ref().and_then(|g| g.earliest_period_or_lowest_system.clone()).into());
    m.insert("geologicalcontext.latestperiodorhighestsystem", |o| o.geological_context.as_ref().and_then(|g| g.latest_period_or_highest_system.clone()).into());
    m.insert("geologicalcontext.highestbiostratigraphiczone", |o| o.geological_context.as_ref().and_then(|g| g.highest_biostratigraphic_zone.clone()).into());
    m.insert("geologicalcontext.lowestbiostratigraphiczone", |o| o.geological_context.as_ref().and_then(|g| g.lowest_biostratigraphic_zone.clone()).into());

    // ─── organism.* ────────────────────────────────────────────────────
    m.insert("organism.organismid", |o| o.organism.as_ref().and_then(|g| g.organism_id.clone()).into());
    m.insert("organism.organismname", |o| o.organism.as_ref().and_then(|g| g.organism_name.clone()).into());
    m.insert("organism.organismscope", |o| o.organism.as_ref().and_then(|g| g.organism_scope.clone()).into());
    m.insert("organism.associatedorganisms", |o| o.organism.as_ref().and_then(|g| g.associated_organisms.clone()).into());
    m.insert("organism.previousidentifications", |o| o.organism.as_ref().and_then(|g| g.previous_identifications.clone()).into());
    m.insert("organism.organismremarks", |o| o.organism.as_ref().and_then(|g| g.organism_remarks.clone()).into());

    m
});

/// True when the path (case-insensitive) is in the static table.
pub fn is_mapped(path: &str) -> bool {
    FIELD_ACCESSORS.contains_key(normalize_path(path).as_ref())
}

fn normalize_path(path: &str) -> Cow<'_, str> {
    if path.chars().any(|c| c.is_ascii_uppercase()) {
        Cow::Owned(path.to_ascii_lowercase())
    } else {
        Cow::Borrowed(path)
    }
}

/// Resolve one described field against a record.
///
/// Lookup order: static table, then the dynamic per-project patterns, then
/// `Null` for fields marked dynamically created. Anything else is a caller
/// error surfaced as [`Error::FieldNotMapped`] so the query layer can
/// reject the request instead of silently dropping a column.
pub fn resolve(field: &PropertyFieldDescription, record: &Observation) -> Result<FieldValue> {
    let path = normalize_path(&field.path);

    if let Some(accessor) = FIELD_ACCESSORS.get(path.as_ref()) {
        return Ok(accessor(record));
    }

    if PROJECT_PATH_RE.is_match(&path) {
        return Ok(resolve_project_field(field, &path, record));
    }

    if field.is_dynamic_created {
        return Ok(FieldValue::Null);
    }

    Err(Error::FieldNotMapped(path.into_owned()))
}

/// Resolve a field and format it for fixed-column output.
///
/// Formatting follows the field's declared data type: typed variants format
/// invariantly, string values (dynamic project parameters) are narrowed to
/// the declared type when they parse. `Null` renders as the empty string.
pub fn resolve_as_string(
    field: &PropertyFieldDescription,
    record: &Observation,
) -> Result<String> {
    Ok(resolve(field, record)?.format_as(field.data_type))
}

/// Resolve an ordered list of output fields against one record.
///
/// All-or-nothing: one unmapped, non-dynamic path rejects the whole request,
/// since callers build fixed-column output (CSV headers) from the same list
/// and a silently dropped column would misalign every row.
pub fn resolve_output_fields(
    record: &Observation,
    fields: &[PropertyFieldDescription],
) -> Result<Vec<(String, FieldValue)>> {
    fields
        .iter()
        .map(|field| Ok((field.path.clone(), resolve(field, record)?)))
        .collect()
}

/// Resolve a shape-checked dynamic project path.
///
/// The project and parameter ids come from the descriptor's pre-parsed
/// `dynamic_ids`, never re-parsed from the string per row. A record with no
/// matching project resolves to `Null`: the field exists but has no value
/// for this record.
fn resolve_project_field(
    field: &PropertyFieldDescription,
    path: &str,
    record: &Observation,
) -> FieldValue {
    let Some(&project_id) = field.dynamic_ids.first() else {
        return FieldValue::Null;
    };
    let Some(project) = record.project_by_id(project_id) else {
        return FieldValue::Null;
    };

    match path.split_once('.').map(|(_, sub)| sub) {
        // Bare `project-<id>` resolves to the project name.
        None | Some("name") => project.name.clone().into(),
        Some("category") => project.category.clone().into(),
        Some("url") => project.url.clone().into(),
        Some(sub) if sub.starts_with("parameter-") => {
            let Some(&parameter_id) = field.dynamic_ids.get(1) else {
                return FieldValue::Null;
            };
            project
                .parameters
                .iter()
                .find(|p| p.id == parameter_id)
                .and_then(|p| p.value.clone())
                .into()
        }
        Some(_) => FieldValue::Null,
    }
}
