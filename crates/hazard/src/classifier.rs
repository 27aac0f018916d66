//! Unit Classifier: geologic formation codes → hazard category lists

use std::collections::BTreeSet;

use geohaz_core::vector::FeatureCollection;
use serde::Serialize;
use tracing::debug;

use crate::catalog::{HazardCategory, RuleCatalog};
use crate::error::{HazardError, Result};

/// Default attribute holding the formation code
pub const DEFAULT_UNIT_FIELD: &str = "FMT";

/// Matched unit codes per hazard category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnitClassification {
    pub rock: Vec<String>,
    pub soil: Vec<String>,
    pub landslide: Vec<String>,
}

impl UnitClassification {
    pub fn get(&self, category: HazardCategory) -> &[String] {
        match category {
            HazardCategory::Rock => &self.rock,
            HazardCategory::Soil => &self.soil,
            HazardCategory::Landslide => &self.landslide,
        }
    }

    fn get_mut(&mut self, category: HazardCategory) -> &mut Vec<String> {
        match category {
            HazardCategory::Rock => &mut self.rock,
            HazardCategory::Soil => &mut self.soil,
            HazardCategory::Landslide => &mut self.landslide,
        }
    }

    /// True when no code matched any category
    pub fn is_empty(&self) -> bool {
        self.rock.is_empty() && self.soil.is_empty() && self.landslide.is_empty()
    }
}

/// Sorted distinct string values of `field` across all features.
///
/// Null and non-string values are skipped. An empty collection yields an
/// empty list; a non-empty collection without the field is an error.
pub fn distinct_units(features: &FeatureCollection, field: &str) -> Result<Vec<String>> {
    if !features.is_empty() && !features.has_field(field) {
        return Err(HazardError::MissingField {
            field: field.to_string(),
            dataset: "geology features".to_string(),
        });
    }

    let units: BTreeSet<&str> = features.iter().filter_map(|f| f.get_str(field)).collect();
    Ok(units.into_iter().map(str::to_string).collect())
}

/// Assign each code to every category with a matching rule.
///
/// Codes are visited in sorted order, so each list preserves first-match
/// order from the sorted input. Codes matching several rules of one
/// category appear once; codes matching nothing are left out.
pub fn classify_units<S: AsRef<str>>(codes: &[S], catalog: &RuleCatalog) -> UnitClassification {
    let sorted: BTreeSet<&str> = codes.iter().map(AsRef::as_ref).collect();
    let mut result = UnitClassification::default();

    for code in sorted {
        for rule in catalog.rules() {
            if !rule.matches(code) {
                continue;
            }
            let list = result.get_mut(rule.category);
            if !list.iter().any(|c| c == code) {
                list.push(code.to_string());
            }
        }
    }

    debug!(
        rock = result.rock.len(),
        soil = result.soil.len(),
        landslide = result.landslide.len(),
        "classified geologic units"
    );
    result
}
