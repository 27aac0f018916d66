//! Declarative rule catalog mapping geologic unit codes to hazard categories
//!
//! A rule matches a formation code when its pattern occurs anywhere in the
//! code. Catalogs are plain JSON documents:
//!
//! ```json
//! { "rules": [
//!     { "pattern": "Ta", "category": "rock", "case_insensitive": true },
//!     { "pattern": "Qls", "category": "landslide", "description": "Landslide deposits" }
//! ] }
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HazardError, Result};

/// Hazard category a geologic unit can fall into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardCategory {
    /// Problematic (expansive or collapsible) bedrock
    Rock,
    /// Problematic surficial deposits
    Soil,
    /// Landslide-prone deposits and formations
    Landslide,
}

impl HazardCategory {
    pub const ALL: [HazardCategory; 3] = [HazardCategory::Rock, HazardCategory::Soil, HazardCategory::Landslide];

    pub fn as_str(&self) -> &'static str {
        match self {
            HazardCategory::Rock => "rock",
            HazardCategory::Soil => "soil",
            HazardCategory::Landslide => "landslide",
        }
    }
}

impl fmt::Display for HazardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A substring rule assigning matching unit codes to a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardRule {
    pub pattern: String,
    pub category: HazardCategory,
    /// Compare lower-cased pattern and code
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub case_insensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl HazardRule {
    pub fn new(pattern: impl Into<String>, category: HazardCategory) -> Self {
        Self {
            pattern: pattern.into(),
            category,
            case_insensitive: false,
            description: None,
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether `code` contains this rule's pattern
    pub fn matches(&self, code: &str) -> bool {
        if self.case_insensitive {
            code.to_lowercase().contains(&self.pattern.to_lowercase())
        } else {
            code.contains(&self.pattern)
        }
    }
}

/// (pattern, category, case-insensitive, description)
type BuiltinRule = (&'static str, HazardCategory, bool, &'static str);

use HazardCategory::{Landslide, Rock, Soil};

#[rustfmt::skip]
const BUILTIN_RULES: &[BuiltinRule] = &[
    ("Ta", Rock, true, "Animas Formation"),
    ("Tkda1", Rock, false, "Dawson Formation, facies unit 1"),
    ("Tkda2", Rock, false, "Dawson Formation, facies unit 2"),
    ("Tkda3", Rock, false, "Dawson Formation, facies unit 3"),
    ("Ka", Rock, false, "Animas Formation (Cretaceous)"),
    ("Kb", Rock, false, "Benton Group"),
    ("Kcgg", Rock, false, "Carlile Shale, Greenhorn Limestone and Graneros Shale"),
    ("Kch", Rock, false, "Cliff House Sandstone"),
    ("Kk", Rock, false, "Kirtland Formation"),
    ("Kl", Rock, false, "Mancos Shale"),
    ("Km", Rock, false, "Mancos Shale"),
    ("Kp", Rock, false, "Pierre Shale"),
    ("Jm", Rock, false, "Morrison Formation"),
    ("af", Soil, false, "Artificial fill"),
    ("dg", Soil, false, "Disturbed ground"),
    ("Qacc1", Soil, false, "Alluvium one of Coal Creek"),
    ("Qacc2", Soil, false, "Alluvium two of Coal Creek"),
    ("Qad1", Soil, false, "Alluvium one of Dry Creek"),
    ("Qad2", Soil, false, "Alluvium two of Dry Creek"),
    ("Qaeo", Soil, false, "Old alluvium of East Creek"),
    ("Qag2", Soil, false, "Alluvium two of the Gunnison River"),
    ("Qag3", Soil, false, "Alluvium three of the Gunnison River"),
    ("Qamf", Soil, false, "Alluvial mud flow and mud fan deposits"),
    ("Qamfo", Soil, false, "Old alluvial mud flow and mud fan deposits"),
    ("Qau", Soil, false, "Undifferentiated alluvium of the Uncompahgre River"),
    ("Qau2", Soil, false, "Alluvium two of the Uncompahgre River"),
    ("Qau3", Soil, false, "Alluvium three of the Uncompahgre River"),
    ("Qau4", Soil, false, "Alluvium four of the Uncompahgre River"),
    ("Qau5", Soil, false, "Alluvium five of the Uncompahgre River"),
    ("Qc", Soil, false, "Colluvial deposits"),
    ("Qco", Soil, false, "Old colluvial deposits"),
    ("Qf", Soil, false, "Fan deposits"),
    ("Qfy", Soil, false, "Young fan deposits"),
    ("Qsw", Soil, false, "Sheetwash deposits"),
    ("Qls", Landslide, false, "Landslide deposits"),
    ("Qlsp", Landslide, false, "Preglacial landslide deposits"),
    ("Qlso", Landslide, false, "Old landslide deposits"),
    ("Qlsr", Landslide, false, "Recent landslide deposits"),
    ("Qlsy", Landslide, false, "Young landslide deposits"),
    ("Qt", Landslide, false, "Talus deposits"),
    ("Qta", Landslide, false, "Talus deposits"),
    ("PPm", Landslide, false, "Maroon Formation"),
    ("Pm", Landslide, false, "Minturn Formation"),
];

/// Ordered collection of hazard rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCatalog {
    rules: Vec<HazardRule>,
}

impl RuleCatalog {
    /// Build a catalog, rejecting rules with blank patterns.
    pub fn new(rules: Vec<HazardRule>) -> Result<Self> {
        let catalog = Self { rules };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The Colorado formation catalog used by the hazard derivative tools.
    ///
    /// Only the rock rule `Ta` ignores case; every other rule is case-sensitive.
    pub fn builtin() -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .map(|&(pattern, category, case_insensitive, description)| HazardRule {
                pattern: pattern.to_string(),
                category,
                case_insensitive,
                description: Some(description.to_string()),
            })
            .collect();
        Self { rules }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let catalog: RuleCatalog = serde_json::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn rules(&self) -> &[HazardRule] {
        &self.rules
    }

    pub fn rules_for(&self, category: HazardCategory) -> impl Iterator<Item = &HazardRule> {
        self.rules.iter().filter(move |r| r.category == category)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn validate(&self) -> Result<()> {
        for (i, rule) in self.rules.iter().enumerate() {
            if rule.pattern.trim().is_empty() {
                return Err(HazardError::Catalog(format!(
                    "rule {} ({}) has an empty pattern",
                    i, rule.category
                )));
            }
        }
        Ok(())
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
