//! Vector features: geometry plus attributes
//!
//! Hazard outputs are polygon feature collections whose attributes carry
//! the raster class (`gridcode`), the polygon area (`Shape_Area`) and,
//! for geology-derived layers, the formation code.

mod query;

pub use query::Predicate;

use crate::crs::CRS;
use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Numeric view of the value (ints widen to f64)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "NULL"),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(v) => write!(f, "{}", v),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::String(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: HashMap<String, AttributeValue>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// Text attribute, `None` when absent, null or not a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get_property(key).and_then(AttributeValue::as_str)
    }

    /// Whether the attribute is absent or null
    pub fn is_null(&self, key: &str) -> bool {
        self.get_property(key).map_or(true, AttributeValue::is_null)
    }
}

/// Collection of features sharing one attribute schema
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    /// Declared attribute fields, in declaration order
    pub fields: Vec<String>,
    /// Coordinate reference system of all geometries
    pub crs: Option<CRS>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature: Feature) {
        for key in feature.properties.keys() {
            if !self.fields.iter().any(|f| f == key) {
                self.fields.push(key.clone());
            }
        }
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Feature> {
        self.features.iter_mut()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    /// Declare a field; features without it receive `Null`.
    pub fn add_field(&mut self, name: &str) {
        if !self.has_field(name) {
            self.fields.push(name.to_string());
        }
        for feature in &mut self.features {
            feature
                .properties
                .entry(name.to_string())
                .or_insert(AttributeValue::Null);
        }
    }

    /// Features matching a predicate, cloned into a new collection with the same schema
    pub fn select(&self, predicate: &Predicate) -> FeatureCollection {
        FeatureCollection {
            features: self
                .features
                .iter()
                .filter(|f| predicate.matches(f))
                .cloned()
                .collect(),
            fields: self.fields.clone(),
            crs: self.crs.clone(),
        }
    }

    /// Append all features of `other`, unifying both schemas.
    ///
    /// Fields present on only one side are filled with `Null`, so appended
    /// rows can later be told apart from rows that were already tagged.
    pub fn append(&mut self, other: FeatureCollection) {
        for field in &other.fields {
            if !self.has_field(field) {
                self.fields.push(field.clone());
            }
        }
        self.features.extend(other.features);
        let fields = self.fields.clone();
        for feature in &mut self.features {
            for field in &fields {
                feature
                    .properties
                    .entry(field.clone())
                    .or_insert(AttributeValue::Null);
            }
        }
        if self.crs.is_none() {
            self.crs = other.crs;
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        let mut fc = FeatureCollection::new();
        for feature in iter {
            fc.push(feature);
        }
        fc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{point, Geometry};

    fn pt(x: f64) -> Geometry<f64> {
        Geometry::Point(point!(x: x, y: 0.0))
    }

    #[test]
    fn test_push_tracks_schema() {
        let mut fc = FeatureCollection::new();
        fc.push(Feature::new(pt(0.0)).with_property("gridcode", 2i64));
        fc.push(Feature::new(pt(1.0)).with_property("FMT", "Qls"));
        assert_eq!(fc.fields, vec!["gridcode".to_string(), "FMT".to_string()]);
    }

    #[test]
    fn test_add_field_fills_null() {
        let mut fc: FeatureCollection = vec![Feature::new(pt(0.0))].into_iter().collect();
        fc.add_field("Hazard_Type");
        assert!(fc.features[0].is_null("Hazard_Type"));
        assert_eq!(fc.features[0].get_property("Hazard_Type"), Some(&AttributeValue::Null));
    }

    #[test]
    fn test_append_unifies_fields() {
        let mut target = FeatureCollection::new();
        target.push(Feature::new(pt(0.0)).with_property("fmt", "PPm"));

        let mut extra = FeatureCollection::new();
        extra.push(Feature::new(pt(1.0)).with_property("gridcode", 2i64));
        target.append(extra);

        assert_eq!(target.len(), 2);
        assert!(target.features[1].is_null("fmt"));
        assert!(target.features[0].is_null("gridcode"));
        assert_eq!(target.features[0].get_str("fmt"), Some("PPm"));
    }
}
