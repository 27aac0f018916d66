//! GeoJSON feature collection I/O
//!
//! Geology maps, quadrangle indexes and hazard outputs are exchanged as
//! GeoJSON `FeatureCollection`s, parsed with the `geojson` crate. A legacy
//! `crs` member naming the CRS is kept as a foreign member so projected
//! coordinates keep their EPSG code.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};
use geo_types::Geometry;
use geojson::feature::Id;
use geojson::{GeoJson, JsonObject};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

/// Read a GeoJSON FeatureCollection from a file
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let text = fs::read_to_string(path.as_ref())?;
    feature_collection_from_str(&text)
}

/// Write a FeatureCollection as GeoJSON
pub fn write_geojson<P: AsRef<Path>>(fc: &FeatureCollection, path: P) -> Result<()> {
    fs::write(path.as_ref(), feature_collection_to_string(fc)?)?;
    Ok(())
}

/// Parse a GeoJSON FeatureCollection document
pub fn feature_collection_from_str(text: &str) -> Result<FeatureCollection> {
    let gj: GeoJson = text.parse().map_err(|e: geojson::Error| Error::GeoJson(e.to_string()))?;
    let GeoJson::FeatureCollection(collection) = gj else {
        return Err(Error::GeoJson("root object is not a FeatureCollection".into()));
    };

    let mut fc = FeatureCollection::new();
    fc.crs = collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.pointer("/properties/name"))
        .and_then(Value::as_str)
        .and_then(CRS::from_name);

    for feature in collection.features {
        fc.push(convert_feature(feature)?);
    }
    Ok(fc)
}

/// Serialize a FeatureCollection as a GeoJSON document
pub fn feature_collection_to_string(fc: &FeatureCollection) -> Result<String> {
    let foreign_members = fc.crs.as_ref().map(|crs| {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            json!({ "type": "name", "properties": { "name": crs.urn() } }),
        );
        members
    });

    let collection = geojson::FeatureCollection {
        bbox: None,
        features: fc.iter().map(|f| to_geojson_feature(f, &fc.fields)).collect(),
        foreign_members,
    };
    Ok(serde_json::to_string_pretty(&GeoJson::FeatureCollection(collection))?)
}

fn convert_feature(feature: geojson::Feature) -> Result<Feature> {
    let geometry = feature.geometry.map(convert_geometry).transpose()?;

    let mut out = Feature {
        geometry,
        properties: Default::default(),
        id: feature.id.map(|id| match id {
            Id::String(s) => s,
            Id::Number(n) => n.to_string(),
        }),
    };

    for (key, v) in feature.properties.unwrap_or_default() {
        out.set_property(key, parse_attribute(&v));
    }
    Ok(out)
}

/// Only the geometry kinds the hazard tools read or write are accepted
fn convert_geometry(geometry: geojson::Geometry) -> Result<Geometry<f64>> {
    let geometry =
        Geometry::<f64>::try_from(geometry).map_err(|e| Error::GeoJson(e.to_string()))?;
    match geometry {
        Geometry::Point(_)
        | Geometry::LineString(_)
        | Geometry::MultiLineString(_)
        | Geometry::Polygon(_)
        | Geometry::MultiPolygon(_) => Ok(geometry),
        Geometry::MultiPoint(_) => Err(Error::UnsupportedGeometry("MultiPoint".into())),
        Geometry::GeometryCollection(_) => {
            Err(Error::UnsupportedGeometry("GeometryCollection".into()))
        }
        other => Err(Error::UnsupportedGeometry(format!("{:?}", other))),
    }
}

fn parse_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => AttributeValue::String(s.clone()),
        other => AttributeValue::String(other.to_string()),
    }
}

fn attribute_to_value(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Int(i) => json!(i),
        AttributeValue::Float(f) => json!(f),
        AttributeValue::String(s) => Value::String(s.clone()),
    }
}

fn to_geojson_feature(feature: &Feature, fields: &[String]) -> geojson::Feature {
    let mut props = JsonObject::new();
    for field in fields {
        let v = feature.get_property(field).map_or(Value::Null, attribute_to_value);
        props.insert(field.clone(), v);
    }

    geojson::Feature {
        bbox: None,
        geometry: feature
            .geometry
            .as_ref()
            .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
        id: feature.id.clone().map(Id::String),
        properties: Some(props),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOLOGY: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::26913" } },
        "features": [
            { "type": "Feature", "id": 7,
              "properties": { "FMT": "Qls", "AREA": 12.5, "CODE": 3 },
              "geometry": { "type": "Polygon",
                "coordinates": [[[0,0],[10,0],[10,10],[0,10],[0,0]]] } },
            { "type": "Feature",
              "properties": { "FMT": null },
              "geometry": null }
        ]
    }"#;

    #[test]
    fn test_parse_geology() {
        let fc = feature_collection_from_str(GEOLOGY).unwrap();
        assert_eq!(fc.len(), 2);
        assert_eq!(fc.crs, Some(CRS::from_epsg(26913)));

        let first = &fc.features[0];
        assert_eq!(first.id.as_deref(), Some("7"));
        assert_eq!(first.get_str("FMT"), Some("Qls"));
        assert_eq!(first.get_property("CODE"), Some(&AttributeValue::Int(3)));
        assert_eq!(first.get_property("AREA"), Some(&AttributeValue::Float(12.5)));
        assert!(matches!(first.geometry, Some(Geometry::Polygon(_))));
        assert!(fc.features[1].is_null("FMT"));
    }

    #[test]
    fn test_write_then_read_keeps_schema() {
        let fc = feature_collection_from_str(GEOLOGY).unwrap();
        let text = feature_collection_to_string(&fc).unwrap();
        let back = feature_collection_from_str(&text).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.crs, fc.crs);
        assert!(back.features[1].geometry.is_none());
        assert_eq!(back.features[1].get_property("CODE"), Some(&AttributeValue::Null));
    }

    #[test]
    fn test_rejects_non_collection() {
        let err = feature_collection_from_str(r#"{"type":"Feature"}"#).unwrap_err();
        assert!(matches!(err, Error::GeoJson(_)));

        let bad = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"GeometryCollection","geometries":[]}}]}"#;
        assert!(matches!(feature_collection_from_str(bad), Err(Error::UnsupportedGeometry(_))));
    }
}
