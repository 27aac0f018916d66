//! Coordinate reference systems, identified by EPSG code

use serde::{Deserialize, Serialize};
use std::fmt;

/// An EPSG-coded coordinate reference system.
///
/// Hazard layers are exchanged between GeoTIFF geokeys and GeoJSON named
/// CRS members, both of which carry only the EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CRS {
    epsg: u32,
}

impl CRS {
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: code }
    }

    /// Parse a named CRS as found in GeoJSON `crs.properties.name`.
    ///
    /// Accepts `EPSG:26913`, `urn:ogc:def:crs:EPSG::26913` and the OGC
    /// CRS84 URN (mapped to EPSG:4326).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("urn:ogc:def:crs:OGC:1.3:CRS84") {
            return Some(Self::wgs84());
        }
        let code = name
            .rsplit_once(':')
            .filter(|(prefix, _)| prefix.to_ascii_uppercase().contains("EPSG"))
            .and_then(|(_, code)| code.parse().ok())?;
        Some(Self::from_epsg(code))
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Geographic (degree-based) rather than projected; only EPSG:4326 is recognised
    pub fn is_geographic(&self) -> bool {
        self.epsg == 4326
    }

    /// OGC URN naming this CRS
    pub fn urn(&self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg)
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}
