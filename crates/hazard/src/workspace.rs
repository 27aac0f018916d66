//! Output workspace: artifact naming and overwrite control
//!
//! Rasters are written as GeoTIFF (`.tif`), feature sets as GeoJSON
//! (`.geojson`). Intermediate artifacts go to an optional scratch directory
//! and are skipped when none is configured.

use std::path::{Path, PathBuf};

use geohaz_core::io::{write_geojson, write_geotiff};
use geohaz_core::raster::{Raster, RasterElement};
use geohaz_core::vector::FeatureCollection;
use tracing::debug;

use crate::error::{HazardError, Result};

/// Artifact name suffixes
pub mod suffix {
    pub const SLOPE: &str = "_sl";
    pub const INTEGER: &str = "_int";
    pub const RECLASS: &str = "_rc";
    pub const POLYGONS: &str = "_rtp";
    pub const ROCKFALL: &str = "_rf";
    pub const FINAL: &str = "_final";
    pub const LANDSLIDE: &str = "_LandslideHazards";
    pub const DEM: &str = "_dem";
    pub const HILLSHADE: &str = "_hs";
    pub const ASPECT: &str = "_as";
    pub const CONTOUR: &str = "_ct";
    pub const BUFFER: &str = "_bf";
}

/// Where and how outputs are written
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// Directory receiving final outputs
    pub root: PathBuf,
    /// Directory receiving intermediate artifacts; `None` keeps them in memory
    pub scratch: Option<PathBuf>,
    /// Replace existing outputs instead of failing
    pub overwrite: bool,
}

impl WorkspaceConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            scratch: None,
            overwrite: false,
        }
    }
}

/// Kind of artifact, which fixes its file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Raster,
    Features,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Raster => "tif",
            ArtifactKind::Features => "geojson",
        }
    }
}

/// A single-writer output directory
#[derive(Debug, Clone)]
pub struct OutputWorkspace {
    config: WorkspaceConfig,
}

impl OutputWorkspace {
    /// Open the workspace, creating its directories when missing.
    pub fn open(config: WorkspaceConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.root)?;
        if let Some(scratch) = &config.scratch {
            std::fs::create_dir_all(scratch)?;
        }
        Ok(Self { config })
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn overwrite(&self) -> bool {
        self.config.overwrite
    }

    pub fn has_scratch(&self) -> bool {
        self.config.scratch.is_some()
    }

    pub fn path_for(&self, name: &str, kind: ArtifactKind) -> PathBuf {
        self.config.root.join(format!("{}.{}", name, kind.extension()))
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        if path.exists() && !self.config.overwrite {
            return Err(HazardError::OutputExists(path.to_path_buf()));
        }
        Ok(())
    }

    pub fn write_raster<T: RasterElement>(&self, name: &str, raster: &Raster<T>) -> Result<PathBuf> {
        let path = self.path_for(name, ArtifactKind::Raster);
        self.check_writable(&path)?;
        write_geotiff(raster, &path, None)?;
        debug!(path = %path.display(), "wrote raster");
        Ok(path)
    }

    pub fn write_features(&self, name: &str, features: &FeatureCollection) -> Result<PathBuf> {
        let path = self.path_for(name, ArtifactKind::Features);
        self.check_writable(&path)?;
        write_geojson(features, &path)?;
        debug!(path = %path.display(), features = features.len(), "wrote features");
        Ok(path)
    }

    /// Write an intermediate raster to scratch, if a scratch directory is set.
    pub fn write_scratch_raster<T: RasterElement>(&self, name: &str, raster: &Raster<T>) -> Result<Option<PathBuf>> {
        let Some(scratch) = &self.config.scratch else {
            return Ok(None);
        };
        // Scratch artifacts are rewritten on every run
        let path = scratch.join(format!("{}.{}", name, ArtifactKind::Raster.extension()));
        write_geotiff(raster, &path, None)?;
        debug!(path = %path.display(), "wrote scratch raster");
        Ok(Some(path))
    }

    /// Write intermediate features to scratch, if a scratch directory is set.
    pub fn write_scratch_features(&self, name: &str, features: &FeatureCollection) -> Result<Option<PathBuf>> {
        let Some(scratch) = &self.config.scratch else {
            return Ok(None);
        };
        let path = scratch.join(format!("{}.{}", name, ArtifactKind::Features.extension()));
        write_geojson(features, &path)?;
        debug!(path = %path.display(), "wrote scratch features");
        Ok(Some(path))
    }

    /// Delete outputs of `kind` whose names end with `name_suffix`.
    pub fn remove_matching(&self, name_suffix: &str, kind: ArtifactKind) -> Result<Vec<PathBuf>> {
        let wanted = format!("{}.{}", name_suffix, kind.extension());
        let mut removed = Vec::new();
        for entry in std::fs::read_dir(&self.config.root)? {
            let path = entry?.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&wanted));
            if matches && path.is_file() {
                std::fs::remove_file(&path)?;
                removed.push(path);
            }
        }
        removed.sort();
        Ok(removed)
    }
}

/// Dataset name without directories or extension
pub fn dataset_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// First `max_chars` characters of `name`
pub fn truncate_name(name: &str, max_chars: usize) -> String {
    name.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geohaz_core::Raster;

    #[test]
    fn test_naming_helpers() {
        assert_eq!(dataset_stem(Path::new("/data/BreckDEM.tif")), "BreckDEM");
        assert_eq!(dataset_stem(Path::new("geology.geojson")), "geology");
        assert_eq!(truncate_name("Breckenridge NE", 9), "Breckenri");
        assert_eq!(truncate_name("Breckenridge NE", 10), "Breckenrid");
        assert_eq!(truncate_name("Dillon", 10), "Dillon");
    }

    #[test]
    fn test_overwrite_guard() {
        let dir = tempfile::tempdir().unwrap();
        let ws = OutputWorkspace::open(WorkspaceConfig::new(dir.path())).unwrap();
        let fc = FeatureCollection::new();

        let path = ws.write_features("rocks", &fc).unwrap();
        assert!(path.ends_with("rocks.geojson"));
        assert!(matches!(ws.write_features("rocks", &fc), Err(HazardError::OutputExists(_))));

        let ws = OutputWorkspace::open(WorkspaceConfig {
            overwrite: true,
            ..WorkspaceConfig::new(dir.path())
        })
        .unwrap();
        assert!(ws.write_features("rocks", &fc).is_ok());
    }

    #[test]
    fn test_scratch_optional() {
        let dir = tempfile::tempdir().unwrap();
        let raster: Raster<f64> = Raster::filled(2, 2, 1.0);

        let ws = OutputWorkspace::open(WorkspaceConfig::new(dir.path().join("out"))).unwrap();
        assert_eq!(ws.write_scratch_raster("dem_sl", &raster).unwrap(), None);

        let ws = OutputWorkspace::open(WorkspaceConfig {
            scratch: Some(dir.path().join("scratch")),
            ..WorkspaceConfig::new(dir.path().join("out"))
        })
        .unwrap();
        let written = ws.write_scratch_raster("dem_sl", &raster).unwrap().unwrap();
        assert!(written.exists());
        // Scratch artifacts never trip the overwrite guard
        assert!(ws.write_scratch_raster("dem_sl", &raster).is_ok());
    }

    #[test]
    fn test_remove_matching() {
        let dir = tempfile::tempdir().unwrap();
        let ws = OutputWorkspace::open(WorkspaceConfig::new(dir.path())).unwrap();
        let fc = FeatureCollection::new();
        ws.write_features("Dillon_bf", &fc).unwrap();
        ws.write_features("Frisco_bf", &fc).unwrap();
        ws.write_features("Frisco_ct", &fc).unwrap();

        let removed = ws.remove_matching(suffix::BUFFER, ArtifactKind::Features).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(ws.path_for("Frisco_ct", ArtifactKind::Features).exists());
    }
}
