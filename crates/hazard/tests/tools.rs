//! Hazard tools writing into an output workspace

mod common;

use geo::{LineString, Polygon};
use geohaz_core::io::{read_geojson, read_geotiff};
use geohaz_core::vector::FeatureCollection;
use geohaz_core::Raster;
use geohaz_hazard::landslide::{formation_codes, HAZARD_TYPE_FIELD};
use geohaz_hazard::tiling::MILE;
use geohaz_hazard::tools::{landslide, landslide_units, problematic_soils, rockfall};
use geohaz_hazard::{
    tile_quadrangles, HazardError, LandslideConfig, NativeEngine, OutputWorkspace, PipelineConfig, QuadOutcome,
    RuleCatalog, TilingConfig, WorkspaceConfig,
};
use tempfile::TempDir;

use common::{feature, geology, planar_dem, rect};

fn workspace(dir: &TempDir, scratch: bool) -> OutputWorkspace {
    let mut config = WorkspaceConfig::new(dir.path().join("out"));
    if scratch {
        config.scratch = Some(dir.path().join("scratch"));
    }
    OutputWorkspace::open(config).unwrap()
}

#[test]
fn rockfall_writes_polygons_and_filtered_hazards() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir, true);
    let dem = planar_dem(20, 20, 10.0, 35.0);

    let out = rockfall(&NativeEngine::new(), &dem, "breck", "breck", &ws, &PipelineConfig::default()).unwrap();

    assert_eq!(out.polygons, dir.path().join("out/breck_rf.geojson"));
    assert_eq!(out.hazards, dir.path().join("out/breck_final.geojson"));
    assert_eq!(out.hazard_count, 1);
    for name in ["breck_sl.tif", "breck_int.tif", "breck_rc.tif"] {
        assert!(dir.path().join("scratch").join(name).is_file(), "{name}");
    }

    let hazards = read_geojson(&out.hazards).unwrap();
    assert_eq!(hazards.len(), 1);
    assert!((common::area_of(&hazards.features[0]) - 40_000.0).abs() < 1e-6);
}

#[test]
fn rockfall_refuses_to_replace_outputs() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir, false);
    let dem = planar_dem(10, 10, 10.0, 35.0);
    let config = PipelineConfig::default();

    rockfall(&NativeEngine::new(), &dem, "dem", "dem", &ws, &config).unwrap();
    let err = rockfall(&NativeEngine::new(), &dem, "dem", "dem", &ws, &config).unwrap_err();
    assert!(matches!(err, HazardError::OutputExists(_)));

    let replacing = OutputWorkspace::open(WorkspaceConfig {
        overwrite: true,
        ..WorkspaceConfig::new(dir.path().join("out"))
    })
    .unwrap();
    assert!(rockfall(&NativeEngine::new(), &dem, "dem", "dem", &replacing, &config).is_ok());
}

#[test]
fn problematic_soils_exports_each_category() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir, false);
    let mut geology = FeatureCollection::new();
    geology.push(feature(rect(0.0, 0.0, 10.0, 10.0), "FMT", "Kcgg"));
    geology.push(feature(rect(10.0, 0.0, 20.0, 10.0), "FMT", "Qaeo"));
    geology.push(feature(rect(20.0, 0.0, 30.0, 10.0), "FMT", "Qaeo"));
    geology.push(feature(rect(30.0, 0.0, 40.0, 10.0), "FMT", "Tkb"));

    let out = problematic_soils(&geology, "geo", "FMT", &RuleCatalog::builtin(), "rock", "soil", &ws).unwrap();

    assert_eq!(out.rock.units, vec!["Kcgg".to_string()]);
    assert_eq!(out.rock.features, 1);
    assert_eq!(out.soil.units, vec!["Qaeo".to_string()]);
    assert_eq!(out.soil.features, 2);

    let soil = read_geojson(&out.soil.path).unwrap();
    assert!(soil.iter().all(|f| f.get_str("FMT") == Some("Qaeo")));
}

#[test]
fn missing_category_still_writes_empty_output() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir, false);

    let out = problematic_soils(&geology(), "geo", "FMT", &RuleCatalog::builtin(), "rock", "soil", &ws).unwrap();

    assert!(out.rock.units.is_empty());
    assert!(out.soil.units.is_empty());
    assert!(out.rock.path.is_file());
    assert!(read_geojson(&out.soil.path).unwrap().is_empty());
}

#[test]
fn landslide_units_exports_deposits() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir, false);

    let out = landslide_units(&geology(), "geo", "FMT", &RuleCatalog::builtin(), "slides", &ws).unwrap();

    assert_eq!(out.units, vec!["PPm".to_string(), "Pm".to_string(), "Qls".to_string()]);
    assert_eq!(out.features, 3);
}

#[test]
fn landslide_tool_writes_accumulated_hazards() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir, true);
    let dem = planar_dem(20, 20, 10.0, 40.0);

    let out = landslide(
        &NativeEngine::new(),
        &dem,
        &dem_name(),
        &geology(),
        &RuleCatalog::builtin(),
        &LandslideConfig::summit_county(),
        &PipelineConfig::default(),
        &ws,
    )
    .unwrap();

    assert_eq!(out.path, dir.path().join("out/breck_LandslideHazards.geojson"));
    assert_eq!(out.hazard_count, 2);
    assert_eq!(out.report.failures().count(), 0);
    assert!(dir.path().join("scratch/breckPPm_LandslideHazards.geojson").is_file());
    assert!(dir.path().join("scratch/breckPm_LandslideHazards.geojson").is_file());

    let scratch = dir.path().join("scratch");
    assert!(scratch.join("breck_sl.tif").is_file());
    for code in ["PPm", "Pm"] {
        assert!(scratch.join(format!("breck{code}_int.tif")).is_file());
        assert!(scratch.join(format!("breck{code}_rc.tif")).is_file());
        assert!(scratch.join(format!("breck{code}_rtp.geojson")).is_file());
    }
    // Qls is a landslide unit but has no configured threshold
    assert!(!scratch.join("breckQls_rc.tif").exists());

    let written = read_geojson(&out.path).unwrap();
    assert_eq!(formation_codes(&written), vec![Some("PPm"), Some("Pm")]);
    assert!(written.iter().all(|f| f.get_str(HAZARD_TYPE_FIELD).is_some()));
}

fn dem_name() -> String {
    "breck".to_string()
}

fn quad_index() -> FeatureCollection {
    let mut quads = FeatureCollection::new();
    quads.push(feature(rect(100.0, 100.0, 400.0, 400.0), "quad_name", "Alpha Quadrangle"));
    quads.push(feature(rect(500.0, 500.0, 800.0, 800.0), "quad_name", "Bravo Peak"));
    quads.push(feature(rect(900.0, 0.0, 1200.0, 300.0), "quad_name", "Outside"));
    quads
}

fn county() -> FeatureCollection {
    let mut county = FeatureCollection::new();
    county.push(feature(rect(0.0, 0.0, 1000.0, 1000.0), "NAME", "Summit"));
    county.push(feature(rect(1000.0, 0.0, 2000.0, 1000.0), "NAME", "Eagle"));
    county
}

#[test]
fn tiling_derives_products_for_quads_in_county() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir, false);
    let lidar = planar_dem(100, 100, 10.0, 20.0);
    let config = TilingConfig {
        buffer_distance: 50.0,
        county: Some(geohaz_hazard::CountyFilter {
            field: "NAME".into(),
            value: "Summit".into(),
        }),
        ..Default::default()
    };

    let report = tile_quadrangles(&NativeEngine::new(), &lidar, &quad_index(), &county(), &ws, &config).unwrap();

    assert_eq!(report.quads.len(), 2);
    assert_eq!(report.tiled(), 2);
    assert_eq!(report.removed_buffers.len(), 2);

    let out = dir.path().join("out");
    for name in [
        "Alpha Qua_dem.tif",
        "Alpha Quad_hs.tif",
        "Alpha Quad_sl.tif",
        "Alpha Quad_as.tif",
        "Alpha Quad_ct.geojson",
        "Bravo Pea_dem.tif",
        "Bravo Peak_ct.geojson",
    ] {
        assert!(out.join(name).is_file(), "{name}");
    }
    assert!(!out.join("Alpha Quad_bf.geojson").exists());
    assert!(!out.join("Outside_dem.tif").exists());

    let contours = read_geojson(out.join("Alpha Quad_ct.geojson")).unwrap();
    assert!(!contours.is_empty());
}

#[test]
fn tiling_reports_failed_quads_and_continues() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir, false);
    let lidar = planar_dem(100, 100, 10.0, 20.0);
    let config = TilingConfig {
        buffer_distance: 50.0,
        ..Default::default()
    };
    let mut county = county();
    county.features.truncate(1);

    tile_quadrangles(&NativeEngine::new(), &lidar, &quad_index(), &county, &ws, &config).unwrap();
    let rerun = tile_quadrangles(&NativeEngine::new(), &lidar, &quad_index(), &county, &ws, &config).unwrap();

    assert_eq!(rerun.failures().count(), 2);
    assert!(rerun
        .quads
        .iter()
        .all(|q| matches!(&q.outcome, QuadOutcome::Failed { error } if error.contains("already exists"))));
    assert_eq!(rerun.removed_buffers.len(), 2);
}

#[test]
fn concave_quad_is_tiled_by_its_hull() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir, false);
    let lidar = planar_dem(100, 100, 10.0, 20.0);
    // L-shaped quadrangle: 300 m square missing its north-east 150 m quarter
    let ell = Polygon::new(
        LineString::from(vec![
            (100.0, 100.0),
            (400.0, 100.0),
            (400.0, 250.0),
            (250.0, 250.0),
            (250.0, 400.0),
            (100.0, 400.0),
            (100.0, 100.0),
        ]),
        vec![],
    );
    let mut quads = FeatureCollection::new();
    quads.push(feature(ell, "quad_name", "Ell"));
    let config = TilingConfig {
        buffer_distance: 0.0,
        ..Default::default()
    };

    let report = tile_quadrangles(&NativeEngine::new(), &lidar, &quads, &county(), &ws, &config).unwrap();
    assert_eq!(report.tiled(), 1);

    let dem: Raster<f64> = read_geotiff(dir.path().join("out/Ell_dem.tif")).unwrap();
    let value_at = |x: f64, y: f64| {
        let (col, row) = dem.geo_to_pixel(x, y);
        dem.get(row.floor() as usize, col.floor() as usize).unwrap()
    };
    assert!(!value_at(105.0, 105.0).is_nan());
    // Inside the notch but under the hull edge x + y = 650: kept
    assert!(!value_at(305.0, 305.0).is_nan());
    // Notch corner beyond the hull: clipped away
    assert!(value_at(395.0, 395.0).is_nan());
}

#[test]
fn default_tiling_buffer_is_one_mile() {
    assert_eq!(TilingConfig::default().buffer_distance, MILE);
}
