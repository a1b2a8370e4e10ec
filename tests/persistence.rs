//! Persistence and recovery tests for the redb-backed engine.
//!
//! These tests verify that materials, their properties, id allocation, and
//! the full-text index survive an engine restart.

use materials_db::config::MaterialsConfig;
use materials_db::engine::{Engine, EngineConfig};
use materials_db::store::{DurableStore, MaterialStore};

fn persistent_engine(dir: &std::path::Path) -> Engine {
    Engine::new(EngineConfig {
        data_dir: Some(dir.to_path_buf()),
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn materials_survive_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    // First session: load two records.
    {
        let engine = persistent_engine(dir.path());
        let summary = engine
            .upload(b"Chemical formula,a,b\nNaCl,mass,58.44\nH2O,mass,18,phase,liquid\n")
            .unwrap();
        assert_eq!(summary.accepted, 2);
    }

    // Second session: reopen and query.
    {
        let engine = persistent_engine(dir.path());
        let info = engine.info().unwrap();
        assert_eq!(info.material_count, 2);
        assert!(info.persistent);

        let found = engine
            .search(
                br#"{"properties":[{"name":"mass","value":"20","logic":"lte"}]}"#,
                None,
            )
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].compound, "H2O");
        assert_eq!(found[0].properties.len(), 2);
    }
}

#[test]
fn full_text_index_is_rebuilt_on_open() {
    let dir = tempfile::TempDir::new().unwrap();
    {
        let engine = persistent_engine(dir.path());
        engine
            .upload(b"Chemical formula,a,b\nTiO2,structure,anatase\n")
            .unwrap();
    }

    let engine = persistent_engine(dir.path());
    assert_eq!(engine.info().unwrap().indexed_count, 1);
    let found = engine.search(b"{}", Some("anatase")).unwrap();
    assert_eq!(found[0].compound, "TiO2");
}

#[test]
fn ids_keep_increasing_after_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    {
        let engine = persistent_engine(dir.path());
        engine
            .upload(b"Chemical formula,a,b\nLiF,mass,25.94\n")
            .unwrap();
    }
    {
        let engine = persistent_engine(dir.path());
        engine
            .add(br#"[{"compound":"KBr","properties":[{"propertyName":"mass","propertyValue":119}]}]"#)
            .unwrap();
    }

    let store = DurableStore::open(dir.path()).unwrap();
    let all = store.execute(&materials_db::filter::FilterExpr::All).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].compound, "LiF");
    assert_eq!(all[1].compound, "KBr");
    assert!(all[1].id > all[0].id);
    assert!(all[1].properties[0].id > all[0].properties[0].id);
}

#[test]
fn derived_fields_are_stored() {
    let dir = tempfile::TempDir::new().unwrap();
    {
        let engine = persistent_engine(dir.path());
        engine
            .upload("Chemical formula,a,b\nCuSO4·5H2O,colour,blue\n".as_bytes())
            .unwrap();
    }

    let store = DurableStore::open(dir.path()).unwrap();
    let stored = &store.execute(&materials_db::filter::FilterExpr::All).unwrap()[0];
    assert_eq!(stored.elements, "H,O,S,Cu");
    assert_eq!(stored.periods, "1,2,3,4");
    assert_eq!(stored.groups, "1,11,16");
    assert_eq!(stored.csv, "CuSO4·5H2O,colour,blue");
}

#[test]
fn engine_config_from_toml_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("materials.toml");
    let config = MaterialsConfig {
        data_dir: Some(dir.path().join("db")),
        full_text: false,
        ..Default::default()
    };
    config.save(&path).unwrap();

    let loaded = MaterialsConfig::load(&path).unwrap();
    let engine = Engine::new(EngineConfig::from(&loaded)).unwrap();
    let info = engine.info().unwrap();
    assert!(info.persistent);
    assert!(!info.full_text);
    assert!(dir.path().join("db").join("materials.redb").exists());
}
