// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

const SUB_DIR: &str = "freddys_projects/this_specific_project";

fn scratch_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write scratch file");
    path
}

#[rstest]
fn test_filedir_path_creates_directories() {
    let tmp = TempDir::new().unwrap();
    let main_dir = tmp.path().join("freddys_repository");
    let target = Target::new("freddys", &main_dir, SUB_DIR);

    for filedir in ["projecttopping", "layerstyle", "layerdefinition", "andanotherone"] {
        let (absolute, relative) = target.filedir_path(filedir).unwrap();
        assert!(absolute.is_dir());
        assert_eq!(relative, format!("{SUB_DIR}/{filedir}"));
        assert_eq!(absolute, main_dir.join(SUB_DIR).join(filedir));
    }

    // idempotent
    target.filedir_path("layerstyle").unwrap();
}

#[rstest]
#[case("", "layerstyle")]
#[case("./nested//dir/", "nested/dir/layerstyle")]
#[case("nested\\dir", "nested/dir/layerstyle")]
fn test_sub_dir_normalization(#[case] sub_dir: &str, #[case] expected: &str) {
    let tmp = TempDir::new().unwrap();
    let target = Target::new("freddys", tmp.path(), sub_dir);
    let (_, relative) = target.filedir_path("layerstyle").unwrap();
    assert_eq!(relative, expected);
}

#[rstest]
fn test_default_link_copies_and_records() {
    let tmp = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let qml = scratch_file(scratch.path(), "layer_one.qml", "<qgis/>");

    let mut target = Target::new("freddys", tmp.path(), SUB_DIR);
    let link = target
        .toppingfile_link("layerstyle", &qml)
        .unwrap()
        .expect("file exists");

    assert_eq!(link, format!("{SUB_DIR}/layerstyle/freddys_layer_one.qml"));
    let copied = tmp.path().join(&link);
    assert_eq!(std::fs::read_to_string(copied).unwrap(), "<qgis/>");
    assert_eq!(
        target.manifest,
        vec![ManifestEntry {
            id: None,
            path: link,
            topping_type: "layerstyle".to_string(),
            version: None,
        }]
    );
}

#[rstest]
fn test_missing_scratch_file_is_not_linked() {
    let tmp = TempDir::new().unwrap();
    let mut target = Target::new("freddys", tmp.path(), SUB_DIR);

    let link = target
        .toppingfile_link("layerstyle", &tmp.path().join("gone.qml"))
        .unwrap();

    assert_eq!(link, None);
    assert!(target.manifest.is_empty());
}

#[rstest]
fn test_same_file_linked_twice_is_listed_twice() {
    let tmp = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let qlr = scratch_file(scratch.path(), "layer_four.qlr", "definition");

    let mut target = Target::new("freddys", tmp.path(), SUB_DIR);
    let first = target.toppingfile_link("layerdefinition", &qlr).unwrap();
    let second = target.toppingfile_link("layerdefinition", &qlr).unwrap();

    assert_eq!(first, second);
    assert_eq!(target.manifest.len(), 2);
    assert_eq!(target.manifest[0].path, target.manifest[1].path);
}

#[rstest]
fn test_versioned_resolver_increments_ids() {
    let tmp = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let qml = scratch_file(scratch.path(), "layer_one.qml", "<qgis/>");

    let mut target =
        Target::new("freddys", tmp.path(), SUB_DIR).with_path_resolver(VersionedPathResolver);
    target.toppingfile_link("layerstyle", &qml).unwrap();
    target.toppingfile_link("layerstyle", &qml).unwrap();

    let ids: Vec<_> = target
        .manifest
        .iter()
        .map(|entry| entry.id.clone().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![
            "layerstyle_freddys_layer_one.qml_001",
            "layerstyle_freddys_layer_one.qml_002",
        ]
    );
    for entry in &target.manifest {
        let version = entry.version.as_deref().expect("version is set");
        assert!(chrono::NaiveDate::parse_from_str(version, "%Y-%m-%d").is_ok());
    }
}

#[rstest]
fn test_unique_id_grows_past_three_digits() {
    let tmp = TempDir::new().unwrap();
    let mut target = Target::new("freddys", tmp.path(), "");
    for n in 1..=999 {
        target.manifest.push(ManifestEntry {
            id: Some(format!("layerstyle_x.qml_{n:03}")),
            path: "x.qml".to_string(),
            topping_type: "layerstyle".to_string(),
            version: None,
        });
    }

    let id = unique_id_in_target_scope(&target, "layerstyle_x.qml_001");
    assert_eq!(id, "layerstyle_x.qml_1000");
}

#[rstest]
#[case("a_001", "a_002")]
#[case("a_009", "a_010")]
#[case("a_999", "a_1000")]
#[case("plain", "plain_001")]
fn test_increment_id(#[case] id: &str, #[case] expected: &str) {
    assert_eq!(increment_id(id), expected);
}

#[rstest]
fn test_closure_resolver() {
    let tmp = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let qml = scratch_file(scratch.path(), "layer_one.qml", "<qgis/>");

    let mut target = Target::new("freddys", tmp.path(), SUB_DIR).with_path_resolver(
        |target: &mut Target, name: &str, topping_type: &str| -> crate::Result<String> {
            target.manifest.push(ManifestEntry {
                id: Some(name.to_string()),
                path: name.to_string(),
                topping_type: topping_type.to_string(),
                version: Some("1".to_string()),
            });
            Ok(format!("ilidata:{name}"))
        },
    );

    let link = target.toppingfile_link("layerstyle", &qml).unwrap();
    assert_eq!(link.as_deref(), Some("ilidata:freddys_layer_one.qml"));
    assert_eq!(target.manifest[0].version.as_deref(), Some("1"));
}

#[rstest]
fn test_manifest_yaml_omits_empty_fields() {
    let tmp = TempDir::new().unwrap();
    let mut target = Target::new("freddys", tmp.path(), SUB_DIR);
    target.resolve_path("freddys.yaml", "projecttopping").unwrap();

    let yaml = target.manifest_yaml().unwrap();
    assert!(yaml.contains("type: projecttopping"));
    assert!(!yaml.contains("id:"));
    assert!(!yaml.contains("version:"));

    target.clear_manifest();
    assert!(target.manifest.is_empty());
}
