// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

fn cmd(path: PathBuf, template: &str) -> CmdInit {
    CmdInit {
        path,
        styles: vec!["Layer One".to_string()],
        definitions: vec!["Small Group".to_string()],
        sources: Vec::new(),
        mapthemes: vec!["Robot Theme".to_string()],
        template: template.to_string(),
    }
}

#[rstest]
#[case("minimal")]
#[case("standard")]
fn test_template_is_valid_settings(#[case] template: &str) {
    let tmp = TempDir::new().unwrap();
    let mut cmd = cmd(tmp.path().to_path_buf(), template);
    assert_eq!(cmd.run().unwrap(), 0);

    let settings = ExportSettings::load(tmp.path().join(toppingmaker::SETTINGS_FILENAME))
        .expect("template should load");
    assert!(settings.get_setting(ToppingType::QmlStyle, "Layer One", None).export);
    assert!(settings.get_setting(ToppingType::Definition, "Small Group", None).export);
    assert!(!settings.get_setting(ToppingType::Source, "Layer One", None).export);
    assert_eq!(settings.mapthemes, vec!["Robot Theme"]);
}

#[rstest]
fn test_existing_file_is_kept() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(toppingmaker::SETTINGS_FILENAME);
    std::fs::write(&path, "mapthemes: [Keep]\n").unwrap();

    let mut cmd = cmd(tmp.path().to_path_buf(), "standard");
    assert!(cmd.run().is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "mapthemes: [Keep]\n");
}
