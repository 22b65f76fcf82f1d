// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

#[rstest]
fn test_missing_registration_is_negative() {
    let settings = ExportSettings::new();

    for topping_type in ToppingType::iter() {
        let decision = settings.get_setting(topping_type, "Layer One", None);
        assert!(!decision.export);
        assert_eq!(decision, ExportDecision::skip());
    }
}

#[rstest]
fn test_style_falls_back_to_default() {
    let mut settings = ExportSettings::new();
    let categories: StyleCategories = [StyleCategory::Symbology].into_iter().collect();
    settings.set_setting_values(
        ToppingType::QmlStyle,
        "Layer One",
        true,
        Some(categories.clone()),
        None,
    );

    let custom = settings.get_setting(ToppingType::QmlStyle, "Layer One", Some("custom"));
    assert!(custom.export);
    assert_eq!(custom.categories, Some(categories));

    let other = settings.get_setting(ToppingType::QmlStyle, "Layer Two", Some("custom"));
    assert!(!other.export);
}

#[rstest]
fn test_named_style_wins_over_default() {
    let mut settings = ExportSettings::new();
    settings.set_setting_values(ToppingType::QmlStyle, "Layer One", true, None, None);
    settings.set_setting_values(ToppingType::QmlStyle, "Layer One", false, None, Some("night"));

    assert!(settings.get_setting(ToppingType::QmlStyle, "Layer One", None).export);
    assert!(settings.get_setting(ToppingType::QmlStyle, "Layer One", Some("default")).export);
    assert!(!settings.get_setting(ToppingType::QmlStyle, "Layer One", Some("night")).export);
}

#[rstest]
fn test_style_name_does_not_leak_into_other_types() {
    let mut settings = ExportSettings::new();
    settings.set_setting_values(ToppingType::Definition, "Layer Three", true, None, Some("night"));
    settings.set_setting_values(ToppingType::Source, "Layer Three", true, None, None);

    assert!(settings.get_setting(ToppingType::Definition, "Layer Three", None).export);
    assert!(settings.get_setting(ToppingType::Source, "Layer Three", Some("night")).export);
    assert!(!settings.get_setting(ToppingType::QmlStyle, "Layer Three", None).export);
}

#[rstest]
fn test_parse_settings_yaml() {
    let yaml = r#"
api: toppingmaker/v0
qmlstyle:
  Layer One:
    default:
      export: true
      categories: [Symbology, Labeling]
    night: {}
definition:
  Layer Three: { export: true }
  Layer Four: { export: false }
source:
  Layer One: {}
mapthemes:
  - Robot Theme
"#;
    let settings = ExportSettings::from_yaml(yaml).expect("Should parse settings");

    let default = settings.get_setting(ToppingType::QmlStyle, "Layer One", None);
    assert!(default.export);
    let categories = default.categories.expect("categories are set");
    assert!(categories.contains(StyleCategory::Labeling));
    assert!(!categories.contains(StyleCategory::Forms));

    let night = settings.get_setting(ToppingType::QmlStyle, "Layer One", Some("night"));
    assert!(night.export);
    assert!(night.categories_or_all().is_all());

    assert!(settings.get_setting(ToppingType::Definition, "Layer Three", None).export);
    assert!(!settings.get_setting(ToppingType::Definition, "Layer Four", None).export);
    assert!(settings.get_setting(ToppingType::Source, "Layer One", None).export);
    assert_eq!(settings.mapthemes, vec!["Robot Theme"]);
}

#[rstest]
fn test_parse_empty_and_unversioned() {
    let empty = ExportSettings::from_yaml("").expect("Empty document is valid");
    assert!(empty.qmlstyle.is_empty());

    let unversioned = ExportSettings::from_yaml("mapthemes: [A]\n").expect("api is optional");
    assert_eq!(unversioned.api, SettingsApiVersion::V0);
    assert_eq!(unversioned.mapthemes, vec!["A"]);
}

#[rstest]
fn test_parse_rejects_unknown_api() {
    let result = ExportSettings::from_yaml("api: toppingmaker/v9\n");
    assert!(matches!(result, Err(crate::Error::InvalidYaml { .. })));
}

#[rstest]
fn test_load_records_source_path() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(crate::SETTINGS_FILENAME);
    std::fs::write(&path, "api: toppingmaker/v0\n").unwrap();

    let settings = ExportSettings::load(&path).expect("Should load settings");
    assert_eq!(settings.source_path, Some(path));
}

#[rstest]
fn test_load_missing_file() {
    let tmp = TempDir::new().unwrap();
    let result = ExportSettings::load(tmp.path().join("missing.yaml"));
    assert!(matches!(result, Err(crate::Error::ReadFailed { .. })));
}

#[rstest]
#[case(ToppingType::QmlStyle, "qmlstyle")]
#[case(ToppingType::Definition, "definition")]
#[case(ToppingType::Source, "source")]
fn test_topping_type_names(#[case] topping_type: ToppingType, #[case] name: &str) {
    assert_eq!(topping_type.to_string(), name);
}

#[rstest]
fn test_style_categories_display() {
    assert_eq!(StyleCategories::all().to_string(), "AllStyleCategories");
    let some: StyleCategories = [StyleCategory::Labeling, StyleCategory::Symbology]
        .into_iter()
        .collect();
    assert_eq!(some.to_string(), "Symbology|Labeling");
}
