// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;
use crate::memory::MemoryProject;
use crate::project::MapThemeRecord;

fn robot_theme() -> MapThemeRecord {
    MapThemeRecord {
        layer_records: vec![
            MapThemeLayerRecord {
                layer: "Layer One".to_string(),
                using_current_style: true,
                current_style: "night".to_string(),
                visible: true,
                expanded_layer_node: false,
                expanded_legend_items: vec!["0".to_string()],
                using_legend_items: true,
                checked_legend_items: vec!["0".to_string(), "2".to_string()],
            },
            MapThemeLayerRecord {
                layer: "Layer Two".to_string(),
                current_style: "ignored".to_string(),
                visible: false,
                expanded_layer_node: true,
                ..Default::default()
            },
        ],
        has_expanded_state_info: true,
        expanded_group_nodes: vec!["Big Group".to_string(), "Layer One".to_string()],
        checked_group_nodes: vec!["Big Group".to_string()],
    }
}

fn project_with_themes() -> MemoryProject {
    let mut project = MemoryProject::new();
    project.add_map_theme("Robot Theme", robot_theme());
    project.add_map_theme(
        "French Theme",
        MapThemeRecord {
            expanded_group_nodes: vec!["Small Group".to_string()],
            checked_group_nodes: vec!["Medium Group".to_string()],
            ..Default::default()
        },
    );
    project
}

fn settings_with_themes(names: &[&str]) -> ExportSettings {
    let mut settings = ExportSettings::new();
    settings.mapthemes = names.iter().map(|name| name.to_string()).collect();
    settings
}

#[rstest]
fn test_layer_items() {
    let project = project_with_themes();
    let mut themes = MapThemes::new();
    themes.make_items(&project, &settings_with_themes(&["Robot Theme"]));

    let theme = themes.get("Robot Theme").expect("theme was requested");
    let two = &theme["Layer Two"];
    assert_eq!(
        two,
        &MapThemeItem {
            style: None,
            visible: Some(false),
            expanded: Some(true),
            expanded_items: None,
            checked_items: None,
            checked: None,
        }
    );

    let big = &theme["Big Group"];
    assert_eq!(big.expanded, Some(true));
    assert_eq!(big.checked, Some(true));
    assert_eq!(big.style, None);
}

#[rstest]
fn test_group_state_merges_into_layer_entry() {
    let project = project_with_themes();
    let mut themes = MapThemes::new();
    themes.make_items(&project, &settings_with_themes(&["Robot Theme"]));

    // "Layer One" is listed as layer and as expanded group node
    let one = &themes.get("Robot Theme").unwrap()["Layer One"];
    assert_eq!(one.style.as_deref(), Some("night"));
    assert_eq!(one.visible, Some(true));
    assert_eq!(one.expanded, Some(true));
    assert_eq!(one.expanded_items, Some(vec!["0".to_string()]));
    assert_eq!(
        one.checked_items,
        Some(vec!["0".to_string(), "2".to_string()])
    );
}

#[rstest]
fn test_expanded_groups_need_state_info() {
    let project = project_with_themes();
    let mut themes = MapThemes::new();
    themes.make_items(&project, &settings_with_themes(&["French Theme"]));

    let theme = themes.get("French Theme").unwrap();
    assert!(!theme.contains_key("Small Group"));
    assert_eq!(theme["Medium Group"].checked, Some(true));
    assert_eq!(theme["Medium Group"].expanded, None);
}

#[rstest]
fn test_settings_order_and_unknown_themes() {
    let project = project_with_themes();
    let mut themes = MapThemes::new();
    themes.make_items(
        &project,
        &settings_with_themes(&["French Theme", "Missing Theme", "Robot Theme"]),
    );

    let names: Vec<_> = themes.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["French Theme", "Robot Theme"]);
}

#[rstest]
fn test_make_items_replaces_previous() {
    let project = project_with_themes();
    let mut themes = MapThemes::new();
    themes.make_items(&project, &settings_with_themes(&["Robot Theme"]));
    assert_eq!(themes.len(), 1);

    themes.make_items(&project, &ExportSettings::new());
    assert!(themes.is_empty());
}

#[rstest]
fn test_yaml_keys() {
    let project = project_with_themes();
    let mut themes = MapThemes::new();
    themes.make_items(&project, &settings_with_themes(&["Robot Theme"]));

    let yaml = serde_yaml::to_string(&themes).unwrap();
    assert!(yaml.starts_with("Robot Theme:\n"));
    assert!(yaml.contains("expanded_items:"));
    assert!(yaml.contains("checked_items:"));
    assert!(!yaml.contains("ignored"));

    let parsed: MapThemes = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, themes);
}
