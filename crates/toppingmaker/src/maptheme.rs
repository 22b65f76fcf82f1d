// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Map themes requested by the export settings, flattened per layer and
//! group name.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::project::{MapThemeLayerRecord, Project};
use crate::settings::ExportSettings;

#[cfg(test)]
#[path = "./maptheme_test.rs"]
mod maptheme_test;

/// State of one layer or group within a map theme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MapThemeItem {
    /// Style of the layer, if the theme pins one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_items: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_items: Option<Vec<String>>,

    /// Only set for groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

impl From<&MapThemeLayerRecord> for MapThemeItem {
    fn from(record: &MapThemeLayerRecord) -> Self {
        Self {
            style: record
                .using_current_style
                .then(|| record.current_style.clone()),
            visible: Some(record.visible),
            expanded: Some(record.expanded_layer_node),
            expanded_items: (!record.expanded_legend_items.is_empty())
                .then(|| record.expanded_legend_items.clone()),
            checked_items: record
                .using_legend_items
                .then(|| record.checked_legend_items.clone()),
            checked: None,
        }
    }
}

/// Items of one map theme keyed by layer or group name.
pub type MapTheme = IndexMap<String, MapThemeItem>;

/// Map themes keyed by theme name, in the order the settings list them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct MapThemes(IndexMap<String, MapTheme>);

impl MapThemes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with the themes named in `export_settings`.
    ///
    /// Themes the project does not know are skipped.
    pub fn make_items(&mut self, project: &dyn Project, export_settings: &ExportSettings) {
        self.0.clear();

        for name in &export_settings.mapthemes {
            let Some(record) = project.map_theme_state(name) else {
                tracing::warn!(maptheme = %name, "map theme not found in project");
                continue;
            };

            let mut theme = MapTheme::new();
            for layer_record in &record.layer_records {
                theme.insert(layer_record.layer.clone(), MapThemeItem::from(layer_record));
            }

            if record.has_expanded_state_info {
                for group in &record.expanded_group_nodes {
                    theme.entry(group.clone()).or_default().expanded = Some(true);
                }
            }
            for group in &record.checked_group_nodes {
                theme.entry(group.clone()).or_default().checked = Some(true);
            }

            self.0.insert(name.clone(), theme);
        }
    }

    pub fn get(&self, name: &str) -> Option<&MapTheme> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MapTheme)> {
        self.0.iter()
    }
}
