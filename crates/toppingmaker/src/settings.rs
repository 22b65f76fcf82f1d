// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Export settings deciding which topping files are made per layer tree node.
//!
//! Settings are keyed by node name only. Two nodes with the same name in
//! different groups share their settings.
//!
//! ```yaml
//! api: toppingmaker/v0
//! qmlstyle:
//!   Layer One:
//!     default: { export: true, categories: [Symbology, Labeling] }
//!     night: { export: true }
//! definition:
//!   Layer Three: { export: true }
//! source:
//!   Layer One: { export: true }
//! mapthemes:
//!   - Robot Theme
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

#[cfg(test)]
#[path = "./settings_test.rs"]
mod settings_test;

/// Style name used when a setting or lookup names no style.
pub const DEFAULT_STYLE: &str = "default";

/// API version for settings files.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum SettingsApiVersion {
    #[default]
    #[serde(rename = "toppingmaker/v0")]
    V0,
}

/// Helper for two-stage deserialization to determine API version first.
#[derive(Deserialize)]
struct ApiVersionMapping {
    #[serde(default)]
    api: SettingsApiVersion,
}

/// Kind of topping a setting controls.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum ToppingType {
    /// A QML style file per layer (and per named style).
    QmlStyle,
    /// A QLR layer definition file per layer or group.
    Definition,
    /// The provider and source of a layer written into the topping.
    Source,
}

/// Style categories a QML style export can be restricted to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum StyleCategory {
    LayerConfiguration,
    Symbology,
    Symbology3D,
    Labeling,
    Fields,
    Forms,
    Actions,
    MapTips,
    Diagrams,
    AttributeTable,
    Rendering,
    CustomProperties,
    GeometryOptions,
    Relations,
    Temporal,
    Legend,
    Elevation,
    Notes,
}

/// A set of [`StyleCategory`] values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct StyleCategories(BTreeSet<StyleCategory>);

impl StyleCategories {
    /// Every known category.
    pub fn all() -> Self {
        StyleCategory::iter().collect()
    }

    pub fn contains(&self, category: StyleCategory) -> bool {
        self.0.contains(&category)
    }

    pub fn is_all(&self) -> bool {
        self.0.len() == StyleCategory::iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = StyleCategory> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<StyleCategory> for StyleCategories {
    fn from_iter<T: IntoIterator<Item = StyleCategory>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for StyleCategories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return f.write_str("AllStyleCategories");
        }
        let names: Vec<String> = self.iter().map(|c| c.to_string()).collect();
        f.write_str(&names.join("|"))
    }
}

/// A single registered setting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExportSetting {
    #[serde(default = "default_export")]
    pub export: bool,

    /// Restricts a style export. `None` means all categories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<StyleCategories>,
}

fn default_export() -> bool {
    true
}

impl Default for ExportSetting {
    fn default() -> Self {
        Self {
            export: true,
            categories: None,
        }
    }
}

/// Result of looking up the settings for one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportDecision {
    pub export: bool,
    pub categories: Option<StyleCategories>,
}

impl ExportDecision {
    /// The decision for a node nobody registered a setting for.
    pub fn skip() -> Self {
        Self::default()
    }

    /// Categories to export, all of them if the setting names none.
    pub fn categories_or_all(&self) -> StyleCategories {
        self.categories.clone().unwrap_or_else(StyleCategories::all)
    }
}

impl From<&ExportSetting> for ExportDecision {
    fn from(setting: &ExportSetting) -> Self {
        Self {
            export: setting.export,
            categories: setting.categories.clone(),
        }
    }
}

/// Registry of export settings, usually loaded from a `toppingmaker.yaml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExportSettings {
    /// API version identifier.
    #[serde(default)]
    pub api: SettingsApiVersion,

    /// Style settings per node name and style name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub qmlstyle: IndexMap<String, IndexMap<String, ExportSetting>>,

    /// Layer definition settings per node name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub definition: IndexMap<String, ExportSetting>,

    /// Source settings per node name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub source: IndexMap<String, ExportSetting>,

    /// Names of the map themes to write into the topping.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mapthemes: Vec<String>,

    /// Path to the file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl ExportSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from YAML string.
    pub fn from_yaml<S: Into<String>>(yaml: S) -> crate::Result<Self> {
        let yaml = yaml.into();

        let value: serde_yaml::Value =
            serde_yaml::from_str(&yaml).map_err(|e| crate::Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        // an empty document is an empty registry
        if value.is_null() {
            return Ok(Self::default());
        }

        let with_version: ApiVersionMapping =
            serde_yaml::from_value(value.clone()).map_err(|e| crate::Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        match with_version.api {
            SettingsApiVersion::V0 => {
                serde_yaml::from_value(value).map_err(|e| crate::Error::InvalidYaml {
                    error: e,
                    yaml_content: yaml,
                })
            }
        }
    }

    /// Load settings from file path.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| crate::Error::ReadFailed {
            path: path.to_path_buf(),
            error: e,
        })?;

        let mut settings = Self::from_yaml(yaml)?;
        settings.source_path = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Register a setting for the node called `name`.
    ///
    /// `style_name` only applies to [`ToppingType::QmlStyle`]; `None` registers
    /// the default style. Registering twice replaces the earlier setting.
    pub fn set_setting_values(
        &mut self,
        topping_type: ToppingType,
        name: &str,
        export: bool,
        categories: Option<StyleCategories>,
        style_name: Option<&str>,
    ) {
        let setting = ExportSetting { export, categories };
        match topping_type {
            ToppingType::QmlStyle => {
                self.qmlstyle
                    .entry(name.to_string())
                    .or_default()
                    .insert(style_name.unwrap_or(DEFAULT_STYLE).to_string(), setting);
            }
            ToppingType::Definition => {
                self.definition.insert(name.to_string(), setting);
            }
            ToppingType::Source => {
                self.source.insert(name.to_string(), setting);
            }
        }
    }

    /// Decide whether the node called `name` gets a topping of `topping_type`.
    ///
    /// Style lookups try `style_name` first and fall back to the default
    /// style. A missing registration is a negative decision.
    pub fn get_setting(
        &self,
        topping_type: ToppingType,
        name: &str,
        style_name: Option<&str>,
    ) -> ExportDecision {
        let setting = match topping_type {
            ToppingType::QmlStyle => self.qmlstyle.get(name).and_then(|styles| {
                styles
                    .get(style_name.unwrap_or(DEFAULT_STYLE))
                    .or_else(|| styles.get(DEFAULT_STYLE))
            }),
            ToppingType::Definition => self.definition.get(name),
            ToppingType::Source => self.source.get(name),
        };
        setting.map(ExportDecision::from).unwrap_or_default()
    }
}
