// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! The view of a GIS project that toppingmaker reads from.
//!
//! A project exposes its layer tree, the map layers registered in it and
//! a few project wide services. Map layers may be shared between several
//! tree nodes, so they take `&self` everywhere, including for switching the
//! current style.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::settings::StyleCategories;

/// Custom node property holding the feature count flag.
pub const SHOW_FEATURE_COUNT: &str = "showFeatureCount";

/// A GIS project.
pub trait Project {
    /// The invisible root group of the layer tree, if the project has one.
    fn layer_tree_root(&self) -> Option<&dyn LayerTreeNode>;

    /// All registered map layers called `name`, in registration order.
    fn map_layers_by_name(&self, name: &str) -> Vec<&dyn MapLayer>;

    /// Encode a layer source for storage (e.g. relative file paths).
    fn write_path(&self, source: &str) -> String;

    /// Layer names in custom drawing order, `None` if the project uses the
    /// layer tree order.
    fn custom_layer_order(&self) -> Option<Vec<String>>;

    /// The stored state of the map theme called `name`.
    fn map_theme_state(&self, name: &str) -> Option<MapThemeRecord>;
}

/// A node of the layer tree, either a group or a layer.
pub trait LayerTreeNode {
    fn name(&self) -> String;

    /// Whether the node's own visibility checkbox is checked.
    fn item_visibility_checked(&self) -> bool;

    fn is_expanded(&self) -> bool;

    /// A boolean custom property of the node, `false` if unset.
    fn custom_flag(&self, key: &str) -> bool;

    /// The group view of this node, `None` for layer nodes.
    fn as_group(&self) -> Option<&dyn LayerTreeGroup>;

    /// The map layer of a layer node.
    ///
    /// `None` for groups and for nodes the project did not recognize as
    /// layer nodes. The latter are resolved by name through
    /// [`Project::map_layers_by_name`].
    fn layer(&self) -> Option<&dyn MapLayer>;

    /// Write the node and everything below it as a layer definition file.
    fn export_layer_definition(&self, path: &Path) -> crate::Result<()>;
}

/// Group specific view of a [`LayerTreeNode`].
pub trait LayerTreeGroup {
    fn is_mutually_exclusive(&self) -> bool;

    /// Direct children in tree order.
    fn children(&self) -> Vec<&dyn LayerTreeNode>;
}

/// Provider information of a map layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DataProvider {
    /// Provider key, e.g. `postgres`, `mssql`, `ogr` or `memory`.
    pub name: String,
    /// The provider specific data source string.
    pub data_source_uri: String,
    /// Storage format reported by file based providers, e.g. `GPKG`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
}

/// A map layer registered in the project.
pub trait MapLayer {
    fn name(&self) -> String;

    fn data_provider(&self) -> Option<DataProvider>;

    /// The source string as shown to users (credentials stripped).
    fn public_source(&self) -> String;

    /// Name of the currently active style.
    fn current_style(&self) -> String;

    /// Names of all styles of the layer.
    fn style_names(&self) -> Vec<String>;

    /// Activate another style. Returns `false` if the style does not exist.
    fn set_current_style(&self, name: &str) -> bool;

    /// Write the current style restricted to `categories` as a QML file.
    fn save_named_style(&self, path: &Path, categories: &StyleCategories) -> crate::Result<()>;
}

/// Restores the current style of a layer when dropped.
///
/// Every style switch while collecting a layer's styles happens inside the
/// lifetime of one guard, so the layer ends up with its original style on
/// every exit path.
pub struct CurrentStyleGuard<'a> {
    layer: &'a dyn MapLayer,
    original: String,
}

impl<'a> CurrentStyleGuard<'a> {
    pub fn new(layer: &'a dyn MapLayer) -> Self {
        Self {
            original: layer.current_style(),
            layer,
        }
    }

    /// The style that will be restored.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn layer(&self) -> &'a dyn MapLayer {
        self.layer
    }
}

impl Drop for CurrentStyleGuard<'_> {
    fn drop(&mut self) {
        if !self.layer.set_current_style(&self.original) {
            tracing::warn!(
                layer = %self.layer.name(),
                style = %self.original,
                "could not restore current style"
            );
        }
    }
}

impl std::fmt::Debug for CurrentStyleGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentStyleGuard")
            .field("layer", &self.layer.name())
            .field("original", &self.original)
            .finish()
    }
}

/// Stored state of one map theme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MapThemeRecord {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layer_records: Vec<MapThemeLayerRecord>,

    /// Whether the theme stores the expanded state of group nodes.
    #[serde(default)]
    pub has_expanded_state_info: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expanded_group_nodes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checked_group_nodes: Vec<String>,
}

/// State of one layer within a map theme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MapThemeLayerRecord {
    pub layer: String,

    #[serde(default)]
    pub using_current_style: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_style: String,

    #[serde(default = "default_true")]
    pub visible: bool,

    #[serde(default = "default_true")]
    pub expanded_layer_node: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expanded_legend_items: Vec<String>,

    #[serde(default)]
    pub using_legend_items: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checked_legend_items: Vec<String>,
}

fn default_true() -> bool {
    true
}
