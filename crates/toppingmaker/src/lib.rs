// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! toppingmaker - project toppings from GIS projects
//!
//! This crate turns the layer tree of a GIS project into a project topping:
//! a YAML file describing the layer tree, map themes and layer order, plus
//! the style (`.qml`) and layer definition (`.qlr`) files it links to.
//! Toppings are meant to live in a repository, so every generated file is
//! recorded in the manifest of the [`Target`] it was written to.
//!
//! # Example
//!
//! ```yaml
//! # projecttopping/freddys.yaml
//! layertree:
//!   - Big Group:
//!       checked: true
//!       expanded: true
//!       group: true
//!       child-nodes:
//!         - Layer One:
//!             checked: true
//!             expanded: true
//!             qmlstylefile: freddys_projects/layerstyle/freddys_layer_one.qml
//!         - Layer Three:
//!             checked: false
//!             expanded: true
//!             definitionfile: freddys_projects/layerdefinition/freddys_layer_three.qlr
//! mapthemes: {}
//! layerorder: []
//! ```
//!
//! The GIS project itself is reached through the traits in [`project`];
//! [`memory`] provides an implementation held in memory.

pub mod datasource;
pub mod error;
pub mod maptheme;
pub mod memory;
pub mod project;
pub mod settings;
pub mod slug;
pub mod target;
pub mod topping;
pub mod tree;

#[cfg(test)]
mod fixtures;

pub use error::{Error, Result};
pub use maptheme::{MapTheme, MapThemeItem, MapThemes};
pub use memory::{MemoryLayer, MemoryNode, MemoryProject};
pub use project::{LayerTreeGroup, LayerTreeNode, MapLayer, Project};
pub use settings::{
    ExportDecision, ExportSetting, ExportSettings, StyleCategories, StyleCategory, ToppingType,
};
pub use slug::slugify;
pub use target::{
    unique_id_in_target_scope, DefaultPathResolver, ManifestEntry, PathResolver, Target,
    VersionedPathResolver,
};
pub use topping::{ProjectTopping, ProjectToppingDocument};
pub use tree::{ArtifactRef, ItemDocument, ItemKind, LayerSource, NodeDocument, TreeItem};

/// Topping type and directory of the project topping YAML files.
pub const PROJECTTOPPING_TYPE: &str = "projecttopping";

/// Topping type and directory of layer definition files.
pub const LAYERDEFINITION_TYPE: &str = "layerdefinition";

/// Topping type and directory of style files.
pub const LAYERSTYLE_TYPE: &str = "layerstyle";

/// Well-known filename for export settings.
pub const SETTINGS_FILENAME: &str = "toppingmaker.yaml";

/// Well-known filename for project snapshots.
pub const PROJECT_FILENAME: &str = "project.yaml";
