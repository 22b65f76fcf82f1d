// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! The project topping: layer tree, map themes and layer order of a
//! project, written as one YAML file plus linked topping files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::maptheme::MapThemes;
use crate::project::Project;
use crate::settings::ExportSettings;
use crate::slug::slugify;
use crate::target::Target;
use crate::tree::{GroupProperties, ItemKind, NodeDocument, ParseContext, TreeItem};
use crate::PROJECTTOPPING_TYPE;

#[cfg(test)]
#[path = "./topping_test.rs"]
mod topping_test;

/// Directory below the home directory receiving temporary topping files.
const SCRATCH_DIRNAME: &str = ".temp_topping_files";

/// The YAML document of a project topping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProjectToppingDocument {
    pub layertree: Vec<NodeDocument>,
    pub mapthemes: MapThemes,
    pub layerorder: Vec<String>,
}

impl ProjectToppingDocument {
    /// Parse a document from YAML string.
    pub fn from_yaml<S: Into<String>>(yaml: S) -> crate::Result<Self> {
        let yaml = yaml.into();
        serde_yaml::from_str(&yaml).map_err(|e| crate::Error::InvalidYaml {
            error: e,
            yaml_content: yaml,
        })
    }
}

/// A project configuration resulting in a YAML file with the layer tree,
/// the map themes and the layer order of a project.
///
/// Style files, layer definition files and the source of layers are added
/// according to the [`ExportSettings`] passed to
/// [`parse`](Self::parse), and written next to the YAML
/// file by [`generate_files`](Self::generate_files).
#[derive(Debug, Clone)]
pub struct ProjectTopping {
    /// The invisible root group; its children are the top level nodes.
    pub layertree: TreeItem,
    pub mapthemes: MapThemes,
    pub layerorder: Vec<String>,
    scratch_dir: PathBuf,
}

impl Default for ProjectTopping {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectTopping {
    /// An empty topping writing temporary files to `~/.temp_topping_files`.
    pub fn new() -> Self {
        let scratch_dir = dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(SCRATCH_DIRNAME);
        Self::with_scratch_dir(scratch_dir)
    }

    /// An empty topping writing temporary files to `scratch_dir`.
    pub fn with_scratch_dir<P: Into<PathBuf>>(scratch_dir: P) -> Self {
        Self {
            layertree: empty_root(),
            mapthemes: MapThemes::new(),
            layerorder: Vec::new(),
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Read the layer tree, map themes and layer order of `project`,
    /// replacing whatever was parsed before.
    ///
    /// Returns `Ok(false)` if the project has no layer tree.
    pub fn parse(
        &mut self,
        project: &dyn Project,
        export_settings: &ExportSettings,
    ) -> crate::Result<bool> {
        let Some(root) = project.layer_tree_root() else {
            tracing::warn!("could not parse the project, it has no layer tree");
            return Ok(false);
        };

        let ctx = ParseContext::new(project, export_settings, &self.scratch_dir);
        self.layertree = TreeItem::make_item(&ctx, root)?;
        self.mapthemes.make_items(project, export_settings);
        self.layerorder = project.custom_layer_order().unwrap_or_default();

        let (groups, layers) = self.layertree.count_descendants();
        tracing::info!(groups, layers, "project parsed with export settings");
        Ok(true)
    }

    /// Build the document, placing every topping file into `target`.
    pub fn to_document(&self, target: &mut Target) -> crate::Result<ProjectToppingDocument> {
        Ok(ProjectToppingDocument {
            layertree: self.layertree.items_list(target)?,
            mapthemes: self.mapthemes.clone(),
            layerorder: self.layerorder.clone(),
        })
    }

    /// Write the project topping and all its topping files into `target`.
    ///
    /// The project topping is written as `{slug of projectname}.yaml` and
    /// linked like any other topping file; the returned link is the one the
    /// target's path resolver produced for it.
    pub fn generate_files(&self, target: &mut Target) -> crate::Result<String> {
        let document = self.to_document(target)?;
        let yaml = serde_yaml::to_string(&document).map_err(crate::Error::Serialize)?;

        let projecttopping_slug = format!("{}.yaml", slugify(&target.projectname));
        let (absolute_filedir_path, _) = target.filedir_path(PROJECTTOPPING_TYPE)?;
        let path = absolute_filedir_path.join(&projecttopping_slug);
        std::fs::write(&path, yaml).map_err(|e| crate::Error::WriteFailed {
            path: path.clone(),
            error: e,
        })?;
        tracing::info!(path = %path.display(), "project topping written to YAML file");

        target.resolve_path(&projecttopping_slug, PROJECTTOPPING_TYPE)
    }

    /// Read a project topping back from `target`. Not implemented yet.
    pub fn load_files(&mut self, _target: &Target) -> crate::Result<()> {
        Err(crate::Error::NotImplemented("load_files"))
    }

    /// Create a project from the loaded topping. Not implemented yet.
    pub fn generate_project(&self, _target: &Target) -> crate::Result<()> {
        Err(crate::Error::NotImplemented("generate_project"))
    }
}

fn empty_root() -> TreeItem {
    TreeItem {
        name: String::new(),
        checked: true,
        expanded: true,
        definitionfile: None,
        kind: ItemKind::Group(GroupProperties::default()),
    }
}
