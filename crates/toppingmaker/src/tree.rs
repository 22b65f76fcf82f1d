// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! The layer tree of a project topping.
//!
//! [`TreeItem::make_item`] walks a project's layer tree once and builds a
//! parallel tree of [`TreeItem`]s. Topping files requested by the export
//! settings are written to a scratch directory during that walk and linked
//! into a [`Target`] later, when the items are turned into documents.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::datasource::{layer_name_from_uri, DataSourceUri};
use crate::project::{
    CurrentStyleGuard, DataProvider, LayerTreeGroup, LayerTreeNode, MapLayer, Project,
    SHOW_FEATURE_COUNT,
};
use crate::settings::{ExportDecision, ExportSettings, StyleCategories, ToppingType, DEFAULT_STYLE};
use crate::slug::slugify;
use crate::target::Target;
use crate::{LAYERDEFINITION_TYPE, LAYERSTYLE_TYPE};

#[cfg(test)]
#[path = "./tree_test.rs"]
mod tree_test;

/// A topping file written to scratch storage, waiting to be linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// Topping type, which is also the target sub directory.
    pub topping_type: &'static str,
    /// Absolute path of the scratch file.
    pub path: PathBuf,
}

/// Everything [`TreeItem::make_item`] needs besides the node itself.
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub project: &'a dyn Project,
    pub settings: &'a ExportSettings,
    /// Directory receiving the temporary topping files.
    pub scratch_dir: &'a Path,
}

impl<'a> ParseContext<'a> {
    pub fn new(
        project: &'a dyn Project,
        settings: &'a ExportSettings,
        scratch_dir: &'a Path,
    ) -> Self {
        Self {
            project,
            settings,
            scratch_dir,
        }
    }

    fn scratch_file(&self, filename: &str) -> crate::Result<PathBuf> {
        std::fs::create_dir_all(self.scratch_dir).map_err(|e| crate::Error::WriteFailed {
            path: self.scratch_dir.to_path_buf(),
            error: e,
        })?;
        Ok(self.scratch_dir.join(filename))
    }

    fn temporary_definitionfile(
        &self,
        node: &dyn LayerTreeNode,
        name: &str,
    ) -> crate::Result<ArtifactRef> {
        let path = self.scratch_file(&format!("{}.qlr", slugify(name)))?;
        node.export_layer_definition(&path)?;
        tracing::debug!(node = %name, path = %path.display(), "wrote layer definition");
        Ok(ArtifactRef {
            topping_type: LAYERDEFINITION_TYPE,
            path,
        })
    }

    fn temporary_qmlstylefile(
        &self,
        layer: &dyn MapLayer,
        name: &str,
        categories: &StyleCategories,
        style_name: Option<&str>,
    ) -> crate::Result<ArtifactRef> {
        let filename = match style_name {
            Some(style) => format!("{}_{}.qml", slugify(name), slugify(style)),
            None => format!("{}.qml", slugify(name)),
        };
        let path = self.scratch_file(&filename)?;
        if let Some(style) = style_name {
            layer.set_current_style(style);
        }
        layer.save_named_style(&path, categories)?;
        tracing::debug!(node = %name, path = %path.display(), %categories, "wrote style");
        Ok(ArtifactRef {
            topping_type: LAYERSTYLE_TYPE,
            path,
        })
    }
}

/// How a layer is found again when the topping is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerSource {
    /// Provider and encoded source, written when the source is exported.
    Provider { provider: String, uri: String },
    /// Table (and geometry column) in a database or container, kept when
    /// neither source nor definition are exported.
    Table {
        tablename: String,
        geometrycolumn: Option<String>,
    },
}

/// Properties of a group item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupProperties {
    pub mutually_exclusive: bool,
    /// Position of the first checked child of a mutually exclusive group.
    pub mutually_exclusive_child: Option<usize>,
    pub children: Vec<TreeItem>,
}

/// Properties of a layer item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerProperties {
    pub featurecount: bool,
    pub source: Option<LayerSource>,
    /// Style file of the current style.
    pub qmlstylefile: Option<ArtifactRef>,
    /// Style files of further named styles.
    pub styles: IndexMap<String, ArtifactRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Group(GroupProperties),
    Layer(LayerProperties),
}

/// One node of the parsed layer tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeItem {
    pub name: String,
    pub checked: bool,
    pub expanded: bool,
    /// Layer definition of the node. A group exported this way has no
    /// children.
    pub definitionfile: Option<ArtifactRef>,
    pub kind: ItemKind,
}

impl TreeItem {
    /// Build the item for `node` and, for groups, all items below it.
    pub fn make_item(ctx: &ParseContext<'_>, node: &dyn LayerTreeNode) -> crate::Result<Self> {
        let name = node.name();

        let definition_setting = ctx
            .settings
            .get_setting(ToppingType::Definition, &name, None);
        let definitionfile = if definition_setting.export {
            Some(ctx.temporary_definitionfile(node, &name)?)
        } else {
            None
        };

        let kind = match node.as_group() {
            Some(group) => {
                // a group exported as definition stands for its whole subtree
                let recurse = definitionfile.is_none();
                ItemKind::Group(make_group(ctx, group, recurse)?)
            }
            None => ItemKind::Layer(make_layer(ctx, node, &name, &definition_setting)?),
        };

        Ok(Self {
            name,
            checked: node.item_visibility_checked(),
            expanded: node.is_expanded(),
            definitionfile,
            kind,
        })
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ItemKind::Group(_))
    }

    /// Child items, empty for layers.
    pub fn children(&self) -> &[TreeItem] {
        match &self.kind {
            ItemKind::Group(group) => &group.children,
            ItemKind::Layer(_) => &[],
        }
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<&TreeItem> {
        self.children().iter().find(|item| item.name == name)
    }

    /// The first checked child's position or `-1`, as written to documents.
    pub fn mutually_exclusive_child_index(&self) -> i64 {
        match &self.kind {
            ItemKind::Group(GroupProperties {
                mutually_exclusive_child: Some(index),
                ..
            }) => *index as i64,
            _ => -1,
        }
    }

    /// Number of groups and layers below this item.
    pub fn count_descendants(&self) -> (usize, usize) {
        self.children()
            .iter()
            .fold((0, 0), |(groups, layers), child| {
                let (g, l) = child.count_descendants();
                if child.is_group() {
                    (groups + g + 1, layers + l)
                } else {
                    (groups + g, layers + l + 1)
                }
            })
    }

    /// Turn this item into its document entry, linking every topping file
    /// into `target` on the way.
    pub fn item_dict(&self, target: &mut Target) -> crate::Result<NodeDocument> {
        let mut doc = ItemDocument {
            checked: self.checked,
            expanded: self.expanded,
            ..Default::default()
        };

        match &self.kind {
            ItemKind::Group(group) => {
                doc.group = true;
                if group.mutually_exclusive {
                    doc.mutually_exclusive = true;
                    doc.mutually_exclusive_child = Some(self.mutually_exclusive_child_index());
                }
            }
            ItemKind::Layer(layer) => {
                match &layer.source {
                    Some(LayerSource::Table {
                        tablename,
                        geometrycolumn,
                    }) => {
                        doc.tablename = Some(tablename.clone());
                        doc.geometrycolumn = geometrycolumn.clone();
                    }
                    Some(LayerSource::Provider { provider, uri }) => {
                        doc.provider = Some(provider.clone());
                        doc.uri = Some(uri.clone());
                    }
                    None => {}
                }
                doc.featurecount = layer.featurecount;
                if let Some(artifact) = &layer.qmlstylefile {
                    doc.qmlstylefile = target.toppingfile_link(artifact.topping_type, &artifact.path)?;
                }
                for (style_name, artifact) in &layer.styles {
                    let qmlstylefile =
                        target.toppingfile_link(artifact.topping_type, &artifact.path)?;
                    doc.styles
                        .insert(style_name.clone(), StyleDocument { qmlstylefile });
                }
            }
        }

        if let Some(artifact) = &self.definitionfile {
            doc.definitionfile = target.toppingfile_link(artifact.topping_type, &artifact.path)?;
        }

        doc.child_nodes = self.items_list(target)?;

        let mut node = NodeDocument::new();
        node.insert(self.name.clone(), doc);
        Ok(node)
    }

    /// Documents of all children, in tree order.
    pub fn items_list(&self, target: &mut Target) -> crate::Result<Vec<NodeDocument>> {
        self.children()
            .iter()
            .map(|item| item.item_dict(target))
            .collect()
    }
}

fn make_group(
    ctx: &ParseContext<'_>,
    group: &dyn LayerTreeGroup,
    recurse: bool,
) -> crate::Result<GroupProperties> {
    let mut properties = GroupProperties {
        mutually_exclusive: group.is_mutually_exclusive(),
        ..Default::default()
    };
    if !recurse {
        return Ok(properties);
    }

    for (index, child) in group.children().into_iter().enumerate() {
        let item = TreeItem::make_item(ctx, child)?;
        if properties.mutually_exclusive
            && properties.mutually_exclusive_child.is_none()
            && item.checked
        {
            properties.mutually_exclusive_child = Some(index);
        }
        properties.children.push(item);
    }
    Ok(properties)
}

fn make_layer(
    ctx: &ParseContext<'_>,
    node: &dyn LayerTreeNode,
    name: &str,
    definition_setting: &ExportDecision,
) -> crate::Result<LayerProperties> {
    let mut properties = LayerProperties {
        featurecount: node.custom_flag(SHOW_FEATURE_COUNT),
        ..Default::default()
    };

    // nodes not recognized as layer nodes are looked up by name, first match wins
    let Some(layer) = node
        .layer()
        .or_else(|| ctx.project.map_layers_by_name(name).into_iter().next())
    else {
        tracing::warn!(node = %name, "no map layer found for layer node");
        return Ok(properties);
    };

    let source_setting = ctx.settings.get_setting(ToppingType::Source, name, None);
    if source_setting.export {
        if let Some(provider) = layer.data_provider() {
            properties.source = Some(LayerSource::Provider {
                provider: provider.name,
                uri: ctx.project.write_path(&layer.public_source()),
            });
        }
    } else if !definition_setting.export {
        properties.source = layer.data_provider().as_ref().and_then(table_source);
    }

    let default_setting = ctx.settings.get_setting(ToppingType::QmlStyle, name, None);
    if default_setting.export {
        properties.qmlstylefile = Some(ctx.temporary_qmlstylefile(
            layer,
            name,
            &default_setting.categories_or_all(),
            None,
        )?);
    }

    let guard = CurrentStyleGuard::new(layer);
    for style_name in layer.style_names() {
        // the default style is handled above
        if style_name == DEFAULT_STYLE {
            continue;
        }
        let style_setting = ctx
            .settings
            .get_setting(ToppingType::QmlStyle, name, Some(&style_name));
        if style_setting.export {
            let artifact = ctx.temporary_qmlstylefile(
                guard.layer(),
                name,
                &style_setting.categories_or_all(),
                Some(&style_name),
            )?;
            properties.styles.insert(style_name, artifact);
        }
    }
    drop(guard);

    Ok(properties)
}

/// Table identity for the providers that support it.
fn table_source(provider: &DataProvider) -> Option<LayerSource> {
    match provider.name.as_str() {
        "postgres" | "mssql" => {
            let uri = DataSourceUri::parse(&provider.data_source_uri);
            Some(LayerSource::Table {
                tablename: uri.table?,
                geometrycolumn: uri.geometry_column,
            })
        }
        "ogr" if provider.storage_type.as_deref() == Some("GPKG") => {
            Some(LayerSource::Table {
                tablename: layer_name_from_uri(&provider.data_source_uri)?,
                geometrycolumn: None,
            })
        }
        _ => None,
    }
}

/// Single entry map from node name to its properties, one element of the
/// `layertree` and `child-nodes` lists.
pub type NodeDocument = IndexMap<String, ItemDocument>;

/// Serialized properties of one layer tree node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ItemDocument {
    pub checked: bool,

    pub expanded: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub group: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub mutually_exclusive: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutually_exclusive_child: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablename: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometrycolumn: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub featurecount: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qmlstylefile: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub styles: IndexMap<String, StyleDocument>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitionfile: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_nodes: Vec<NodeDocument>,
}

/// Serialized properties of one named style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StyleDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qmlstylefile: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}
