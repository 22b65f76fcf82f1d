// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! An in-memory project.
//!
//! [`MemoryProject`] implements the [`Project`] traits without a GIS
//! behind it. It is built either through the builder methods or from a
//! YAML project snapshot:
//!
//! ```yaml
//! api: toppingmaker/v0/project
//! home: /data/projects/freddy
//! layers:
//!   - name: Parcels
//!     provider:
//!       name: postgres
//!       data_source_uri: dbname='gis' table="survey"."parcels" (geometry) sql=
//!     styles:
//!       default: <renderer-v2 type="singleSymbol"/>
//!       night: <renderer-v2 type="categorizedSymbol"/>
//! layertree:
//!   - name: Survey
//!     group: true
//!     mutually-exclusive: true
//!     children:
//!       - name: Parcels
//!         layer: Parcels
//!         featurecount: true
//! layerorder: [Parcels]
//! ```
//!
//! A non-group node without `layer` stands for a node the project did not
//! recognize as a layer node; it is resolved by its name when parsed.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::project::{
    DataProvider, LayerTreeGroup, LayerTreeNode, MapLayer, MapThemeRecord, Project,
    SHOW_FEATURE_COUNT,
};
use crate::settings::{StyleCategories, DEFAULT_STYLE};

#[cfg(test)]
#[path = "./memory_test.rs"]
mod memory_test;

/// A map layer held in memory.
#[derive(Debug)]
pub struct MemoryLayer {
    name: String,
    provider: Option<DataProvider>,
    source: String,
    styles: IndexMap<String, String>,
    current_style: RefCell<String>,
}

impl MemoryLayer {
    /// A layer of `provider` reading from `source`, with an empty
    /// `default` style.
    pub fn new<N, P, S>(name: N, provider: P, source: S) -> Self
    where
        N: Into<String>,
        P: Into<String>,
        S: Into<String>,
    {
        let source = source.into();
        Self {
            name: name.into(),
            provider: Some(DataProvider {
                name: provider.into(),
                data_source_uri: source.clone(),
                storage_type: None,
            }),
            source,
            styles: IndexMap::from([(DEFAULT_STYLE.to_string(), String::new())]),
            current_style: RefCell::new(DEFAULT_STYLE.to_string()),
        }
    }

    /// A layer whose provider could not be loaded.
    pub fn without_provider<N: Into<String>>(name: N) -> Self {
        let mut layer = Self::new(name, "", "");
        layer.provider = None;
        layer
    }

    pub fn with_storage_type<T: Into<String>>(mut self, storage_type: T) -> Self {
        if let Some(provider) = self.provider.as_mut() {
            provider.storage_type = Some(storage_type.into());
        }
        self
    }

    /// Add or replace a named style.
    pub fn with_style<N: Into<String>, B: Into<String>>(mut self, name: N, body: B) -> Self {
        self.styles.insert(name.into(), body.into());
        self
    }

    /// Make an existing style the current one.
    pub fn with_current_style(self, name: &str) -> Self {
        self.set_current_style(name);
        self
    }

    fn from_snapshot(snapshot: &LayerSnapshot) -> Self {
        let mut styles = snapshot.styles.clone();
        if styles.is_empty() {
            styles.insert(DEFAULT_STYLE.to_string(), String::new());
        }
        let current_style = snapshot
            .current_style
            .clone()
            .filter(|style| styles.contains_key(style))
            .or_else(|| styles.keys().next().cloned())
            .unwrap_or_else(|| DEFAULT_STYLE.to_string());
        let source = snapshot
            .source
            .clone()
            .or_else(|| {
                snapshot
                    .provider
                    .as_ref()
                    .map(|p| p.data_source_uri.clone())
            })
            .unwrap_or_default();

        Self {
            name: snapshot.name.clone(),
            provider: snapshot.provider.clone(),
            source,
            styles,
            current_style: RefCell::new(current_style),
        }
    }
}

impl MapLayer for MemoryLayer {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn data_provider(&self) -> Option<DataProvider> {
        self.provider.clone()
    }

    fn public_source(&self) -> String {
        self.source.clone()
    }

    fn current_style(&self) -> String {
        self.current_style.borrow().clone()
    }

    fn style_names(&self) -> Vec<String> {
        self.styles.keys().cloned().collect()
    }

    fn set_current_style(&self, name: &str) -> bool {
        if !self.styles.contains_key(name) {
            return false;
        }
        *self.current_style.borrow_mut() = name.to_string();
        true
    }

    fn save_named_style(&self, path: &Path, categories: &StyleCategories) -> crate::Result<()> {
        let current = self.current_style();
        let body = self.styles.get(&current).map(String::as_str).unwrap_or("");
        let qml = format!(
            "<!DOCTYPE qgis PUBLIC 'http://mrcc.com/qgis.dtd' 'SYSTEM'>\n\
             <qgis styleCategories=\"{categories}\" styleName=\"{current}\">\n{body}\n</qgis>\n"
        );
        std::fs::write(path, qml).map_err(|e| crate::Error::WriteFailed {
            path: path.to_path_buf(),
            error: e,
        })
    }
}

#[derive(Debug)]
enum MemoryNodeKind {
    Group {
        mutually_exclusive: bool,
        children: Vec<MemoryNode>,
    },
    /// `None` for nodes not recognized as layer nodes.
    Layer(Option<Rc<MemoryLayer>>),
}

/// A layer tree node held in memory.
#[derive(Debug)]
pub struct MemoryNode {
    name: String,
    checked: bool,
    expanded: bool,
    custom_flags: IndexMap<String, bool>,
    kind: MemoryNodeKind,
}

impl MemoryNode {
    fn new(name: String, kind: MemoryNodeKind) -> Self {
        Self {
            name,
            checked: true,
            expanded: true,
            custom_flags: IndexMap::new(),
            kind,
        }
    }

    /// An empty group.
    pub fn group<N: Into<String>>(name: N) -> Self {
        Self::new(
            name.into(),
            MemoryNodeKind::Group {
                mutually_exclusive: false,
                children: Vec::new(),
            },
        )
    }

    fn children_mut(&mut self) -> &mut Vec<MemoryNode> {
        match &mut self.kind {
            MemoryNodeKind::Group { children, .. } => children,
            MemoryNodeKind::Layer(_) => panic!("layer node '{}' cannot have children", self.name),
        }
    }

    fn push(&mut self, node: MemoryNode) -> &mut MemoryNode {
        let children = self.children_mut();
        children.push(node);
        let last = children.len() - 1;
        &mut children[last]
    }

    /// Append a new group and return it.
    ///
    /// # Panics
    ///
    /// If this node is a layer node.
    pub fn add_group<N: Into<String>>(&mut self, name: N) -> &mut MemoryNode {
        self.push(Self::group(name))
    }

    /// Append a node for `layer` and return it.
    ///
    /// # Panics
    ///
    /// If this node is a layer node.
    pub fn add_layer(&mut self, layer: &Rc<MemoryLayer>) -> &mut MemoryNode {
        let node = Self::new(layer.name(), MemoryNodeKind::Layer(Some(Rc::clone(layer))));
        self.push(node)
    }

    /// Append a layer node that does not reference its map layer.
    ///
    /// # Panics
    ///
    /// If this node is a layer node.
    pub fn add_unresolved_layer<N: Into<String>>(&mut self, name: N) -> &mut MemoryNode {
        self.push(Self::new(name.into(), MemoryNodeKind::Layer(None)))
    }

    pub fn set_item_visibility_checked(&mut self, checked: bool) -> &mut Self {
        self.checked = checked;
        self
    }

    pub fn set_expanded(&mut self, expanded: bool) -> &mut Self {
        self.expanded = expanded;
        self
    }

    /// Has no effect on layer nodes.
    pub fn set_mutually_exclusive(&mut self, value: bool) -> &mut Self {
        if let MemoryNodeKind::Group {
            mutually_exclusive, ..
        } = &mut self.kind
        {
            *mutually_exclusive = value;
        }
        self
    }

    pub fn set_custom_flag<K: Into<String>>(&mut self, key: K, value: bool) -> &mut Self {
        self.custom_flags.insert(key.into(), value);
        self
    }

    /// Names of all layer nodes below this node, depth first.
    pub fn find_layers(&self) -> Vec<String> {
        match &self.kind {
            MemoryNodeKind::Group { children, .. } => {
                children.iter().flat_map(|child| child.find_layers()).collect()
            }
            MemoryNodeKind::Layer(_) => vec![self.name.clone()],
        }
    }

    fn to_snapshot(&self) -> NodeSnapshot {
        let (group, mutually_exclusive, layer, children) = match &self.kind {
            MemoryNodeKind::Group {
                mutually_exclusive,
                children,
            } => (
                true,
                *mutually_exclusive,
                None,
                children.iter().map(Self::to_snapshot).collect(),
            ),
            MemoryNodeKind::Layer(layer) => {
                (false, false, layer.as_ref().map(|l| l.name()), Vec::new())
            }
        };
        NodeSnapshot {
            name: self.name.clone(),
            checked: self.checked,
            expanded: self.expanded,
            group,
            mutually_exclusive,
            featurecount: self.custom_flag(SHOW_FEATURE_COUNT),
            layer,
            children,
        }
    }

    fn from_snapshot(snapshot: &NodeSnapshot, layers: &[Rc<MemoryLayer>]) -> crate::Result<Self> {
        let kind = if snapshot.group {
            MemoryNodeKind::Group {
                mutually_exclusive: snapshot.mutually_exclusive,
                children: snapshot
                    .children
                    .iter()
                    .map(|child| Self::from_snapshot(child, layers))
                    .collect::<crate::Result<_>>()?,
            }
        } else {
            let layer = match &snapshot.layer {
                Some(reference) => Some(find_layer(reference, layers)?),
                None => None,
            };
            MemoryNodeKind::Layer(layer)
        };

        let mut node = Self::new(snapshot.name.clone(), kind);
        node.checked = snapshot.checked;
        node.expanded = snapshot.expanded;
        if snapshot.featurecount {
            node.custom_flags.insert(SHOW_FEATURE_COUNT.to_string(), true);
        }
        Ok(node)
    }
}

fn find_layer(reference: &str, layers: &[Rc<MemoryLayer>]) -> crate::Result<Rc<MemoryLayer>> {
    layers
        .iter()
        .find(|layer| layer.name == reference)
        .map(Rc::clone)
        .ok_or_else(|| unknown_layer(reference, layers))
}

fn unknown_layer(reference: &str, layers: &[Rc<MemoryLayer>]) -> crate::Error {
    let lowered = reference.to_lowercase();
    let similar = layers
        .iter()
        .map(|layer| layer.name.clone())
        .filter(|name| {
            let name = name.to_lowercase();
            name.contains(&lowered) || lowered.contains(&name)
        })
        .collect();
    crate::Error::UnknownLayer {
        reference: reference.to_string(),
        similar,
    }
}

impl LayerTreeNode for MemoryNode {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn item_visibility_checked(&self) -> bool {
        self.checked
    }

    fn is_expanded(&self) -> bool {
        self.expanded
    }

    fn custom_flag(&self, key: &str) -> bool {
        self.custom_flags.get(key).copied().unwrap_or(false)
    }

    fn as_group(&self) -> Option<&dyn LayerTreeGroup> {
        match self.kind {
            MemoryNodeKind::Group { .. } => Some(self),
            MemoryNodeKind::Layer(_) => None,
        }
    }

    fn layer(&self) -> Option<&dyn MapLayer> {
        match &self.kind {
            MemoryNodeKind::Layer(Some(layer)) => Some(layer.as_ref()),
            _ => None,
        }
    }

    fn export_layer_definition(&self, path: &Path) -> crate::Result<()> {
        let yaml = serde_yaml::to_string(&self.to_snapshot()).map_err(crate::Error::Serialize)?;
        std::fs::write(path, yaml).map_err(|e| crate::Error::WriteFailed {
            path: path.to_path_buf(),
            error: e,
        })
    }
}

impl LayerTreeGroup for MemoryNode {
    fn is_mutually_exclusive(&self) -> bool {
        matches!(
            self.kind,
            MemoryNodeKind::Group {
                mutually_exclusive: true,
                ..
            }
        )
    }

    fn children(&self) -> Vec<&dyn LayerTreeNode> {
        match &self.kind {
            MemoryNodeKind::Group { children, .. } => children
                .iter()
                .map(|child| child as &dyn LayerTreeNode)
                .collect(),
            MemoryNodeKind::Layer(_) => Vec::new(),
        }
    }
}

/// A project held in memory.
#[derive(Debug)]
pub struct MemoryProject {
    root: Option<MemoryNode>,
    layers: Vec<Rc<MemoryLayer>>,
    custom_layer_order: Option<Vec<String>>,
    map_themes: IndexMap<String, MapThemeRecord>,
    home: Option<PathBuf>,
}

impl Default for MemoryProject {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProject {
    /// An empty project with an empty layer tree.
    pub fn new() -> Self {
        Self {
            root: Some(MemoryNode::group("")),
            layers: Vec::new(),
            custom_layer_order: None,
            map_themes: IndexMap::new(),
            home: None,
        }
    }

    /// A project without layer tree.
    pub fn without_layer_tree() -> Self {
        Self {
            root: None,
            ..Self::new()
        }
    }

    /// Directory that file sources are written relative to.
    pub fn with_home<P: Into<PathBuf>>(mut self, home: P) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Register a map layer without adding it to the layer tree.
    pub fn add_map_layer(&mut self, layer: MemoryLayer) -> Rc<MemoryLayer> {
        let layer = Rc::new(layer);
        self.layers.push(Rc::clone(&layer));
        layer
    }

    /// The root group, created if the project has none.
    pub fn layer_tree_root_mut(&mut self) -> &mut MemoryNode {
        self.root.get_or_insert_with(|| MemoryNode::group(""))
    }

    pub fn set_custom_layer_order<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_layer_order = Some(names.into_iter().map(Into::into).collect());
    }

    pub fn add_map_theme<N: Into<String>>(&mut self, name: N, record: MapThemeRecord) {
        self.map_themes.insert(name.into(), record);
    }

    /// Parse a project snapshot from YAML string.
    pub fn from_yaml<S: Into<String>>(yaml: S) -> crate::Result<Self> {
        let yaml = yaml.into();

        let value: serde_yaml::Value =
            serde_yaml::from_str(&yaml).map_err(|e| crate::Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        let with_version: ProjectApiVersionMapping = serde_yaml::from_value(value.clone())
            .map_err(|e| crate::Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        let snapshot: ProjectSnapshot = match with_version.api {
            ProjectApiVersion::V0 => {
                serde_yaml::from_value(value).map_err(|e| crate::Error::InvalidYaml {
                    error: e,
                    yaml_content: yaml,
                })?
            }
        };
        Self::from_snapshot(&snapshot)
    }

    /// Load a project snapshot from file path.
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| crate::Error::ReadFailed {
            path: path.to_path_buf(),
            error: e,
        })?;
        let mut project = Self::from_yaml(yaml)?;
        // relative sources are relative to the snapshot by default
        if project.home.is_none() {
            project.home = path.parent().map(Path::to_path_buf);
        }
        Ok(project)
    }

    pub fn from_snapshot(snapshot: &ProjectSnapshot) -> crate::Result<Self> {
        let layers: Vec<Rc<MemoryLayer>> = snapshot
            .layers
            .iter()
            .map(|layer| Rc::new(MemoryLayer::from_snapshot(layer)))
            .collect();

        let mut root = MemoryNode::group("");
        for node in &snapshot.layertree {
            root.push(MemoryNode::from_snapshot(node, &layers)?);
        }

        if let Some(order) = &snapshot.layerorder {
            for name in order {
                find_layer(name, &layers)?;
            }
        }

        Ok(Self {
            root: Some(root),
            layers,
            custom_layer_order: snapshot.layerorder.clone(),
            map_themes: snapshot.mapthemes.clone(),
            home: snapshot.home.clone(),
        })
    }
}

impl Project for MemoryProject {
    fn layer_tree_root(&self) -> Option<&dyn LayerTreeNode> {
        self.root.as_ref().map(|root| root as &dyn LayerTreeNode)
    }

    fn map_layers_by_name(&self, name: &str) -> Vec<&dyn MapLayer> {
        self.layers
            .iter()
            .filter(|layer| layer.name == name)
            .map(|layer| layer.as_ref() as &dyn MapLayer)
            .collect()
    }

    /// File paths below the project home become `./` relative, with `/`
    /// separators. Everything else is kept as is.
    fn write_path(&self, source: &str) -> String {
        let Some(home) = &self.home else {
            return source.to_string();
        };
        let (file, options) = match source.split_once('|') {
            Some((file, options)) => (file, Some(options)),
            None => (source, None),
        };
        let Ok(relative) = Path::new(file).strip_prefix(home) else {
            return source.to_string();
        };
        let relative: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        match options {
            Some(options) => format!("./{}|{options}", relative.join("/")),
            None => format!("./{}", relative.join("/")),
        }
    }

    fn custom_layer_order(&self) -> Option<Vec<String>> {
        self.custom_layer_order.clone()
    }

    fn map_theme_state(&self, name: &str) -> Option<MapThemeRecord> {
        self.map_themes.get(name).cloned()
    }
}

/// API version for project snapshot files.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ProjectApiVersion {
    #[default]
    #[serde(rename = "toppingmaker/v0/project")]
    V0,
}

#[derive(Deserialize)]
struct ProjectApiVersionMapping {
    #[serde(default)]
    api: ProjectApiVersion,
}

/// Serialized form of a [`MemoryProject`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProjectSnapshot {
    #[serde(default)]
    pub api: ProjectApiVersion,

    /// Directory file sources are written relative to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<LayerSnapshot>,

    /// Top level nodes below the invisible root.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layertree: Vec<NodeSnapshot>,

    /// Custom drawing order, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layerorder: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub mapthemes: IndexMap<String, MapThemeRecord>,
}

/// Serialized form of a [`MemoryLayer`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LayerSnapshot {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<DataProvider>,

    /// Public source, defaults to the provider's data source string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Style bodies by style name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub styles: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_style: Option<String>,
}

/// Serialized form of a [`MemoryNode`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeSnapshot {
    pub name: String,

    #[serde(default = "default_true")]
    pub checked: bool,

    #[serde(default = "default_true")]
    pub expanded: bool,

    #[serde(default)]
    pub group: bool,

    #[serde(default)]
    pub mutually_exclusive: bool,

    #[serde(default)]
    pub featurecount: bool,

    /// Name of the referenced map layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

fn default_true() -> bool {
    true
}
