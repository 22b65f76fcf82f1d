// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Targets receive the generated topping files.
//!
//! A [`Target`] names a repository directory (`main_dir`) and a project
//! sub directory within it (`sub_dir`). Every topping type gets its own
//! directory below `main_dir/sub_dir`. Whenever a file is placed, the
//! target's [`PathResolver`] decides what the document links to and records
//! a [`ManifestEntry`].
//!
//! The manifest is never cleared implicitly: generating twice into the same
//! target lists the files of both runs.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "./target_test.rs"]
mod target_test;

/// One generated topping file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ManifestEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Path relative to the target's `main_dir`, `/` separated.
    pub path: String,
    #[serde(rename = "type")]
    pub topping_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Decides the link written into the document for a placed topping file.
///
/// Implementations get the file name within the topping type's directory,
/// must append the file's entry to [`Target::manifest`] and return the link.
pub trait PathResolver {
    fn resolve(&self, target: &mut Target, name: &str, topping_type: &str)
    -> crate::Result<String>;
}

impl<F> PathResolver for F
where
    F: Fn(&mut Target, &str, &str) -> crate::Result<String>,
{
    fn resolve(
        &self,
        target: &mut Target,
        name: &str,
        topping_type: &str,
    ) -> crate::Result<String> {
        self(target, name, topping_type)
    }
}

/// Links files by their path relative to `main_dir`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPathResolver;

impl PathResolver for DefaultPathResolver {
    fn resolve(
        &self,
        target: &mut Target,
        name: &str,
        topping_type: &str,
    ) -> crate::Result<String> {
        let (_, relative_filedir_path) = target.filedir_path(topping_type)?;
        let path = join_relative(&relative_filedir_path, name);
        target.manifest.push(ManifestEntry {
            id: None,
            path: path.clone(),
            topping_type: topping_type.to_string(),
            version: None,
        });
        Ok(path)
    }
}

/// Links files by path like [`DefaultPathResolver`], and additionally gives
/// every manifest entry a unique id and the generation date as version.
///
/// Ids look like `layerstyle_freddys_layer_one.qml_001`; a second file with
/// the same name gets `_002` and so on.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionedPathResolver;

impl PathResolver for VersionedPathResolver {
    fn resolve(
        &self,
        target: &mut Target,
        name: &str,
        topping_type: &str,
    ) -> crate::Result<String> {
        let (_, relative_filedir_path) = target.filedir_path(topping_type)?;
        let id = unique_id_in_target_scope(target, &format!("{topping_type}_{name}_001"));
        let path = join_relative(&relative_filedir_path, name);
        let version = chrono::Local::now().format("%Y-%m-%d").to_string();
        tracing::debug!(%id, %path, "assigned topping file id");
        target.manifest.push(ManifestEntry {
            id: Some(id),
            path: path.clone(),
            topping_type: topping_type.to_string(),
            version: Some(version),
        });
        Ok(path)
    }
}

/// Return `id`, or if the target's manifest already has it, the same id
/// with its numeric suffix increased until it is unused.
///
/// The suffix is the part after the last `_`, zero padded to at least three
/// digits. An id without numeric suffix gets `_001` appended first.
pub fn unique_id_in_target_scope(target: &Target, id: &str) -> String {
    let mut id = id.to_string();
    while target
        .manifest
        .iter()
        .any(|entry| entry.id.as_deref() == Some(id.as_str()))
    {
        id = increment_id(&id);
    }
    id
}

fn increment_id(id: &str) -> String {
    let parsed = id
        .rsplit_once('_')
        .and_then(|(stem, suffix)| suffix.parse::<u64>().ok().map(|n| (stem, n)));
    match parsed {
        Some((stem, n)) => format!("{stem}_{:03}", n + 1),
        None => format!("{id}_001"),
    }
}

fn join_relative(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Where and how topping files are written.
#[derive(Clone)]
pub struct Target {
    /// Used as prefix of every topping file and as name of the project
    /// topping itself.
    pub projectname: String,
    /// Root of the repository, absolute.
    pub main_dir: PathBuf,
    /// Project directory within `main_dir`, `/` separated, may be empty.
    pub sub_dir: String,
    /// Every file placed into this target, in order.
    pub manifest: Vec<ManifestEntry>,
    path_resolver: Rc<dyn PathResolver>,
}

impl Target {
    /// A target using the [`DefaultPathResolver`].
    pub fn new<N, M, S>(projectname: N, main_dir: M, sub_dir: S) -> Self
    where
        N: Into<String>,
        M: Into<PathBuf>,
        S: AsRef<str>,
    {
        Self {
            projectname: projectname.into(),
            main_dir: main_dir.into(),
            sub_dir: normalize_sub_dir(sub_dir.as_ref()),
            manifest: Vec::new(),
            path_resolver: Rc::new(DefaultPathResolver),
        }
    }

    /// Replace the path resolver.
    pub fn with_path_resolver<R>(mut self, path_resolver: R) -> Self
    where
        R: PathResolver + 'static,
    {
        self.path_resolver = Rc::new(path_resolver);
        self
    }

    /// Absolute and relative directory for `topping_type`, created if
    /// missing. The relative path is `/` separated and relative to
    /// `main_dir`.
    pub fn filedir_path(&self, topping_type: &str) -> crate::Result<(PathBuf, String)> {
        let relative_filedir_path = join_relative(&self.sub_dir, topping_type);
        let absolute_filedir_path = relative_filedir_path
            .split('/')
            .fold(self.main_dir.clone(), |path, part| path.join(part));
        std::fs::create_dir_all(&absolute_filedir_path).map_err(|e| {
            crate::Error::WriteFailed {
                path: absolute_filedir_path.clone(),
                error: e,
            }
        })?;
        Ok((absolute_filedir_path, relative_filedir_path))
    }

    /// Copy the scratch file at `path` into the directory of
    /// `topping_type` as `{projectname}_{file name}` and return the link
    /// the path resolver produces for it.
    ///
    /// Returns `None` if there is no file at `path`.
    pub fn toppingfile_link(
        &mut self,
        topping_type: &str,
        path: &Path,
    ) -> crate::Result<Option<String>> {
        let Some(file_name) = path.file_name().filter(|_| path.is_file()) else {
            tracing::warn!(path = %path.display(), "topping file missing, not linked");
            return Ok(None);
        };
        let name = format!("{}_{}", self.projectname, file_name.to_string_lossy());
        let (absolute_filedir_path, _) = self.filedir_path(topping_type)?;
        let destination = absolute_filedir_path.join(&name);
        std::fs::copy(path, &destination).map_err(|e| crate::Error::CopyFailed {
            from: path.to_path_buf(),
            to: destination.clone(),
            error: e,
        })?;
        self.resolve_path(&name, topping_type).map(Some)
    }

    /// Run the path resolver for a file already placed in the directory of
    /// `topping_type`.
    pub fn resolve_path(&mut self, name: &str, topping_type: &str) -> crate::Result<String> {
        let resolver = Rc::clone(&self.path_resolver);
        let link = resolver.resolve(self, name, topping_type)?;
        tracing::debug!(%link, topping_type, "linked topping file");
        Ok(link)
    }

    /// Forget all manifest entries. Never called by toppingmaker itself.
    pub fn clear_manifest(&mut self) {
        self.manifest.clear();
    }

    /// The manifest as YAML list.
    pub fn manifest_yaml(&self) -> crate::Result<String> {
        serde_yaml::to_string(&self.manifest).map_err(crate::Error::Serialize)
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("projectname", &self.projectname)
            .field("main_dir", &self.main_dir)
            .field("sub_dir", &self.sub_dir)
            .field("manifest", &self.manifest)
            .finish_non_exhaustive()
    }
}

fn normalize_sub_dir(sub_dir: &str) -> String {
    sub_dir
        .split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}
