//! File-backed module configuration
//!
//! A workspace root holds `workspace.yml` naming the module directories in
//! open order. Each module directory holds a `module.toml` describing the
//! module's identity and declared libraries. The module handle is the
//! directory name.

use crate::primitives::{Identity, ModuleHandle};
use crate::resolver::{
    ManifestInfo, ModuleConfigProvider, ModuleProfile, StaticTargetProvider, TargetBinding,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

pub const WORKSPACE_FILE: &str = "workspace.yml";
pub const MODULE_FILE: &str = "module.toml";

/// Workspace loading errors
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid module file {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid workspace file {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_saphyr::Error,
    },

    #[error("Module {handle} has no module.toml at {}", .path.display())]
    MissingModuleFile { handle: ModuleHandle, path: PathBuf },

    #[error("Module directory name '{handle}' is used by both {first} and {second}")]
    DuplicateHandle {
        handle: ModuleHandle,
        first: String,
        second: String,
    },

    #[error("Module not listed in workspace.yml: {handle}")]
    UnknownModule { handle: ModuleHandle },
}

/// `workspace.yml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorkspaceManifest {
    /// Module directories relative to the root, in open order
    pub modules: Vec<String>,

    /// Modules closed again after the initial open pass
    #[serde(default)]
    pub closed: Vec<String>,

    /// Installed SDK targets
    #[serde(default)]
    pub targets: Vec<TargetBinding>,

    /// Installed build-tools revisions, oldest first
    #[serde(default)]
    pub build_tools: Vec<String>,
}

/// `module.toml`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ModuleFile {
    identity: Identity,
    #[serde(default)]
    library: bool,
    #[serde(default)]
    libraries: Vec<Identity>,
    target: Option<String>,
    build_tools: Option<String>,
    #[serde(default)]
    manifest: ManifestInfo,
}

impl From<ModuleFile> for ModuleProfile {
    fn from(file: ModuleFile) -> Self {
        ModuleProfile {
            identity: file.identity,
            libraries: file.libraries,
            is_library: file.library,
            target: file.target,
            build_tools: file.build_tools,
            manifest: file.manifest,
        }
    }
}

/// A workspace on disk
#[derive(Debug, Clone)]
pub struct FileWorkspace {
    root: PathBuf,
    manifest: WorkspaceManifest,
    order: Vec<ModuleHandle>,
    dirs: HashMap<ModuleHandle, PathBuf>,
}

impl FileWorkspace {
    /// Read `workspace.yml` under `root`
    pub fn load(root: impl AsRef<Path>) -> Result<Self, WorkspaceError> {
        let root = root.as_ref().to_path_buf();
        let path = root.join(WORKSPACE_FILE);
        let content = read(&path)?;
        let manifest: WorkspaceManifest = serde_saphyr::from_str(&content)
            .map_err(|source| WorkspaceError::Yaml {
                path: path.clone(),
                source,
            })?;

        let mut order = Vec::with_capacity(manifest.modules.len());
        let mut dirs = HashMap::new();
        let mut listed: HashMap<ModuleHandle, &str> = HashMap::new();

        for entry in &manifest.modules {
            let handle = handle_for(entry);
            if let Some(first) = listed.insert(handle.clone(), entry) {
                return Err(WorkspaceError::DuplicateHandle {
                    handle,
                    first: first.to_string(),
                    second: entry.clone(),
                });
            }
            dirs.insert(handle.clone(), root.join(entry));
            order.push(handle);
        }

        debug!(root = %root.display(), modules = order.len(), "Workspace loaded");
        Ok(Self {
            root,
            manifest,
            order,
            dirs,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &WorkspaceManifest {
        &self.manifest
    }

    /// Module handles in open order
    pub fn handles(&self) -> &[ModuleHandle] {
        &self.order
    }

    /// Modules to close after opening everything
    pub fn closed(&self) -> Vec<ModuleHandle> {
        self.manifest.closed.iter().map(|c| handle_for(c)).collect()
    }

    pub fn module_dir(&self, handle: &ModuleHandle) -> Option<&Path> {
        self.dirs.get(handle).map(PathBuf::as_path)
    }

    /// Parse the `module.toml` of `handle`
    pub fn read_profile(&self, handle: &ModuleHandle) -> Result<ModuleProfile, WorkspaceError> {
        let dir = self
            .module_dir(handle)
            .ok_or_else(|| WorkspaceError::UnknownModule {
                handle: handle.clone(),
            })?;
        let path = dir.join(MODULE_FILE);
        if !path.is_file() {
            return Err(WorkspaceError::MissingModuleFile {
                handle: handle.clone(),
                path,
            });
        }

        let content = read(&path)?;
        let file: ModuleFile = toml::from_str(&content).map_err(|source| WorkspaceError::Toml {
            path: path.clone(),
            source,
        })?;
        trace!(module = %handle, identity = %file.identity, "Module file parsed");
        Ok(file.into())
    }

    /// SDK described by the `targets` and `build-tools` lists
    pub fn target_provider(&self) -> StaticTargetProvider {
        StaticTargetProvider::new(
            self.manifest.targets.clone(),
            self.manifest.build_tools.clone(),
        )
    }

    /// Whether the workspace describes an SDK at all
    pub fn has_sdk(&self) -> bool {
        !self.manifest.targets.is_empty() || !self.manifest.build_tools.is_empty()
    }
}

impl ModuleConfigProvider for FileWorkspace {
    fn load_profile(&self, handle: &ModuleHandle) -> anyhow::Result<ModuleProfile> {
        Ok(self.read_profile(handle)?)
    }
}

/// Handle for a listed module directory: its last path component
fn handle_for(entry: &str) -> ModuleHandle {
    let trimmed = entry.trim_end_matches(['/', '\\']);
    let name = Path::new(trimmed)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(trimmed);
    ModuleHandle::new(name)
}

fn read(path: &Path) -> Result<String, WorkspaceError> {
    std::fs::read_to_string(path).map_err(|source| WorkspaceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    include!("mod.test.rs");
}
