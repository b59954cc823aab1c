//! Module profiles and the external collaborators that produce them
//!
//! The resolver never reads configuration itself. A [`ModuleConfigProvider`]
//! hands it a [`ModuleProfile`] per module, and a [`TargetProvider`] answers
//! SDK target / build-tools lookups for the packaging layer.

use crate::primitives::{Identity, ModuleHandle};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Manifest properties used by the packaging layer, not by the resolver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ManifestInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_sdk: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sdk: Option<u32>,
}

/// Everything the registry needs to know about a module before opening it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleProfile {
    /// This module's own identity
    pub identity: Identity,
    /// Declared library identities, in declaration order
    pub libraries: Vec<Identity>,
    /// Whether other modules may consume this module as a library
    pub is_library: bool,
    /// Requested SDK target hash (e.g. `android-34`)
    pub target: Option<String>,
    /// Requested build-tools revision, `None` for the newest installed
    pub build_tools: Option<String>,
    pub manifest: ManifestInfo,
}

impl ModuleProfile {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            libraries: Vec::new(),
            is_library: false,
            target: None,
            build_tools: None,
            manifest: ManifestInfo::default(),
        }
    }

    /// Mark the module as consumable by other modules
    pub fn library(mut self) -> Self {
        self.is_library = true;
        self
    }

    pub fn with_libraries<I>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = Identity>,
    {
        self.libraries = libraries.into_iter().collect();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_build_tools(mut self, revision: impl Into<String>) -> Self {
        self.build_tools = Some(revision.into());
        self
    }

    pub fn with_manifest(mut self, manifest: ManifestInfo) -> Self {
        self.manifest = manifest;
        self
    }
}

/// A resolved SDK platform target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetBinding {
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_level: Option<u32>,
}

/// An installed build-tools revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildToolsInfo {
    pub revision: String,
}

/// Target platform (re)load notifications coming from the SDK layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetEvent {
    Loaded(String),
    Unloaded(String),
}

/// External configuration reader: handle -> profile
pub trait ModuleConfigProvider: Send + Sync {
    fn load_profile(&self, handle: &ModuleHandle) -> anyhow::Result<ModuleProfile>;
}

/// External SDK lookup
pub trait TargetProvider: Send + Sync {
    /// Find an installed target by hash
    fn resolve_target(&self, hash: &str) -> Option<TargetBinding>;

    /// Find build tools by revision; `None` asks for the newest installed
    fn resolve_build_tools(&self, revision: Option<&str>) -> Result<BuildToolsInfo, BuildToolsError>;
}

/// Build-tools lookup failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildToolsError {
    #[error("Build tools {revision} are not installed")]
    NotInstalled { revision: String },

    #[error("No build tools are installed")]
    NoneInstalled,
}

/// Fixed in-memory SDK description
#[derive(Debug, Clone, Default)]
pub struct StaticTargetProvider {
    targets: Vec<TargetBinding>,
    build_tools: Vec<String>,
}

impl StaticTargetProvider {
    pub fn new(targets: Vec<TargetBinding>, build_tools: Vec<String>) -> Self {
        Self {
            targets,
            build_tools,
        }
    }
}

impl TargetProvider for StaticTargetProvider {
    fn resolve_target(&self, hash: &str) -> Option<TargetBinding> {
        self.targets.iter().find(|t| t.hash == hash).cloned()
    }

    fn resolve_build_tools(&self, revision: Option<&str>) -> Result<BuildToolsInfo, BuildToolsError> {
        match revision {
            Some(revision) => self
                .build_tools
                .iter()
                .find(|installed| installed.as_str() == revision)
                .map(|installed| BuildToolsInfo {
                    revision: installed.clone(),
                })
                .ok_or_else(|| BuildToolsError::NotInstalled {
                    revision: revision.to_string(),
                }),
            // Last listed revision is the newest one
            None => self
                .build_tools
                .last()
                .map(|installed| BuildToolsInfo {
                    revision: installed.clone(),
                })
                .ok_or(BuildToolsError::NoneInstalled),
        }
    }
}
