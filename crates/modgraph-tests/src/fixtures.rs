//! On-disk workspace fixtures for end-to-end tests
//!
//! A [`WorkspaceFixture`] writes `workspace.yml` plus one `module.toml` per
//! module into a temporary directory, so commands run against real files.

use anyhow::Result;
use modgraph_lib::application::config::AppConfig;
use modgraph_lib::application::{Commands, execute_command_with_output};
use modgraph_lib::display::Display;
use modgraph_lib::primitives::OutputFormat;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Group used for every fixture identity
pub const GROUP: &str = "com.example";

/// One module directory of a fixture workspace
#[derive(Debug, Clone)]
pub struct ModuleFixture {
    pub dir: String,
    pub artifact: String,
    pub library: bool,
    pub libraries: Vec<String>,
    pub target: Option<String>,
}

impl ModuleFixture {
    pub fn application(dir: &str) -> Self {
        let artifact = dir.rsplit('/').next().unwrap_or(dir).to_string();
        Self {
            dir: dir.to_string(),
            artifact,
            library: false,
            libraries: Vec::new(),
            target: None,
        }
    }

    pub fn library(dir: &str) -> Self {
        Self {
            library: true,
            ..Self::application(dir)
        }
    }

    /// Override the artifact name (defaults to the last directory component)
    pub fn artifact(mut self, artifact: &str) -> Self {
        self.artifact = artifact.to_string();
        self
    }

    pub fn needs(mut self, artifacts: &[&str]) -> Self {
        self.libraries.extend(artifacts.iter().map(|a| a.to_string()));
        self
    }

    pub fn target(mut self, hash: &str) -> Self {
        self.target = Some(hash.to_string());
        self
    }

    fn to_toml(&self) -> String {
        let libraries: Vec<String> = self
            .libraries
            .iter()
            .map(|l| format!("\"{}:{}\"", GROUP, l))
            .collect();
        let mut toml = format!(
            "identity = \"{}:{}\"\nlibrary = {}\nlibraries = [{}]\n",
            GROUP,
            self.artifact,
            self.library,
            libraries.join(", ")
        );
        if let Some(target) = &self.target {
            toml.push_str(&format!("target = \"{}\"\n", target));
        }
        toml
    }
}

/// Builder for a temporary workspace
#[derive(Debug, Default)]
pub struct WorkspaceFixture {
    modules: Vec<ModuleFixture>,
    closed: Vec<String>,
    extra_yaml: String,
}

impl WorkspaceFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module(mut self, module: ModuleFixture) -> Self {
        self.modules.push(module);
        self
    }

    pub fn closed(mut self, handle: &str) -> Self {
        self.closed.push(handle.to_string());
        self
    }

    /// Raw YAML appended to `workspace.yml` (SDK targets, build tools)
    pub fn yaml(mut self, extra: &str) -> Self {
        self.extra_yaml.push_str(extra);
        self
    }

    /// `app: [b, c]`, `b: [d]`, `c`, `d`
    pub fn sample() -> Self {
        Self::new()
            .module(ModuleFixture::application("app").needs(&["b", "c"]))
            .module(ModuleFixture::library("libs/b").needs(&["d"]))
            .module(ModuleFixture::library("libs/c"))
            .module(ModuleFixture::library("libs/d"))
    }

    pub fn write(&self) -> Result<TempDir> {
        let dir = TempDir::new()?;
        self.write_to(dir.path())?;
        Ok(dir)
    }

    pub fn write_to(&self, root: &Path) -> Result<()> {
        let mut yaml = String::from("modules:\n");
        for module in &self.modules {
            yaml.push_str(&format!("  - {}\n", module.dir));
            let path = root.join(&module.dir);
            fs::create_dir_all(&path)?;
            fs::write(path.join("module.toml"), module.to_toml())?;
        }
        if !self.closed.is_empty() {
            yaml.push_str("closed:\n");
            for handle in &self.closed {
                yaml.push_str(&format!("  - {}\n", handle));
            }
        }
        yaml.push_str(&self.extra_yaml);
        fs::write(root.join("workspace.yml"), yaml)?;
        Ok(())
    }
}

/// Run a command in-process against `root`, returning the result and captured output
pub fn run_command(root: &Path, output: OutputFormat, command: Commands) -> (Result<()>, String) {
    let config = AppConfig {
        workdir: Some(root.to_path_buf()),
        output,
        ..AppConfig::default()
    };
    let mut buffer = Vec::new();
    let result = execute_command_with_output(&config, Some(command), &Display::plain(), &mut buffer);
    (result, String::from_utf8_lossy(&buffer).into_owned())
}
