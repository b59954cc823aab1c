//! # modgraph Library
//!
//! Library dependency resolution for multi-module workspaces.
//!
//! ## Core Modules
//!
//! - [`primitives`] - Identities, handles, log enums and shared errors
//! - [`resolver`] - Incremental library resolution and the module registry
//! - [`workspace`] - `workspace.yml` / `module.toml` configuration provider
//! - [`logger`] - Structured logging with progress tracking
//! - [`display`] - User-facing status lines and progress bars
//! - [`application`] - CLI interface, configuration and command handlers
//!
//! ## Quick Start
//!
//! ```
//! use modgraph_lib::primitives::{Identity, ModuleHandle};
//! use modgraph_lib::resolver::{ModuleProfile, ProjectRegistry};
//!
//! let core = Identity::new("com.example", "core");
//! let registry = ProjectRegistry::new();
//! registry.open(
//!     ModuleHandle::new("app"),
//!     ModuleProfile::new(Identity::new("com.example", "app")).with_libraries([core.clone()]),
//! );
//! registry.open(ModuleHandle::new("core"), ModuleProfile::new(core).library());
//!
//! let closure = registry.resolved_library_projects(&ModuleHandle::new("app"));
//! assert_eq!(closure[0].handle().as_str(), "core");
//! ```

pub mod application;
pub mod display;
pub mod logger;
pub mod primitives;
pub mod resolver;
pub mod workspace;

// Re-export commonly used types for convenience
pub use application::{AppConfig, Cli, Commands, execute_command};
pub use logger::Logger;
pub use primitives::{ConfigError, Identity, LogFormat, LogLevel, LogOutput, LoggerError, ModuleHandle};
pub use resolver::{ProjectRegistry, ProjectState, RegistryError};
pub use workspace::FileWorkspace;

// Private imports for the main function
use anyhow::Result;

pub fn main() -> Result<()> {
    let (config, cli) = AppConfig::load()?;

    Logger::init(config.to_logger_config())?;
    AppConfig::init_global(config.clone())?;

    execute_command(&config, cli.command)
}
