pub mod fixtures;

pub use fixtures::{ModuleFixture, WorkspaceFixture, run_command};
