//! Command execution handlers
//!
//! Every workspace command opens the modules listed in `workspace.yml` into a
//! fresh [`ProjectRegistry`], then reports on the resulting graph as text or
//! JSON.

use crate::application::{AppConfig, Commands};
use crate::display::{Display, StatusDisplay};
use crate::logger::Logger;
use crate::primitives::{LogContext, ModuleHandle, OutputFormat};
use crate::resolver::{ProjectRegistry, ProjectState, TracingListener};
use crate::workspace::FileWorkspace;
use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// A module listed in the workspace whose configuration could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnreadableModule {
    pub module: String,
    pub error: String,
}

/// Registry populated from a workspace on disk
pub struct WorkspaceSession {
    workspace: FileWorkspace,
    registry: ProjectRegistry,
    unreadable: Vec<UnreadableModule>,
}

impl WorkspaceSession {
    /// Load `workspace.yml` under `root` and open every listed module in order,
    /// then close the ones listed under `closed`.
    pub fn open(root: &Path, display: &Display) -> Result<Self> {
        let workspace = FileWorkspace::load(root)
            .with_context(|| format!("Failed to load workspace at {}", root.display()))?;

        let mut registry = ProjectRegistry::new();
        if workspace.has_sdk() {
            registry = registry.with_target_provider(Arc::new(workspace.target_provider()));
        }
        registry.add_listener(Arc::new(TracingListener));

        let handles = workspace.handles();
        let total = handles.len() as u64;
        let span = crate::progress_span!("open_modules", total = total);
        let _entered = span.enter();

        let progress = display.progress().bar(total, "Opening modules");
        let mut context = LogContext::with_progress("open_modules", total);
        let mut unreadable = Vec::new();

        for (position, handle) in handles.iter().enumerate() {
            progress.tick(handle.as_str());
            context.set_progress(position as u64 + 1);

            match registry.open_with_provider(handle, &workspace) {
                Ok(_) => {
                    if let Some(logger) = Logger::global() {
                        logger.progress(handle.as_str(), &context);
                    }
                }
                Err(e) => {
                    warn!(module = %handle, error = %e, "Skipping unreadable module");
                    unreadable.push(UnreadableModule {
                        module: handle.to_string(),
                        error: format!("{:#}", anyhow::Error::from(e)),
                    });
                }
            }
        }
        progress.finish_clear();

        for handle in workspace.closed() {
            if registry.close(&handle).is_none() {
                warn!(module = %handle, "Listed as closed but was never opened");
            }
        }

        info!(
            modules = registry.len(),
            unreadable = unreadable.len(),
            "Workspace opened"
        );

        Ok(Self {
            workspace,
            registry,
            unreadable,
        })
    }

    pub fn registry(&self) -> &ProjectRegistry {
        &self.registry
    }

    pub fn workspace(&self) -> &FileWorkspace {
        &self.workspace
    }

    pub fn unreadable(&self) -> &[UnreadableModule] {
        &self.unreadable
    }

    /// Open modules in workspace order
    fn open_states(&self) -> Vec<Arc<ProjectState>> {
        self.workspace
            .handles()
            .iter()
            .filter_map(|handle| self.registry.find(handle))
            .collect()
    }

    fn state(&self, module: &str) -> Result<Arc<ProjectState>> {
        self.registry
            .get(&ModuleHandle::new(module))
            .with_context(|| format!("Unknown module '{}'", module))
    }
}

// ============================================================================
// Reports
// ============================================================================

/// One module's resolution state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleReport {
    pub module: String,
    pub identity: String,
    pub library: bool,
    /// Priority-ordered library closure, as module handles
    pub libraries: Vec<String>,
    /// Declared identities with no open module
    pub pending: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_tools: Option<String>,
}

impl ModuleReport {
    fn from_state(state: &ProjectState) -> Self {
        Self {
            module: state.handle().to_string(),
            identity: state.identity().to_string(),
            library: state.is_library(),
            libraries: state
                .full_library_projects()
                .iter()
                .map(|l| l.handle().to_string())
                .collect(),
            pending: state
                .pending_libraries()
                .iter()
                .map(ToString::to_string)
                .collect(),
            target: state.target().map(|t| t.hash),
            build_tools: state.build_tools().map(|b| b.revision),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependentsReport {
    pub module: String,
    pub dependents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Module -> identities it declares but nothing provides
    pub missing: BTreeMap<String, Vec<String>>,
    /// Identity -> modules claiming it
    pub collisions: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<Vec<String>>,
    pub unreadable: Vec<UnreadableModule>,
}

impl CheckReport {
    /// Collisions are reported but do not fail the check
    pub fn is_healthy(&self) -> bool {
        self.missing.is_empty() && self.cycle.is_none() && self.unreadable.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReport {
    pub order: Vec<String>,
}

pub fn resolve_report(session: &WorkspaceSession, modules: &[String]) -> Result<Vec<ModuleReport>> {
    if modules.is_empty() {
        return Ok(session
            .open_states()
            .iter()
            .map(|s| ModuleReport::from_state(s))
            .collect());
    }

    modules
        .iter()
        .map(|module| Ok(ModuleReport::from_state(&*session.state(module)?)))
        .collect()
}

pub fn dependents_report(session: &WorkspaceSession, module: &str) -> Result<DependentsReport> {
    let state = session.state(module)?;
    let mut dependents: Vec<String> = session
        .registry
        .main_projects_for(state.handle())
        .iter()
        .map(|s| s.handle().to_string())
        .collect();
    dependents.sort();

    Ok(DependentsReport {
        module: state.handle().to_string(),
        dependents,
    })
}

pub fn check_report(session: &WorkspaceSession) -> CheckReport {
    let missing = session
        .open_states()
        .iter()
        .filter(|s| s.is_missing_libraries())
        .map(|s| {
            let pending = s.pending_libraries().iter().map(ToString::to_string).collect();
            (s.handle().to_string(), pending)
        })
        .collect();

    let collisions = session
        .registry
        .identity_collisions()
        .into_iter()
        .map(|(identity, handles)| {
            let handles = handles.iter().map(ToString::to_string).collect();
            (identity.to_string(), handles)
        })
        .collect();

    let cycle = session
        .registry
        .dependency_graph()
        .detect_cycle()
        .map(|cycle| cycle.iter().map(ToString::to_string).collect::<Vec<_>>());
    if let Some(cycle) = &cycle {
        warn!(cycle = %cycle.join(" -> "), "Dependency cycle between open modules");
    }

    CheckReport {
        missing,
        collisions,
        cycle,
        unreadable: session.unreadable.clone(),
    }
}

pub fn order_report(session: &WorkspaceSession) -> Result<OrderReport> {
    let order = session
        .registry
        .dependency_graph()
        .build_order()
        .context("Cannot compute a build order")?;

    Ok(OrderReport {
        order: order.into_iter().map(|n| n.handle.to_string()).collect(),
    })
}

// ============================================================================
// Dispatch
// ============================================================================

/// Execute a CLI command, writing results to stdout
pub fn execute_command(config: &AppConfig, command: Option<Commands>) -> Result<()> {
    let display = Display::detect(config.color_enabled());
    let stdout = std::io::stdout();
    execute_command_with_output(config, command, &display, stdout.lock())
}

/// Execute a CLI command against an explicit display and output sink
pub fn execute_command_with_output<W: Write>(
    config: &AppConfig,
    command: Option<Commands>,
    display: &Display,
    mut out: W,
) -> Result<()> {
    let Some(command) = command else {
        let mut status = display.status(&mut out);
        status.message("modgraph - workspace library resolution")?;
        status.subtle("Run 'modgraph --help' for usage information")?;
        return Ok(());
    };

    if !command.requires_workspace() {
        return handle_version(display, &mut out);
    }

    let session = WorkspaceSession::open(&config.workdir(), display)?;
    let json = config.output == OutputFormat::Json;

    match command {
        Commands::Resolve { modules } => {
            let reports = resolve_report(&session, &modules)?;
            if json {
                write_json(&mut out, &reports)
            } else {
                render_resolve(&mut display.status(&mut out), &reports)
            }
        }
        Commands::Dependents { module } => {
            let report = dependents_report(&session, &module)?;
            if json {
                write_json(&mut out, &report)
            } else {
                render_dependents(&mut display.status(&mut out), &report)
            }
        }
        Commands::Check => {
            let report = check_report(&session);
            if json {
                write_json(&mut out, &report)?;
            } else {
                render_check(&mut display.status(&mut out), &report)?;
            }
            if !report.is_healthy() {
                bail!(
                    "Workspace check failed: {} module(s) missing libraries, {} unreadable{}",
                    report.missing.len(),
                    report.unreadable.len(),
                    if report.cycle.is_some() { ", dependency cycle" } else { "" }
                );
            }
            Ok(())
        }
        Commands::Order => {
            let report = order_report(&session)?;
            if json {
                write_json(&mut out, &report)
            } else {
                let mut status = display.status(&mut out);
                for module in &report.order {
                    status.message(module)?;
                }
                Ok(())
            }
        }
        Commands::Version => handle_version(display, &mut out),
    }
}

fn handle_version<W: Write>(display: &Display, out: W) -> Result<()> {
    let mut status = display.status(out);
    status.emphasis(&format!("modgraph {}", env!("CARGO_PKG_VERSION")))?;
    Ok(())
}

fn write_json<W: Write, T: Serialize>(mut out: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, value).context("Failed to serialize report")?;
    writeln!(out)?;
    Ok(())
}

// ============================================================================
// Text rendering
// ============================================================================

fn render_resolve<W: Write>(status: &mut StatusDisplay<'_, W>, reports: &[ModuleReport]) -> Result<()> {
    for report in reports {
        let kind = if report.library { "library" } else { "application" };
        status.emphasis(&format!("{} ({}, {})", report.module, report.identity, kind))?;
        if report.libraries.is_empty() && report.pending.is_empty() {
            status.subtle("  no libraries")?;
        }
        status.list(&report.libraries)?;
        for identity in &report.pending {
            status.error("  missing", identity)?;
        }
    }
    Ok(())
}

fn render_dependents<W: Write>(status: &mut StatusDisplay<'_, W>, report: &DependentsReport) -> Result<()> {
    if report.dependents.is_empty() {
        status.info(&format!("Nothing depends on {}", report.module))?;
        return Ok(());
    }
    status.emphasis(&format!("Modules depending on {}", report.module))?;
    status.list(&report.dependents)?;
    Ok(())
}

fn render_check<W: Write>(status: &mut StatusDisplay<'_, W>, report: &CheckReport) -> Result<()> {
    for (module, pending) in &report.missing {
        status.error(module, &format!("missing {}", pending.join(", ")))?;
    }
    for unreadable in &report.unreadable {
        status.error(&unreadable.module, &unreadable.error)?;
    }
    for (identity, modules) in &report.collisions {
        status.warning(&format!(
            "{} is claimed by {}",
            identity,
            modules.join(", ")
        ))?;
    }
    if let Some(cycle) = &report.cycle {
        let arrow = format!(" {} ", status.styling().arrow());
        status.error("dependency cycle", &cycle.join(&arrow))?;
    }
    if report.is_healthy() {
        status.success("All libraries resolved", "")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    include!("commands.test.rs");
}
