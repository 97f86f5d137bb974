use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, error, info};

pub use builder::SandboxBuilder;

use crate::context::{ExecutionRequest, ExecutionResult};
use crate::driver::{build_program, resolve_entry};
use crate::error::CatRunError;
use crate::executor::{run_step, StepCommand};
use crate::limits::ResourceLimits;
use crate::normalize::{compile_failed, harness_failed, internal_error, normalize, timed_out};
use crate::preset::{resolve, ToolchainSpec};
use crate::workspace::Workspace;

mod builder;

/// Executes requests, one fresh workspace each.
///
/// Holds no mutable state, so one `Sandbox` can be shared by any number of threads.
#[derive(Debug, Clone)]
pub struct Sandbox {
  workspace_root: PathBuf,
  limits: ResourceLimits,
  compile_time_limit: Option<f64>,
  env: Vec<(String, String)>,
}

impl Sandbox {
  pub fn builder() -> SandboxBuilder {
    SandboxBuilder::new()
  }

  pub fn workspace_root(&self) -> &Path {
    &self.workspace_root
  }

  /// Limits applied to the run step
  pub fn limits(&self) -> &ResourceLimits {
    &self.limits
  }

  /// Limits applied to compile steps: the toolchain budget, with the wall clock overridable
  pub fn compile_limits(&self, toolchain: &ToolchainSpec) -> ResourceLimits {
    let mut limits = *toolchain.compile_limits();
    if let Some(seconds) = self.compile_time_limit {
      limits.wall_clock_seconds = seconds;
    }
    limits
  }

  pub fn env(&self) -> &[(String, String)] {
    &self.env
  }

  /// Run one request to a verdict. The workspace is removed on every path.
  pub fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
    let toolchain = resolve(request.language());
    let mut workspace = match Workspace::create(&self.workspace_root, toolchain) {
      Ok(workspace) => workspace,
      Err(err) => {
        error!("Fail creating workspace under {}: {}", self.workspace_root.display(), err);
        return internal_error();
      }
    };

    info!("Start executing {} request #{}", request.language(), workspace.id());
    let result = match self.execute_in(&workspace, toolchain, request) {
      Ok(result) => result,
      Err(CatRunError::Timeout(limit)) => timed_out(limit),
      Err(CatRunError::Harness(message)) => {
        info!("Request #{} has no runnable harness: {}", workspace.id(), message);
        harness_failed(message)
      }
      Err(err) => {
        error!("Request #{} fails: {}", workspace.id(), err);
        internal_error()
      }
    };
    info!("Request #{} finished with {:?}", workspace.id(), result.verdict());

    workspace.destroy();
    result
  }

  fn execute_in(
    &self,
    workspace: &Workspace,
    toolchain: &ToolchainSpec,
    request: &ExecutionRequest,
  ) -> Result<ExecutionResult, CatRunError> {
    let language = request.language();
    let source = match request.arguments() {
      Some(arguments) => {
        let entry = resolve_entry(language, request.source_code(), request.entry_name(), None)
          .ok_or_else(|| CatRunError::harness("Can not find the function to call"))?;
        debug!("Harness calls {} with {} arguments", entry, arguments.len());
        build_program(language, request.source_code(), &entry, arguments)?
      }
      None => request.source_code().to_string(),
    };
    workspace.write_source(&source)?;
    workspace.write_stdin(request.input().as_bytes())?;

    let vars = workspace.template_vars();
    let compile_limits = self.compile_limits(toolchain);
    for command in toolchain.compile_commands() {
      let step = StepCommand::new(command.expand(&vars), workspace.stdout(), workspace.stderr())
        .cwd(workspace.workdir())
        .env(self.env.clone())
        .limits(toolchain.enforced(&compile_limits).copied())
        .timeout(compile_limits.wall_clock());
      let output = run_step(&step)?;
      if output.cpu_exceeded() {
        info!("Request #{} exceeds CPU limit while compiling", workspace.id());
        return Err(CatRunError::Timeout(Duration::from_secs(compile_limits.cpu_seconds)));
      }
      if !output.success() {
        info!("Request #{} fails compiling", workspace.id());
        return Ok(compile_failed(&output));
      }
    }

    let step = StepCommand::new(
      toolchain.execute_command().expand(&vars),
      workspace.stdout(),
      workspace.stderr(),
    )
    .stdin(workspace.stdin())
    .cwd(workspace.workdir())
    .env(self.env.clone())
    .limits(toolchain.enforced(&self.limits).copied())
    .timeout(self.limits.wall_clock());
    let output = run_step(&step)?;

    Ok(normalize(language, &output))
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use tempfile::tempdir;

  use super::*;
  use crate::context::Verdict;
  use crate::language::Language;

  #[test]
  fn it_should_report_missing_entry_as_compile_error() {
    let root = tempdir().unwrap();
    let sandbox = Sandbox::builder().workspace_root(root.path()).build().unwrap();
    let request = ExecutionRequest::new(Language::Python, "print(1)\n").call_arguments(vec![json!(1)]);
    let result = sandbox.execute(&request);
    assert_eq!(result.verdict(), Verdict::CompileError);
    assert!(!result.stderr().is_empty());
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
  }

  #[test]
  fn it_should_report_unwritable_root_as_internal_error() {
    let root = tempdir().unwrap();
    let file = root.path().join("not-a-dir");
    std::fs::write(&file, "").unwrap();
    let sandbox = Sandbox::builder().workspace_root(&file).build().unwrap();
    let result = sandbox.execute(&ExecutionRequest::new(Language::Python, "print(1)\n"));
    assert_eq!(result.verdict(), Verdict::InternalError);
    assert_eq!(result.stderr(), "");
  }
}
