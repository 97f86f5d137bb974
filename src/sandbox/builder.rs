use std::env;
use std::path::PathBuf;

use log::debug;
use path_absolutize::Absolutize;

use crate::error::CatRunError;
use crate::limits::{CpuLimitType, MemoryLimitType, ResourceLimits};
use crate::sandbox::Sandbox;
use crate::utils::parse_env;

/// Build Sandbox
#[derive(Debug, Default)]
pub struct SandboxBuilder {
  workspace_root: Option<PathBuf>,
  time_limit: Option<f64>,
  cpu_limit: Option<CpuLimitType>,
  memory_limit: Option<MemoryLimitType>,
  output_limit: Option<u64>,
  compile_time_limit: Option<f64>,
  env: Vec<(String, String)>,
}

impl SandboxBuilder {
  pub fn new() -> Self {
    SandboxBuilder::default()
  }

  /// Build Sandbox after setting all the options
  pub fn build(self) -> Result<Sandbox, CatRunError> {
    let root = match self.workspace_root {
      Some(root) => root,
      None => env::var_os("CATRUN_TMP_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir),
    };
    let workspace_root = root.absolutize()?.to_path_buf();

    let defaults = ResourceLimits::default();
    let mut limits = ResourceLimits::new(
      self.cpu_limit.unwrap_or(defaults.cpu_seconds),
      self.memory_limit.unwrap_or(defaults.memory_bytes),
      self.time_limit.unwrap_or(defaults.wall_clock_seconds),
    );
    if let Some(output_limit) = self.output_limit {
      limits = limits.output_bytes(output_limit);
    }

    // 默认只传递 PATH 环境变量
    let mut child_env = vec![(
      "PATH".to_string(),
      env::var("PATH").unwrap_or_default(),
    )];
    for (key, value) in self.env {
      child_env.retain(|(k, _)| *k != key);
      child_env.push((key, value));
    }

    debug!("Sandbox workspace root: {}", workspace_root.display());
    debug!("Sandbox run limits: {:?}", limits);

    Ok(Sandbox {
      workspace_root,
      limits,
      compile_time_limit: self.compile_time_limit,
      env: child_env,
    })
  }

  /// Set scratch root
  pub fn workspace_root<P: Into<PathBuf>>(mut self, path: P) -> Self {
    self.workspace_root = Some(path.into());
    self
  }

  /// Set default time limit (unit: second)
  pub fn set_default_time_limit(mut self, value: Option<f64>) -> Self {
    self.time_limit = value;
    self
  }

  /// Set default CPU time limit (unit: second)
  pub fn set_default_cpu_limit(mut self, value: Option<CpuLimitType>) -> Self {
    self.cpu_limit = value;
    self
  }

  /// Set default memory limit (unit: byte)
  pub fn set_default_memory_limit(mut self, value: Option<MemoryLimitType>) -> Self {
    self.memory_limit = value;
    self
  }

  /// Set wall-clock limit of compile steps (unit: second), toolchain default otherwise
  pub fn set_compile_time_limit(mut self, value: Option<f64>) -> Self {
    self.compile_time_limit = value;
    self
  }

  /// Set output file size limit (unit: byte)
  pub fn output_limit(mut self, value: u64) -> Self {
    self.output_limit = Some(value);
    self
  }

  /// Parse default env list
  pub fn parse_env_list(mut self, list: Vec<String>) -> Result<Self, CatRunError> {
    for env_var in list {
      self.env.push(parse_env(env_var)?);
    }
    Ok(self)
  }
}
