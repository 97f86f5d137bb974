use std::path::Path;

use crate::language::Language;
use crate::limits::ResourceLimits;

/// Whether rlimits can be applied to a toolchain's processes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitPolicy {
  /// CPU, address space and output rlimits plus the wall-clock ceiling
  Enforce,
  /// Managed runtimes that reserve huge address spaces at startup (JVM, V8) abort under
  /// RLIMIT_AS, so only the wall-clock ceiling applies
  WallClockOnly,
}

/// Where the source file lives inside a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLayout {
  /// `code_<id>.<extension>` in the request directory
  Flat(&'static str),
  /// Fixed file name in the request directory, for toolchains that require one
  Entry(&'static str),
}

/// Values substituted into argv templates
pub struct TemplateVars<'a> {
  pub source: &'a Path,
  pub executable: &'a Path,
  pub workdir: &'a Path,
}

/// One argv template, e.g. `g++ ${source} -o ${executable}`
#[derive(Debug, Clone)]
pub struct ExecuteCommand {
  program: String,
  arguments: Vec<String>,
}

/// Compile and run recipe for one language
#[derive(Debug, Clone)]
pub struct ToolchainSpec {
  language: Language,
  source: SourceLayout,
  compile: Vec<ExecuteCommand>,
  execute: ExecuteCommand,
  limit_policy: LimitPolicy,
  compile_limits: ResourceLimits,
}

impl ExecuteCommand {
  pub(crate) fn new<PS: Into<String>, AS: Into<String>>(program: PS, arguments: Vec<AS>) -> Self {
    ExecuteCommand {
      program: program.into(),
      arguments: arguments.into_iter().map(|a| a.into()).collect(),
    }
  }

  pub fn program(&self) -> &str {
    &self.program
  }

  pub fn arguments(&self) -> &[String] {
    &self.arguments
  }

  /// Expand placeholders, returning the full argv (program first)
  pub fn expand(&self, vars: &TemplateVars) -> Vec<String> {
    let mut argv = Vec::with_capacity(self.arguments.len() + 1);
    argv.push(substitute(&self.program, vars));
    for argument in self.arguments.iter() {
      argv.push(substitute(argument, vars));
    }
    argv
  }
}

fn substitute(text: &str, vars: &TemplateVars) -> String {
  text
    .replace("${source}", &vars.source.to_string_lossy())
    .replace("${executable}", &vars.executable.to_string_lossy())
    .replace("${workdir}", &vars.workdir.to_string_lossy())
}

impl ToolchainSpec {
  pub(crate) fn new(language: Language, source: SourceLayout, execute: ExecuteCommand) -> Self {
    ToolchainSpec {
      language,
      source,
      compile: vec![],
      execute,
      limit_policy: LimitPolicy::Enforce,
      compile_limits: ResourceLimits::compile(),
    }
  }

  pub(crate) fn compile_command(mut self, command: ExecuteCommand) -> Self {
    self.compile.push(command);
    self
  }

  pub(crate) fn default_limit_policy(mut self, policy: LimitPolicy) -> Self {
    self.limit_policy = policy;
    self
  }

  pub fn language(&self) -> Language {
    self.language
  }

  pub fn source(&self) -> SourceLayout {
    self.source
  }

  pub fn needs_compile(&self) -> bool {
    !self.compile.is_empty()
  }

  pub fn compile_commands(&self) -> &[ExecuteCommand] {
    &self.compile
  }

  pub fn execute_command(&self) -> &ExecuteCommand {
    &self.execute
  }

  pub fn limit_policy(&self) -> LimitPolicy {
    self.limit_policy
  }

  pub fn compile_limits(&self) -> &ResourceLimits {
    &self.compile_limits
  }

  /// The rlimits to apply for this toolchain, if it tolerates them
  pub fn enforced<'a>(&self, limits: &'a ResourceLimits) -> Option<&'a ResourceLimits> {
    match self.limit_policy {
      LimitPolicy::Enforce => Some(limits),
      LimitPolicy::WallClockOnly => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;

  #[test]
  fn it_should_expand_placeholders() {
    let command = ExecuteCommand::new("g++", vec!["${source}", "-o", "${executable}", "-I${workdir}"]);
    let source = PathBuf::from("/tmp/code_1.cpp");
    let executable = PathBuf::from("/tmp/bin_1");
    let workdir = PathBuf::from("/tmp");
    let argv = command.expand(&TemplateVars {
      source: &source,
      executable: &executable,
      workdir: &workdir,
    });
    assert_eq!(argv, vec!["g++", "/tmp/code_1.cpp", "-o", "/tmp/bin_1", "-I/tmp"]);
  }

  #[test]
  fn it_should_skip_limits_for_managed_runtime() {
    let spec = ToolchainSpec::new(
      Language::Java,
      SourceLayout::Entry("Main.java"),
      ExecuteCommand::new("java", vec!["Main"]),
    )
    .default_limit_policy(LimitPolicy::WallClockOnly);
    let limits = ResourceLimits::default();
    assert!(spec.enforced(&limits).is_none());
    assert!(!spec.needs_compile());
  }
}
