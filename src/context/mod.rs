use nix::sys::signal::Signal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::language::Language;
use crate::limits::MemoryLimitType;

/// One submission to execute
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
  language: Language,
  source_code: String,
  stdin: String,
  call_arguments: Option<Vec<Value>>,
  entry: Option<String>,
}

/// Classified outcome of one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  Success,
  RuntimeError,
  CompileError,
  Timeout,
  UnsupportedLanguage,
  InternalError,
}

/// Value parsed from the last line of stdout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ReturnValue {
  /// The program printed nothing
  NoOutput,
  Value(Value),
}

/// Execution result
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
  verdict: Verdict,
  stdout: String,
  stderr: String,
  exit_code: Option<i32>,
  signal: Option<Signal>,
  time_taken: f64,
  memory_used: Option<MemoryLimitType>,
  value: Option<ReturnValue>,
}

impl ExecutionRequest {
  pub fn new<S: Into<String>>(language: Language, source_code: S) -> Self {
    ExecutionRequest {
      language,
      source_code: source_code.into(),
      stdin: String::new(),
      call_arguments: None,
      entry: None,
    }
  }

  /// Set data fed to the program's stdin
  pub fn stdin<S: Into<String>>(mut self, data: S) -> Self {
    self.stdin = data.into();
    self
  }

  /// Call a function with these arguments through a generated harness
  pub fn call_arguments(mut self, arguments: Vec<Value>) -> Self {
    self.call_arguments = Some(arguments);
    self
  }

  /// Set the function the harness calls, detected from source otherwise
  pub fn entry<S: Into<String>>(mut self, name: S) -> Self {
    self.entry = Some(name.into());
    self
  }

  pub fn set_entry<S: Into<String>>(mut self, name: Option<S>) -> Self {
    self.entry = name.map(|n| n.into());
    self
  }

  pub fn language(&self) -> Language {
    self.language
  }

  pub fn source_code(&self) -> &str {
    &self.source_code
  }

  pub fn input(&self) -> &str {
    &self.stdin
  }

  pub fn arguments(&self) -> Option<&[Value]> {
    self.call_arguments.as_deref()
  }

  pub fn entry_name(&self) -> Option<&str> {
    self.entry.as_deref()
  }
}

impl Verdict {
  /// Transport-level error text, `None` when the program ran to completion
  pub fn error_message(&self) -> Option<&'static str> {
    match self {
      Verdict::Success | Verdict::RuntimeError => None,
      Verdict::CompileError => Some("Compilation failed"),
      Verdict::Timeout => Some("Execution timed out"),
      Verdict::UnsupportedLanguage => Some("Unsupported language"),
      Verdict::InternalError => Some("Internal error"),
    }
  }
}

impl ReturnValue {
  pub fn value(&self) -> Option<&Value> {
    match self {
      ReturnValue::NoOutput => None,
      ReturnValue::Value(value) => Some(value),
    }
  }
}

impl ExecutionResult {
  pub(crate) fn new(verdict: Verdict) -> Self {
    ExecutionResult {
      verdict,
      stdout: String::new(),
      stderr: String::new(),
      exit_code: None,
      signal: None,
      time_taken: 0.0,
      memory_used: None,
      value: None,
    }
  }

  pub(crate) fn with_output<OS: Into<String>, ES: Into<String>>(mut self, stdout: OS, stderr: ES) -> Self {
    self.stdout = stdout.into();
    self.stderr = stderr.into();
    self
  }

  pub(crate) fn with_status(mut self, exit_code: Option<i32>, signal: Option<Signal>) -> Self {
    self.exit_code = exit_code;
    self.signal = signal;
    self
  }

  pub(crate) fn with_usage(mut self, time_taken: f64, memory_used: Option<MemoryLimitType>) -> Self {
    self.time_taken = time_taken;
    self.memory_used = memory_used;
    self
  }

  pub(crate) fn with_value(mut self, value: Option<ReturnValue>) -> Self {
    self.value = value;
    self
  }

  pub fn verdict(&self) -> Verdict {
    self.verdict
  }

  pub fn stdout(&self) -> &str {
    &self.stdout
  }

  pub fn stderr(&self) -> &str {
    &self.stderr
  }

  pub fn exit_code(&self) -> Option<i32> {
    self.exit_code
  }

  pub fn signal(&self) -> Option<Signal> {
    self.signal
  }

  /// Wall-clock time of the run step (unit: second)
  pub fn time_taken(&self) -> f64 {
    self.time_taken
  }

  /// Peak resident memory of the run step (unit: byte), absent when not measured
  pub fn memory_used(&self) -> Option<MemoryLimitType> {
    self.memory_used
  }

  /// Parsed return value, present whenever the run step completed
  pub fn value(&self) -> Option<&ReturnValue> {
    self.value.as_ref()
  }

  pub fn is_success(&self) -> bool {
    self.verdict == Verdict::Success
  }
}
