use nix::libc::STDOUT_FILENO;
use nix::unistd::isatty;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{ExecutionRequest, ExecutionResult, ReturnValue, Verdict};
use crate::error::CatRunError;
use crate::language::Language;
use crate::normalize::unsupported_language;
use crate::sandbox::Sandbox;

/// Print a result for a human on a TTY, as JSON otherwise
pub trait Report {
  fn report(&self) {
    let is_tty = isatty(STDOUT_FILENO).unwrap_or(false);
    if is_tty {
      self.report_human();
    } else {
      self.report_json();
    }
  }

  fn report_human(&self);

  fn report_json(&self);
}

/// Request body of the local RPC boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
  pub language: String,
  pub code: String,
  #[serde(default)]
  pub input: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub call_arguments: Option<Vec<Value>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub entry: Option<String>,
}

/// Response body of the local RPC boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireResponse {
  pub stdout: String,
  pub stderr: String,
  pub exit_code: Option<i32>,
  pub time_taken: f64,
  pub memory_used: u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  pub verdict: Verdict,
  pub signal: Option<String>,
  pub value: Option<Value>,
}

impl WireRequest {
  /// Unknown language names fail here, before any process is spawned
  pub fn to_request(&self) -> Result<ExecutionRequest, CatRunError> {
    let language: Language = self.language.parse()?;
    let mut request = ExecutionRequest::new(language, self.code.as_str())
      .stdin(self.input.as_str())
      .set_entry(self.entry.as_deref());
    if let Some(arguments) = &self.call_arguments {
      request = request.call_arguments(arguments.clone());
    }
    Ok(request)
  }
}

impl From<&ExecutionResult> for WireResponse {
  fn from(result: &ExecutionResult) -> Self {
    WireResponse {
      stdout: result.stdout().to_string(),
      stderr: result.stderr().to_string(),
      exit_code: result.exit_code(),
      time_taken: (result.time_taken() * 10000.0).round() / 10000.0,
      memory_used: result.memory_used().unwrap_or(0),
      error: result.verdict().error_message().map(|text| text.to_string()),
      verdict: result.verdict(),
      signal: result.signal().map(|signal| signal.to_string()),
      value: result.value().and_then(ReturnValue::value).cloned(),
    }
  }
}

/// Serve one wire request
pub fn handle(sandbox: &Sandbox, request: &WireRequest) -> WireResponse {
  match request.to_request() {
    Ok(request) => WireResponse::from(&sandbox.execute(&request)),
    Err(_) => WireResponse::from(&unsupported_language()),
  }
}

impl Report for WireResponse {
  fn report_human(&self) {
    let verdict = match self.verdict {
      Verdict::Success => "\x1b[92mSuccess\x1b[39m".to_string(),
      other => format!("\x1b[91m{:?}\x1b[39m", other),
    };
    let status = self.exit_code.map_or_else(
      || "\x1b[91m×\x1b[39m".to_string(),
      |v| format!("\x1b[9{}m{}\x1b[39m", if v == 0 { 2 } else { 1 }, v),
    );
    let signal = self.signal.as_ref().map_or_else(
      || "\x1b[92m✓\x1b[39m".to_string(),
      |v| format!("\x1b[91m{}\x1b[39m", v),
    );

    println!();
    println!("\x1b[1mVerdict\x1b[22m    {}", verdict);
    println!("\x1b[1mStatus\x1b[22m     {}", status);
    println!("\x1b[1mSignal\x1b[22m     {}", signal);
    println!("\x1b[1mTime\x1b[22m       {} s", self.time_taken);
    println!("\x1b[1mMemory\x1b[22m     {} KB", self.memory_used / 1024);
    if let Some(value) = &self.value {
      println!("\x1b[1mValue\x1b[22m      {}", value);
    }
    if !self.stdout.is_empty() {
      println!("\x1b[1mStdout\x1b[22m");
      print!("{}", self.stdout);
    }
    if !self.stderr.is_empty() {
      println!("\x1b[1mStderr\x1b[22m");
      print!("{}", self.stderr);
    }
    println!();
  }

  fn report_json(&self) {
    match serde_json::to_string(self) {
      Ok(text) => println!("{}", text),
      Err(err) => eprintln!("{}", CatRunError::from(err)),
    }
  }
}
