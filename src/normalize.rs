use std::time::Duration;

use log::debug;
use serde_json::{Number, Value};

use crate::context::{ExecutionResult, ReturnValue, Verdict};
use crate::executor::StepOutput;
use crate::language::Language;

/// Parse the return value printed on the last stdout line.
///
/// Earlier lines never count. Interpreted languages print JSON, anything that fails to decode
/// is kept as a string. Compiled languages are coerced to an integer, then a float, then a string.
pub fn parse_return_value(language: Language, stdout: &str) -> ReturnValue {
  let line = match stdout.lines().rev().find(|line| !line.trim().is_empty()) {
    Some(line) => line.trim(),
    None => return ReturnValue::NoOutput,
  };

  let value = if language.is_interpreted() {
    serde_json::from_str::<Value>(line).unwrap_or_else(|_| Value::String(line.to_string()))
  } else {
    coerce_scalar(line)
  };
  ReturnValue::Value(value)
}

fn coerce_scalar(line: &str) -> Value {
  if let Ok(value) = line.parse::<i64>() {
    return Value::Number(value.into());
  }
  match line.parse::<f64>().ok().and_then(Number::from_f64) {
    Some(number) => Value::Number(number),
    None => Value::String(line.to_string()),
  }
}

/// Classify a run step that finished before its deadline
pub fn normalize(language: Language, output: &StepOutput) -> ExecutionResult {
  let time_taken = output.elapsed().as_secs_f64();

  // CPU 时间超限视为超时
  if output.cpu_exceeded() {
    debug!("Run step killed by {:?} past its CPU limit, classified as timeout", output.signal());
    return ExecutionResult::new(Verdict::Timeout)
      .with_output("", output.stderr())
      .with_status(None, output.signal())
      .with_usage(time_taken, output.memory());
  }

  let verdict = if output.success() {
    Verdict::Success
  } else {
    Verdict::RuntimeError
  };

  ExecutionResult::new(verdict)
    .with_output(output.stdout(), output.stderr())
    .with_status(output.status(), output.signal())
    .with_usage(time_taken, output.memory())
    .with_value(Some(parse_return_value(language, output.stdout())))
}

/// Compile step exited non-zero, its stderr is the payload
pub fn compile_failed(output: &StepOutput) -> ExecutionResult {
  ExecutionResult::new(Verdict::CompileError)
    .with_output(output.stdout(), output.stderr())
    .with_status(output.status(), output.signal())
}

/// Harness could not be generated for this source
pub fn harness_failed<S: Into<String>>(message: S) -> ExecutionResult {
  ExecutionResult::new(Verdict::CompileError).with_output("", message)
}

/// A step passed its wall-clock ceiling, no partial output is kept
pub fn timed_out(limit: Duration) -> ExecutionResult {
  ExecutionResult::new(Verdict::Timeout).with_usage(limit.as_secs_f64(), None)
}

pub fn unsupported_language() -> ExecutionResult {
  ExecutionResult::new(Verdict::UnsupportedLanguage)
}

pub fn internal_error() -> ExecutionResult {
  ExecutionResult::new(Verdict::InternalError)
}

#[cfg(test)]
mod tests {
  use nix::sys::signal::Signal;
  use serde_json::json;

  use super::*;

  #[test]
  fn it_should_use_last_line() {
    let value = parse_return_value(Language::Python, "debug\n[1, 2]\n");
    assert_eq!(value, ReturnValue::Value(json!([1, 2])));
    let value = parse_return_value(Language::JavaScript, "\"hello\"\n\n");
    assert_eq!(value, ReturnValue::Value(json!("hello")));
  }

  #[test]
  fn it_should_mark_no_output() {
    assert_eq!(parse_return_value(Language::Python, ""), ReturnValue::NoOutput);
    assert_eq!(parse_return_value(Language::Cpp, "\n  \n"), ReturnValue::NoOutput);
  }

  #[test]
  fn it_should_keep_undecodable_line_as_string() {
    let value = parse_return_value(Language::Python, "None");
    assert_eq!(value, ReturnValue::Value(json!("None")));
  }

  #[test]
  fn it_should_coerce_compiled_output() {
    assert_eq!(parse_return_value(Language::Cpp, "42"), ReturnValue::Value(json!(42)));
    assert_eq!(parse_return_value(Language::C, "-7\n"), ReturnValue::Value(json!(-7)));
    assert_eq!(parse_return_value(Language::Java, "2.5"), ReturnValue::Value(json!(2.5)));
    assert_eq!(
      parse_return_value(Language::Java, "[1, 2, 3]"),
      ReturnValue::Value(json!("[1, 2, 3]"))
    );
    assert_eq!(parse_return_value(Language::Cpp, "nan"), ReturnValue::Value(json!("nan")));
  }

  #[test]
  fn it_should_classify_exit_status() {
    let output = StepOutput::fake(Some(0), None, "5\n", "warning\n");
    let result = normalize(Language::Python, &output);
    assert_eq!(result.verdict(), Verdict::Success);
    assert_eq!(result.exit_code(), Some(0));
    assert_eq!(result.value(), Some(&ReturnValue::Value(json!(5))));

    let output = StepOutput::fake(Some(3), None, "", "");
    let result = normalize(Language::Python, &output);
    assert_eq!(result.verdict(), Verdict::RuntimeError);
    assert_eq!(result.exit_code(), Some(3));
    assert_eq!(result.value(), Some(&ReturnValue::NoOutput));

    let output = StepOutput::fake(None, Some(Signal::SIGSEGV), "", "");
    let result = normalize(Language::C, &output);
    assert_eq!(result.verdict(), Verdict::RuntimeError);
    assert_eq!(result.signal(), Some(Signal::SIGSEGV));
  }

  #[test]
  fn it_should_treat_sigxcpu_as_timeout() {
    let output = StepOutput::fake(None, Some(Signal::SIGXCPU), "partial\n", "");
    let result = normalize(Language::Cpp, &output);
    assert_eq!(result.verdict(), Verdict::Timeout);
    assert_eq!(result.stdout(), "");
    assert!(result.value().is_none());
  }

  #[test]
  fn it_should_treat_cpu_limit_kill_as_timeout() {
    let output = StepOutput::fake(None, Some(Signal::SIGKILL), "", "").fake_cpu_exceeded();
    let result = normalize(Language::C, &output);
    assert_eq!(result.verdict(), Verdict::Timeout);
    assert_eq!(result.signal(), Some(Signal::SIGKILL));

    let output = StepOutput::fake(None, Some(Signal::SIGKILL), "", "");
    assert_eq!(normalize(Language::C, &output).verdict(), Verdict::RuntimeError);
  }

  #[test]
  fn it_should_build_compile_error() {
    let output = StepOutput::fake(Some(1), None, "", "error: expected ';'");
    let result = compile_failed(&output);
    assert_eq!(result.verdict(), Verdict::CompileError);
    assert_eq!(result.stderr(), "error: expected ';'");
    assert!(result.value().is_none());
  }

  #[test]
  fn it_should_build_timeout() {
    let result = timed_out(Duration::from_secs(5));
    assert_eq!(result.verdict(), Verdict::Timeout);
    assert_eq!(result.time_taken(), 5.0);
    assert_eq!(result.exit_code(), None);
  }
}
