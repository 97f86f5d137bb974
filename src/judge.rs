use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{ExecutionRequest, ReturnValue, Verdict};
use crate::error::CatRunError;
use crate::language::Language;
use crate::sandbox::Sandbox;
use crate::wire::Report;

/// One call and the value it should return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
  pub arguments: Vec<Value>,
  pub expected: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseReport {
  pub case_number: usize,
  pub verdict: Verdict,
  pub output: Option<Value>,
  pub expected: Value,
  pub passed: bool,
  pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JudgeReport {
  pub cases: Vec<CaseReport>,
  pub passed: usize,
  pub total: usize,
  pub all_passed: bool,
  pub max_time: f64,
}

/// Read test cases from a JSON array
pub fn parse_cases(text: &str) -> Result<Vec<TestCase>, CatRunError> {
  Ok(serde_json::from_str(text)?)
}

/// Compare a returned value with the expected one, numbers by value
pub fn values_match(actual: &Value, expected: &Value) -> bool {
  match (actual, expected) {
    (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
      (Some(a), Some(b)) => a == b,
      _ => match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a == b || (a - b).abs() <= 1e-9 * a.abs().max(b.abs()),
        _ => false,
      },
    },
    (Value::Array(a), Value::Array(b)) => {
      a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_match(x, y))
    }
    (Value::Object(a), Value::Object(b)) => {
      a.len() == b.len()
        && a
          .iter()
          .all(|(key, x)| b.get(key).map_or(false, |y| values_match(x, y)))
    }
    _ => actual == expected,
  }
}

/// Run every case through its own harnessed execution
pub fn judge(
  sandbox: &Sandbox,
  language: Language,
  source: &str,
  entry: Option<&str>,
  cases: &[TestCase],
) -> JudgeReport {
  let mut reports = Vec::with_capacity(cases.len());
  for (index, case) in cases.iter().enumerate() {
    let request = ExecutionRequest::new(language, source)
      .call_arguments(case.arguments.clone())
      .set_entry(entry);
    let result = sandbox.execute(&request);
    let output = result.value().and_then(ReturnValue::value).cloned();
    let passed = result.verdict() == Verdict::Success
      && output
        .as_ref()
        .map_or(false, |value| values_match(value, &case.expected));
    info!("Case #{} {:?}, passed: {}", index + 1, result.verdict(), passed);

    reports.push(CaseReport {
      case_number: index + 1,
      verdict: result.verdict(),
      output,
      expected: case.expected.clone(),
      passed,
      time: result.time_taken(),
    });
  }
  JudgeReport::new(reports)
}

impl JudgeReport {
  pub fn new(cases: Vec<CaseReport>) -> Self {
    let passed = cases.iter().filter(|case| case.passed).count();
    let max_time = cases.iter().map(|case| case.time).fold(0.0, f64::max);
    JudgeReport {
      passed,
      total: cases.len(),
      all_passed: passed == cases.len(),
      max_time,
      cases,
    }
  }
}

impl Report for JudgeReport {
  fn report_human(&self) {
    println!();
    for case in self.cases.iter() {
      let mark = if case.passed {
        "\x1b[92m✓\x1b[39m"
      } else {
        "\x1b[91m×\x1b[39m"
      };
      let output = case
        .output
        .as_ref()
        .map_or_else(|| "-".to_string(), |v| v.to_string());
      println!(
        "\x1b[1mCase {}\x1b[22m  {}  {:?}  output {}  expected {}  ({:.3} s)",
        case.case_number, mark, case.verdict, output, case.expected, case.time
      );
    }
    println!();
    println!("\x1b[1mPassed\x1b[22m     {} / {}", self.passed, self.total);
    println!("\x1b[1mMax time\x1b[22m   {:.3} s", self.max_time);
    println!();
  }

  fn report_json(&self) {
    match serde_json::to_string(self) {
      Ok(text) => println!("{}", text),
      Err(err) => eprintln!("{}", CatRunError::from(err)),
    }
  }
}
