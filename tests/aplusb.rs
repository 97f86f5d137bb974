use std::fs;
use std::path::PathBuf;

use log::info;
use tempfile::tempdir;

use catrun::{ExecutionRequest, Language, ReturnValue, Verdict};

mod common;

fn source_of(language: Language) -> PathBuf {
  let file = match language {
    Language::Python => "aplusb.py",
    Language::JavaScript => "aplusb.js",
    Language::C => "aplusb.c",
    Language::Cpp => "aplusb.cpp",
    Language::Java => "Main.java",
  };
  PathBuf::from("./fixtures/aplusb/source/").join(file)
}

fn run_aplusb(language: Language, programs: &[&str]) {
  common::setup();
  if !programs.iter().all(|p| common::has_program(p)) {
    info!("Skip aplusb for {}: toolchain not found", language);
    return;
  }

  let root = tempdir().unwrap();
  let sandbox = common::sandbox(&root);
  let code = fs::read_to_string(source_of(language)).unwrap();

  for i in 1..4 {
    let input = fs::read_to_string(format!("./fixtures/aplusb/testcases/{}.in", i)).unwrap();
    let answer = fs::read_to_string(format!("./fixtures/aplusb/testcases/{}.ans", i)).unwrap();

    let request = ExecutionRequest::new(language, code.as_str()).stdin(input);
    let result = sandbox.execute(&request);

    assert_eq!(result.verdict(), Verdict::Success, "{}", result.stderr());
    assert_eq!(result.exit_code(), Some(0));
    assert_eq!(result.stdout().trim(), answer.trim());
    let expected: i64 = answer.trim().parse().unwrap();
    assert_eq!(
      result.value(),
      Some(&ReturnValue::Value(serde_json::json!(expected)))
    );
    assert!(common::is_empty_dir(root.path()));
  }
}

#[test]
fn it_should_run_python_aplusb() {
  run_aplusb(Language::Python, &["python3"]);
}

#[test]
fn it_should_run_javascript_aplusb() {
  run_aplusb(Language::JavaScript, &["node"]);
}

#[test]
fn it_should_run_c_aplusb() {
  run_aplusb(Language::C, &["gcc"]);
}

#[test]
fn it_should_run_cpp_aplusb() {
  run_aplusb(Language::Cpp, &["g++"]);
}

#[test]
fn it_should_run_java_aplusb() {
  run_aplusb(Language::Java, &["javac", "java"]);
}
