#![allow(dead_code)]

use std::env;
use std::fs;
use std::path::Path;
use std::sync::Once;

use catrun::{Sandbox, SandboxBuilder};
use flexi_logger::Logger;
use tempfile::TempDir;

static INIT: Once = Once::new();

pub fn setup() {
  INIT.call_once(|| {
    Logger::try_with_str("catrun=debug,info")
      .unwrap()
      .start()
      .unwrap();
  });
}

/// Whether `program` can be found on PATH
pub fn has_program(program: &str) -> bool {
  env::var_os("PATH").map_or(false, |paths| {
    env::split_paths(&paths).any(|dir| dir.join(program).is_file())
  })
}

pub fn sandbox(root: &TempDir) -> Sandbox {
  SandboxBuilder::new()
    .workspace_root(root.path())
    .build()
    .unwrap()
}

pub fn is_empty_dir(path: &Path) -> bool {
  fs::read_dir(path).unwrap().next().is_none()
}
