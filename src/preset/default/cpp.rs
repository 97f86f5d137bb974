use lazy_static::lazy_static;

use crate::language::Language;
use crate::preset::preset::{ExecuteCommand, SourceLayout, ToolchainSpec};

lazy_static! {
  pub(crate) static ref CPP_PRESET: ToolchainSpec = ToolchainSpec::new(
    Language::Cpp,
    SourceLayout::Flat("cpp"),
    ExecuteCommand::new::<&str, &str>("${executable}", vec![])
  )
  .compile_command(ExecuteCommand::new(
    "g++",
    vec![
      "${source}",
      "-o",
      "${executable}",
      "-Wall",
      "-Wno-unused-result",
      "-O2",
      "--std=c++17",
      "-DONLINE_JUDGE",
      "-lm"
    ]
  ));
}
