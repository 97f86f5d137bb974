use lazy_static::lazy_static;

use crate::language::Language;
use crate::preset::preset::{ExecuteCommand, SourceLayout, ToolchainSpec};

lazy_static! {
  pub(crate) static ref C_PRESET: ToolchainSpec = ToolchainSpec::new(
    Language::C,
    SourceLayout::Flat("c"),
    ExecuteCommand::new::<&str, &str>("${executable}", vec![])
  )
  .compile_command(ExecuteCommand::new(
    "gcc",
    vec![
      "${source}",
      "-o",
      "${executable}",
      "-O2",
      "-std=gnu11",
      "-DONLINE_JUDGE",
      "-lm"
    ]
  ));
}
