use lazy_static::lazy_static;

use crate::language::Language;
use crate::preset::preset::{ExecuteCommand, LimitPolicy, SourceLayout, ToolchainSpec};

/// The class `java` is told to run; submitted code must declare it
pub const JAVA_ENTRY_CLASS: &str = "Main";

lazy_static! {
  pub(crate) static ref JAVA_PRESET: ToolchainSpec = ToolchainSpec::new(
    Language::Java,
    SourceLayout::Entry("Main.java"),
    ExecuteCommand::new("java", vec!["-cp", "${workdir}", JAVA_ENTRY_CLASS])
  )
  .compile_command(ExecuteCommand::new(
    "javac",
    vec!["-encoding", "utf8", "-d", "${workdir}", "${source}"]
  ))
  .default_limit_policy(LimitPolicy::WallClockOnly);
}
