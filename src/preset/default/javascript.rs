use lazy_static::lazy_static;

use crate::language::Language;
use crate::preset::preset::{ExecuteCommand, LimitPolicy, SourceLayout, ToolchainSpec};

lazy_static! {
  // V8 reserves several GB of virtual memory on startup
  pub(crate) static ref JAVASCRIPT_PRESET: ToolchainSpec = ToolchainSpec::new(
    Language::JavaScript,
    SourceLayout::Flat("js"),
    ExecuteCommand::new("node", vec!["${source}"])
  )
  .default_limit_policy(LimitPolicy::WallClockOnly);
}
