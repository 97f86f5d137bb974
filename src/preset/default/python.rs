use lazy_static::lazy_static;

use crate::language::Language;
use crate::preset::preset::{ExecuteCommand, SourceLayout, ToolchainSpec};

lazy_static! {
  pub(crate) static ref PYTHON_PRESET: ToolchainSpec = ToolchainSpec::new(
    Language::Python,
    SourceLayout::Flat("py"),
    ExecuteCommand::new("python3", vec!["${source}"])
  );
}
