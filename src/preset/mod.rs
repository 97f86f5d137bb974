use log::debug;

use crate::error::CatRunError;
use crate::language::Language;

pub use default::JAVA_ENTRY_CLASS;
pub use preset::{ExecuteCommand, LimitPolicy, SourceLayout, TemplateVars, ToolchainSpec};

mod default;
#[allow(clippy::module_inception)]
mod preset;

/// Toolchain for a supported language
pub fn resolve(language: Language) -> &'static ToolchainSpec {
  let spec: &'static ToolchainSpec = match language {
    Language::Python => &*default::PYTHON_PRESET,
    Language::JavaScript => &*default::JAVASCRIPT_PRESET,
    Language::C => &*default::C_PRESET,
    Language::Cpp => &*default::CPP_PRESET,
    Language::Java => &*default::JAVA_PRESET,
  };
  debug!("Resolve toolchain for {}", language);
  spec
}

/// Toolchain for a language name or alias coming from a caller
pub fn resolve_name(name: &str) -> Result<&'static ToolchainSpec, CatRunError> {
  let language = name.parse::<Language>()?;
  Ok(resolve(language))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn it_should_resolve_every_language() {
    for language in Language::all() {
      assert_eq!(resolve(language).language(), language);
    }
  }

  #[test]
  fn it_should_compile_only_compiled_languages() {
    assert!(!resolve(Language::Python).needs_compile());
    assert!(!resolve(Language::JavaScript).needs_compile());
    assert!(resolve(Language::C).needs_compile());
    assert!(resolve(Language::Cpp).needs_compile());
    assert!(resolve(Language::Java).needs_compile());
  }

  #[test]
  fn it_should_run_java_entry_class() {
    let spec = resolve(Language::Java);
    assert_eq!(spec.source(), SourceLayout::Entry("Main.java"));
    assert_eq!(spec.execute_command().arguments().last().unwrap(), JAVA_ENTRY_CLASS);
    assert_eq!(spec.limit_policy(), LimitPolicy::WallClockOnly);
  }

  #[test]
  fn it_should_reject_unknown_name() {
    assert!(matches!(
      resolve_name("cobol"),
      Err(CatRunError::UnsupportedLanguage(_))
    ));
    assert_eq!(resolve_name("py").unwrap().language(), Language::Python);
  }
}
