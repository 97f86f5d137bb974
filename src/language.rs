use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::error::CatRunError;

/// Supported submission languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  Python,
  JavaScript,
  C,
  Cpp,
  Java,
}

lazy_static! {
  static ref LANGUAGE_ALIAS_MAP: HashMap<&'static str, Language> = {
    let mut map = HashMap::new();
    map.insert("py", Language::Python);
    map.insert("python", Language::Python);
    map.insert("python3", Language::Python);
    map.insert("js", Language::JavaScript);
    map.insert("node", Language::JavaScript);
    map.insert("javascript", Language::JavaScript);
    map.insert("c", Language::C);
    map.insert("cc", Language::Cpp);
    map.insert("c++", Language::Cpp);
    map.insert("cxx", Language::Cpp);
    map.insert("cpp", Language::Cpp);
    map.insert("java", Language::Java);
    map
  };
}

impl Language {
  pub fn all() -> [Language; 5] {
    [
      Language::Python,
      Language::JavaScript,
      Language::C,
      Language::Cpp,
      Language::Java,
    ]
  }

  /// Canonical name used on the wire
  pub fn name(&self) -> &'static str {
    match self {
      Language::Python => "python",
      Language::JavaScript => "javascript",
      Language::C => "c",
      Language::Cpp => "cpp",
      Language::Java => "java",
    }
  }

  /// Interpreted languages print their return value as JSON
  pub fn is_interpreted(&self) -> bool {
    match self {
      Language::Python | Language::JavaScript => true,
      Language::C | Language::Cpp | Language::Java => false,
    }
  }

  /// Detect language from a source file name like `main.cpp`
  pub fn detect<S: AsRef<str>>(file_name: S) -> Option<Language> {
    let (_, ext) = file_name.as_ref().rsplit_once('.')?;
    LANGUAGE_ALIAS_MAP.get(ext.to_lowercase().as_str()).copied()
  }
}

impl FromStr for Language {
  type Err = CatRunError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    LANGUAGE_ALIAS_MAP
      .get(s.trim().to_lowercase().as_str())
      .copied()
      .ok_or_else(|| CatRunError::unsupported(s))
  }
}

impl Display for Language {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn it_should_parse_aliases() {
    assert_eq!("Python3".parse::<Language>().unwrap(), Language::Python);
    assert_eq!("node".parse::<Language>().unwrap(), Language::JavaScript);
    assert_eq!("c++".parse::<Language>().unwrap(), Language::Cpp);
    assert_eq!(" java ".parse::<Language>().unwrap(), Language::Java);
  }

  #[test]
  fn it_should_reject_unknown_language() {
    let err = "brainfuck".parse::<Language>().unwrap_err();
    assert!(matches!(err, CatRunError::UnsupportedLanguage(name) if name == "brainfuck"));
  }

  #[test]
  fn it_should_detect_from_extension() {
    assert_eq!(Language::detect("a/b/main.cc"), Some(Language::Cpp));
    assert_eq!(Language::detect("solution.PY"), Some(Language::Python));
    assert_eq!(Language::detect("Makefile"), None);
    assert_eq!(Language::detect("notes.txt"), None);
  }

  #[test]
  fn it_should_round_trip_names() {
    for language in Language::all() {
      assert_eq!(language.name().parse::<Language>().unwrap(), language);
    }
  }
}
