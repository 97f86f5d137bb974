use lazy_static::lazy_static;
use regex::Regex;

use crate::language::Language;

lazy_static! {
  static ref PYTHON_TOP_LEVEL_DEF: Regex = Regex::new(r"(?m)^def\s+([A-Za-z_]\w*)\s*\(").unwrap();
  static ref PYTHON_DEF: Regex = Regex::new(r"\bdef\s+([A-Za-z_]\w*)\s*\(").unwrap();
  static ref JAVASCRIPT_FUNCTION: Regex = Regex::new(
    r"(?:\bfunction\s+([A-Za-z_$][\w$]*)\s*\(|\b(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*=>|[A-Za-z_$][\w$]*\s*=>))"
  )
  .unwrap();
  static ref JAVA_METHOD: Regex = Regex::new(
    r"\bpublic\s+(?:static\s+)?(?:final\s+)?[\w<>\[\]]+(?:\s*<[^>]*>)?(?:\[\])*\s+([A-Za-z_$][\w$]*)\s*\("
  )
  .unwrap();
  static ref C_FUNCTION: Regex =
    Regex::new(r"[\w>\*&]\s*[\*&]*\s*\b([A-Za-z_]\w*)\s*\([^;{}()]*\)\s*(?:const\s*)?\{").unwrap();
}

const C_KEYWORDS: [&str; 7] = ["if", "for", "while", "switch", "catch", "return", "sizeof"];

/// Guess the function a harness should call from submitted source
pub fn detect_entry(language: Language, source: &str) -> Option<String> {
  match language {
    Language::Python => PYTHON_TOP_LEVEL_DEF
      .captures(source)
      .or_else(|| PYTHON_DEF.captures(source))
      .and_then(|c| c.get(1))
      .map(|m| m.as_str().to_string()),
    Language::JavaScript => JAVASCRIPT_FUNCTION
      .captures(source)
      .and_then(|c| c.get(1).or_else(|| c.get(2)))
      .map(|m| m.as_str().to_string()),
    Language::Java => JAVA_METHOD
      .captures_iter(source)
      .filter_map(|c| c.get(1))
      .map(|m| m.as_str())
      .find(|name| *name != "main")
      .map(|name| name.to_string()),
    Language::C | Language::Cpp => C_FUNCTION
      .captures_iter(source)
      .filter_map(|c| c.get(1))
      .map(|m| m.as_str())
      .find(|name| *name != "main" && !C_KEYWORDS.contains(name))
      .map(|name| name.to_string()),
  }
}

/// Entry name given by the caller, or detected, or the fallback
pub fn resolve_entry(
  language: Language,
  source: &str,
  entry: Option<&str>,
  fallback: Option<&str>,
) -> Option<String> {
  entry
    .map(|name| name.to_string())
    .or_else(|| detect_entry(language, source))
    .or_else(|| fallback.map(|name| name.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn it_should_detect_python_function() {
    let source = "import math\n\nclass Helper:\n    def inner(self):\n        pass\n\ndef two_sum(nums, target):\n    return []\n";
    assert_eq!(detect_entry(Language::Python, source).unwrap(), "two_sum");
    let source = "class Solution:\n    def solve(self, x):\n        return x\n";
    assert_eq!(detect_entry(Language::Python, source).unwrap(), "solve");
  }

  #[test]
  fn it_should_detect_javascript_function() {
    assert_eq!(
      detect_entry(Language::JavaScript, "function add(a, b) { return a + b; }").unwrap(),
      "add"
    );
    assert_eq!(
      detect_entry(Language::JavaScript, "const add = (a, b) => a + b;").unwrap(),
      "add"
    );
    assert_eq!(
      detect_entry(Language::JavaScript, "let $sum = async function (xs) {}").unwrap(),
      "$sum"
    );
    assert!(detect_entry(Language::JavaScript, "const limit = 10;").is_none());
  }

  #[test]
  fn it_should_detect_java_method() {
    let source = "public class Main {\n  public static void main(String[] args) {}\n  public int[] twoSum(int[] nums, int target) { return nums; }\n}";
    assert_eq!(detect_entry(Language::Java, source).unwrap(), "twoSum");
    let source = "public class Solution {\n  public List<Integer> collect(int n) { return null; }\n}";
    assert_eq!(detect_entry(Language::Java, source).unwrap(), "collect");
  }

  #[test]
  fn it_should_detect_c_function() {
    let source = "#include <stdio.h>\nchar *reverse(char *s) {\n  if (s) {\n  }\n  return s;\n}\n";
    assert_eq!(detect_entry(Language::C, source).unwrap(), "reverse");
    let source = "int main() { return 0; }\nvector<int> twoSum(vector<int>& nums, int target) {\n  return {};\n}\n";
    assert_eq!(detect_entry(Language::Cpp, source).unwrap(), "twoSum");
  }

  #[test]
  fn it_should_prefer_given_entry() {
    assert_eq!(
      resolve_entry(Language::Python, "def f(): pass", Some("g"), None).unwrap(),
      "g"
    );
    assert_eq!(
      resolve_entry(Language::Python, "print(1)", None, Some("two_sum")).unwrap(),
      "two_sum"
    );
    assert!(resolve_entry(Language::Python, "print(1)", None, None).is_none());
  }
}
