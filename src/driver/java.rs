//! Textual rewriting of a submitted Java class.
//!
//! `java` runs a fixed class name, so the submitted class is renamed and a generated
//! `main` is spliced into its body. This is a text transform, not a parser. Known failure
//! modes:
//! - the old class name is replaced as a whole word everywhere, string literals included;
//! - a class declaration that does not start a line (`import a.B; class C {`) is only
//!   found by the loose fallback pattern, which also matches the word `class` in comments;
//! - text blocks (`"""`) and unbalanced braces confuse the brace scanner, which then
//!   reports a harness error.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::CatRunError;

lazy_static! {
  static ref CLASS_DECLARATION: Regex =
    Regex::new(r"(?m)^[ \t]*(?:(?:public|final|abstract|strictfp)\s+)*class\s+([A-Za-z_$][A-Za-z0-9_$]*)")
      .unwrap();
  static ref LOOSE_CLASS_DECLARATION: Regex =
    Regex::new(r"\bclass\s+([A-Za-z_$][A-Za-z0-9_$]*)").unwrap();
}

/// Name and byte offset (just past the name) of the first class declaration
fn find_class(source: &str) -> Option<(String, usize)> {
  let captures = CLASS_DECLARATION
    .captures(source)
    .or_else(|| LOOSE_CLASS_DECLARATION.captures(source))?;
  let name = captures.get(1)?;
  Some((name.as_str().to_string(), name.end()))
}

/// Rename the first declared class to `entry_class`, along with every whole-word use of its
/// old name (constructors, `new Solution()`)
pub fn retarget_class(source: &str, entry_class: &str) -> Result<String, CatRunError> {
  let (name, _) =
    find_class(source).ok_or_else(|| CatRunError::harness("Can not find a class declaration"))?;
  if name == entry_class {
    return Ok(source.to_string());
  }

  let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&name)))
    .map_err(|e| CatRunError::harness(e.to_string()))?;
  Ok(pattern.replace_all(source, entry_class).into_owned())
}

/// Byte offset of the `}` matching the first `{` at or after `from`.
/// String and char literals and comments are skipped.
fn class_body_end(source: &str, from: usize) -> Option<usize> {
  let bytes = source.as_bytes();
  let mut depth = 0usize;
  let mut i = from;
  while i < bytes.len() {
    match bytes[i] {
      b'/' if bytes.get(i + 1) == Some(&b'/') => {
        while i < bytes.len() && bytes[i] != b'\n' {
          i += 1;
        }
      }
      b'/' if bytes.get(i + 1) == Some(&b'*') => {
        let end = source[i + 2..].find("*/")?;
        i = i + 2 + end + 1;
      }
      quote @ (b'"' | b'\'') => {
        i += 1;
        while i < bytes.len() && bytes[i] != quote {
          if bytes[i] == b'\\' {
            i += 1;
          }
          i += 1;
        }
        if i >= bytes.len() {
          return None;
        }
      }
      b'{' => depth += 1,
      b'}' => {
        depth = depth.checked_sub(1)?;
        if depth == 0 {
          return Some(i);
        }
      }
      _ => {}
    }
    i += 1;
  }
  None
}

/// Insert `member` right before the closing brace of class `class_name`
pub fn inject_member(source: &str, class_name: &str, member: &str) -> Result<String, CatRunError> {
  let (_, offset) = find_class(source)
    .filter(|(name, _)| name == class_name)
    .ok_or_else(|| CatRunError::harness(format!("Can not find class {}", class_name)))?;
  let end = class_body_end(source, offset)
    .ok_or_else(|| CatRunError::harness(format!("Unbalanced braces in class {}", class_name)))?;

  let mut program = String::with_capacity(source.len() + member.len() + 2);
  program.push_str(source[..end].trim_end());
  program.push('\n');
  program.push_str(member);
  program.push('\n');
  program.push_str(&source[end..]);
  Ok(program)
}

/// Retarget the submitted class to `entry_class` and splice `member` into it
pub fn splice(source: &str, entry_class: &str, member: &str) -> Result<String, CatRunError> {
  let source = retarget_class(source, entry_class)?;
  inject_member(&source, entry_class, member)
}
