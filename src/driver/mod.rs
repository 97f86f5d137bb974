//! Harness generation: glue code that calls the submitted function with decoded call
//! arguments and prints its return value as the last line of stdout.
//!
//! Interpreted languages get the arguments as native literals and print JSON. C, C++ and
//! Java only accept scalars, strings, and flat arrays of integers, floats or strings;
//! nested or mixed structures are rejected with [`CatRunError::Harness`].

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde_json::Value;

pub use entry::{detect_entry, resolve_entry};

use crate::error::CatRunError;
use crate::language::Language;
use crate::preset::JAVA_ENTRY_CLASS;

mod entry;
pub mod java;

lazy_static! {
  static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
  static ref JAVASCRIPT_IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
}

const C_PRELUDE: &str = "#include <stdbool.h>
#include <stdio.h>
#include <stdlib.h>
#include <string.h>
";

const CPP_PRELUDE: &str = "#include <algorithm>
#include <iomanip>
#include <iostream>
#include <map>
#include <set>
#include <sstream>
#include <string>
#include <unordered_map>
#include <vector>
using namespace std;
";

/// Shape of a flat array argument for statically typed targets
enum ArrayKind {
  Integer,
  Float,
  Text,
}

fn array_kind(items: &[Value]) -> Result<ArrayKind, CatRunError> {
  if items.iter().all(|v| v.is_i64() || v.is_u64()) {
    Ok(ArrayKind::Integer)
  } else if items.iter().all(|v| v.is_number()) {
    Ok(ArrayKind::Float)
  } else if items.iter().all(|v| v.is_string()) {
    Ok(ArrayKind::Text)
  } else {
    Err(CatRunError::harness(
      "Only flat arrays of numbers or strings can be passed to compiled languages",
    ))
  }
}

/// Double-quoted literal valid in C, C++ and Java
fn quoted(text: &str) -> String {
  let mut literal = String::with_capacity(text.len() + 2);
  literal.push('"');
  for ch in text.chars() {
    match ch {
      '"' => literal.push_str("\\\""),
      '\\' => literal.push_str("\\\\"),
      '\n' => literal.push_str("\\n"),
      '\r' => literal.push_str("\\r"),
      '\t' => literal.push_str("\\t"),
      // 八进制转义最多 3 位，不会吞掉后面的字符
      c if (c as u32) < 0x20 || c as u32 == 0x7f => {
        literal.push_str(&format!("\\{:03o}", c as u32));
      }
      c => literal.push(c),
    }
  }
  literal.push('"');
  literal
}

fn join<F: Fn(&Value) -> Result<String, CatRunError>>(values: &[Value], f: F) -> Result<String, CatRunError> {
  Ok(values.iter().map(f).collect::<Result<Vec<_>, _>>()?.join(", "))
}

fn python_literal(value: &Value) -> Result<String, CatRunError> {
  Ok(match value {
    Value::Null => "None".to_string(),
    Value::Bool(true) => "True".to_string(),
    Value::Bool(false) => "False".to_string(),
    Value::Number(number) => number.to_string(),
    Value::String(text) => serde_json::to_string(text)?,
    Value::Array(items) => format!("[{}]", join(items, python_literal)?),
    Value::Object(map) => {
      let entries = map
        .iter()
        .map(|(key, value)| Ok(format!("{}: {}", serde_json::to_string(key)?, python_literal(value)?)))
        .collect::<Result<Vec<String>, CatRunError>>()?;
      format!("{{{}}}", entries.join(", "))
    }
  })
}

fn scalar_literal(language: Language, value: &Value) -> Result<String, CatRunError> {
  Ok(match value {
    Value::Null => match language {
      Language::C => "NULL",
      Language::Cpp => "nullptr",
      _ => "null",
    }
    .to_string(),
    Value::Bool(flag) => flag.to_string(),
    Value::Number(number) => match (language, number.as_i64()) {
      (Language::Java, Some(n)) if i32::try_from(n).is_err() => format!("{}L", n),
      (Language::C | Language::Cpp, Some(n)) if i32::try_from(n).is_err() => format!("{}LL", n),
      _ => number.to_string(),
    },
    Value::String(text) => quoted(text),
    Value::Array(_) | Value::Object(_) => {
      return Err(CatRunError::harness(
        "Nested structures can not be passed to compiled languages",
      ))
    }
  })
}

/// Encode one call argument for a statically typed target
fn static_literal(language: Language, value: &Value) -> Result<String, CatRunError> {
  let items = match value {
    Value::Array(items) => items,
    _ => return scalar_literal(language, value),
  };
  let kind = array_kind(items)?;
  let body = join(items, |item| scalar_literal(language, item))?;

  Ok(match language {
    Language::Cpp => format!("{{{}}}", body),
    Language::C if items.is_empty() => "NULL".to_string(),
    Language::C => match kind {
      ArrayKind::Integer => format!("(long long[]){{{}}}", body),
      ArrayKind::Float => format!("(double[]){{{}}}", body),
      ArrayKind::Text => format!("(char *[]){{{}}}", body),
    },
    Language::Java => match kind {
      ArrayKind::Integer if items.iter().all(fits_i32) => {
        format!("new int[]{{{}}}", body)
      }
      ArrayKind::Integer => format!("new long[]{{{}}}", body),
      ArrayKind::Float => format!("new double[]{{{}}}", body),
      ArrayKind::Text => format!("new String[]{{{}}}", body),
    },
    Language::Python | Language::JavaScript => {
      return Err(CatRunError::harness(format!("{} takes native literals", language)))
    }
  })
}

fn python_driver(entry: &str, args: &[Value]) -> Result<String, CatRunError> {
  Ok(format!(
    "import json as __catrun_json


def __catrun_entry(name):
    if callable(globals().get(name)):
        return globals()[name]
    for value in list(globals().values()):
        if isinstance(value, type) and value.__module__ == \"__main__\" and callable(getattr(value, name, None)):
            return getattr(value(), name)
    raise NameError(\"name %r is not defined\" % name)


if __name__ == \"__main__\":
    __catrun_result = __catrun_entry(\"{}\")(*[{}])
    print(__catrun_json.dumps(__catrun_result, default=str))
",
    entry,
    join(args, python_literal)?
  ))
}

fn javascript_driver(entry: &str, args: &[Value]) -> Result<String, CatRunError> {
  Ok(format!(
    "const __catrunArgs = {};
console.log(JSON.stringify({}(...__catrunArgs)));
",
    serde_json::to_string(args)?,
    entry
  ))
}

fn c_driver(entry: &str, args: &[Value]) -> Result<String, CatRunError> {
  Ok(format!(
    "static void catrun_print_long(long long value) {{ printf(\"%lld\\n\", value); }}
static void catrun_print_ulong(unsigned long long value) {{ printf(\"%llu\\n\", value); }}
static void catrun_print_double(double value) {{ printf(\"%.15g\\n\", value); }}
static void catrun_print_string(const char *value) {{ printf(\"%s\\n\", value ? value : \"null\"); }}
static void catrun_print_bool(bool value) {{ printf(\"%s\\n\", value ? \"true\" : \"false\"); }}

#define CATRUN_PRINT(x) _Generic((x), \\
  _Bool: catrun_print_bool, \\
  char *: catrun_print_string, \\
  const char *: catrun_print_string, \\
  float: catrun_print_double, \\
  double: catrun_print_double, \\
  unsigned int: catrun_print_ulong, \\
  unsigned long: catrun_print_ulong, \\
  unsigned long long: catrun_print_ulong, \\
  default: catrun_print_long)(x)

int main(void) {{
  CATRUN_PRINT({}({}));
  return 0;
}}
",
    entry,
    join(args, |v| static_literal(Language::C, v))?
  ))
}

fn fits_i32(value: &Value) -> bool {
  value.as_i64().map_or(false, |n| i32::try_from(n).is_ok())
}

/// C++ type of a local that holds one argument
fn cpp_type(value: &Value) -> Result<String, CatRunError> {
  Ok(match value {
    Value::Null => "decltype(nullptr)".to_string(),
    Value::Bool(_) => "bool".to_string(),
    Value::Number(_) if fits_i32(value) => "int".to_string(),
    Value::Number(number) if number.is_i64() => "long long".to_string(),
    Value::Number(number) if number.is_u64() => "unsigned long long".to_string(),
    Value::Number(_) => "double".to_string(),
    Value::String(_) => "string".to_string(),
    Value::Array(items) => match array_kind(items)? {
      ArrayKind::Integer if items.iter().all(fits_i32) => "vector<int>".to_string(),
      ArrayKind::Integer => "vector<long long>".to_string(),
      ArrayKind::Float => "vector<double>".to_string(),
      ArrayKind::Text => "vector<string>".to_string(),
    },
    Value::Object(_) => {
      return Err(CatRunError::harness(
        "Nested structures can not be passed to compiled languages",
      ))
    }
  })
}

fn cpp_driver(entry: &str, args: &[Value]) -> Result<String, CatRunError> {
  // 每个参数绑定到具名变量，引用参数 (vector<int>&) 才能接收
  let mut locals = String::new();
  for (index, value) in args.iter().enumerate() {
    let literal = match value {
      Value::Number(number) if number.as_i64().is_none() && number.is_u64() => format!("{}ULL", number),
      _ => static_literal(Language::Cpp, value)?,
    };
    locals.push_str(&format!("  {} catrun_arg{} = {};\n", cpp_type(value)?, index, literal));
  }
  let names = (0..args.len())
    .map(|index| format!("catrun_arg{}", index))
    .collect::<Vec<String>>()
    .join(", ");

  Ok(format!(
    "template <typename T>
void catrun_print(const T &value) {{ cout << value; }}
void catrun_print(const string &value) {{ cout << value; }}
void catrun_print(bool value) {{ cout << (value ? \"true\" : \"false\"); }}
template <typename T>
void catrun_print(const vector<T> &values) {{
  cout << \"[\";
  for (size_t i = 0; i < values.size(); i++) {{
    if (i > 0) cout << \", \";
    catrun_print(values[i]);
  }}
  cout << \"]\";
}}

int main() {{
  cout << setprecision(15);
{}  auto result = {}({});
  catrun_print(result);
  cout << endl;
  return 0;
}}
",
    locals, entry, names
  ))
}

fn java_driver(entry: &str, args: &[Value]) -> Result<String, CatRunError> {
  Ok(format!(
    "
    public static void main(String[] args) {{
        {main_class} solution = new {main_class}();
        Object result = solution.{entry}({args});
        System.out.println(catrunFormat(result));
    }}

    private static String catrunFormat(Object value) {{
        if (value instanceof int[]) return java.util.Arrays.toString((int[]) value);
        if (value instanceof long[]) return java.util.Arrays.toString((long[]) value);
        if (value instanceof double[]) return java.util.Arrays.toString((double[]) value);
        if (value instanceof boolean[]) return java.util.Arrays.toString((boolean[]) value);
        if (value instanceof Object[]) return java.util.Arrays.deepToString((Object[]) value);
        return String.valueOf(value);
    }}",
    main_class = JAVA_ENTRY_CLASS,
    entry = entry,
    args = join(args, |v| static_literal(Language::Java, v))?
  ))
}

fn check_entry(language: Language, entry: &str) -> Result<(), CatRunError> {
  let valid = match language {
    Language::JavaScript => JAVASCRIPT_IDENTIFIER.is_match(entry),
    Language::Python | Language::C | Language::Cpp | Language::Java => IDENTIFIER.is_match(entry),
  };
  if valid {
    Ok(())
  } else {
    Err(CatRunError::harness(format!("Invalid entry name {:?}", entry)))
  }
}

/// Generate the glue code alone
pub fn generate_driver(language: Language, entry: &str, args: &[Value]) -> Result<String, CatRunError> {
  check_entry(language, entry)?;
  match language {
    Language::Python => python_driver(entry, args),
    Language::JavaScript => javascript_driver(entry, args),
    Language::C => c_driver(entry, args),
    Language::Cpp => cpp_driver(entry, args),
    Language::Java => java_driver(entry, args),
  }
}

/// Combine submitted source with generated glue into the program to run
pub fn build_program(language: Language, source: &str, entry: &str, args: &[Value]) -> Result<String, CatRunError> {
  let driver = generate_driver(language, entry, args)?;
  debug!("Generate {} driver for {} ({} arguments)", language, entry, args.len());
  match language {
    Language::Python | Language::JavaScript => Ok(format!("{}\n\n{}", source.trim_end(), driver)),
    Language::C => Ok(format!("{}\n{}\n\n{}", C_PRELUDE, source.trim(), driver)),
    Language::Cpp => Ok(format!("{}\n{}\n\n{}", CPP_PRELUDE, source.trim(), driver)),
    Language::Java => java::splice(source.trim(), JAVA_ENTRY_CLASS, &driver),
  }
}
