use std::env;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use flexi_logger::DeferredNow;
use log::{error, info, Record};

use crate::error::CatRunError;

/// A logline-formatter that produces log lines like <br>
/// ```[datetime: INFO] Run python submission in workspace 3f2a...```
pub fn default_format(
  w: &mut dyn std::io::Write,
  now: &mut DeferredNow,
  record: &Record,
) -> Result<(), std::io::Error> {
  write!(
    w,
    "[{}: {:5}] {}",
    now.format("%Y-%m-%d %H:%M:%S"),
    record.level(),
    record.args()
  )
}

pub(crate) fn into_c_string<S: AsRef<str>>(string: S) -> Result<CString, CatRunError> {
  CString::new(string.as_ref())
    .map_err(|_| CatRunError::exec(format!("{:?} contains a nul byte", string.as_ref())))
}

pub(crate) fn path_c_string(path: &Path) -> Result<CString, CatRunError> {
  CString::new(path.as_os_str().as_bytes())
    .map_err(|_| CatRunError::exec(format!("{:?} contains a nul byte", path)))
}

/// Parse `KEY=VALUE`, or `KEY` to forward the current value
pub(crate) fn parse_env(text: String) -> Result<(String, String), CatRunError> {
  match text.split_once('=') {
    Some((key, _)) if key.is_empty() => {
      error!("Wrong environment variable string ({}) format", &text);
      Err(CatRunError::cli("Wrong environment variable string format"))
    }
    Some((key, value)) => Ok((key.to_string(), value.to_string())),
    None if text.is_empty() => Err(CatRunError::cli("Empty environment variable string")),
    None => {
      let value = env::var(&text).unwrap_or_default();
      info!("Read environment variable {} = {}", text, value);
      Ok((text, value))
    }
  }
}
