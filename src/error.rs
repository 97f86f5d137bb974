use std::{
  error::Error,
  fmt::{Debug, Display},
  process::{ExitCode, Termination},
  time::Duration,
};

use flexi_logger::FlexiLoggerError;
use nix::{errno::Errno, libc::STDOUT_FILENO, unistd::isatty};

pub enum CatRunError {
  Fork(String),
  Exec(String),
  Nix(Errno),
  Fs(String),
  Cli(String),
  Json(String),
  Harness(String),
  UnsupportedLanguage(String),
  Timeout(Duration),
  Logger(FlexiLoggerError),
}

pub enum CatRunExit {
  Ok,
  Err(CatRunError),
}

impl CatRunError {
  pub fn fork<MS: Into<String>>(msg: MS) -> CatRunError {
    CatRunError::Fork(msg.into())
  }

  pub fn exec<MS: Into<String>>(msg: MS) -> CatRunError {
    CatRunError::Exec(msg.into())
  }

  pub fn cli<MS: Into<String>>(msg: MS) -> CatRunError {
    CatRunError::Cli(msg.into())
  }

  pub fn harness<MS: Into<String>>(msg: MS) -> CatRunError {
    CatRunError::Harness(msg.into())
  }

  pub fn unsupported<MS: Into<String>>(language: MS) -> CatRunError {
    CatRunError::UnsupportedLanguage(language.into())
  }
}

impl Debug for CatRunError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    std::fmt::Display::fmt(&self, f)
  }
}

impl Display for CatRunError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self {
      CatRunError::Fork(msg) => f.write_fmt(format_args!("CatRun Fork Error: {}", msg)),
      CatRunError::Exec(msg) => f.write_fmt(format_args!("CatRun Exec Error: {}", msg)),
      CatRunError::Nix(errno) => f.write_fmt(format_args!("CatRun Nix Error: {}", errno)),
      CatRunError::Fs(msg) => f.write_fmt(format_args!("CatRun File System Error: {}", msg)),
      CatRunError::Cli(msg) => f.write_fmt(format_args!("CatRun CLI Error: {}", msg)),
      CatRunError::Json(msg) => f.write_fmt(format_args!("CatRun JSON Error: {}", msg)),
      CatRunError::Harness(msg) => f.write_fmt(format_args!("CatRun Harness Error: {}", msg)),
      CatRunError::UnsupportedLanguage(language) => {
        f.write_fmt(format_args!("CatRun Language Error: unsupported language {}", language))
      }
      CatRunError::Timeout(limit) => f.write_fmt(format_args!(
        "CatRun Timeout Error: execution exceeded {:.3} seconds",
        limit.as_secs_f64()
      )),
      CatRunError::Logger(err) => f.write_fmt(format_args!("CatRun Logger Error: {}", err)),
    }
  }
}

impl From<Errno> for CatRunError {
  fn from(errno: Errno) -> Self {
    CatRunError::Nix(errno)
  }
}

impl From<std::io::Error> for CatRunError {
  fn from(err: std::io::Error) -> Self {
    CatRunError::Fs(err.to_string())
  }
}

impl From<serde_json::Error> for CatRunError {
  fn from(err: serde_json::Error) -> Self {
    CatRunError::Json(err.to_string())
  }
}

impl From<FlexiLoggerError> for CatRunError {
  fn from(err: FlexiLoggerError) -> Self {
    CatRunError::Logger(err)
  }
}

impl Error for CatRunError {}

impl Termination for CatRunExit {
  fn report(self) -> ExitCode {
    match self {
      CatRunExit::Ok => ExitCode::SUCCESS.report(),
      CatRunExit::Err(err) => {
        let text = format!("{}", err);
        let text = match text.split_once(": ") {
          Some((prefix, message)) => {
            let is_tty = isatty(STDOUT_FILENO).unwrap_or(false);
            if is_tty {
              format!("\x1b[1m\x1b[91m{}\x1b[39m\x1b[22m  {}", prefix, message)
            } else {
              serde_json::json!({ "ok": false, "type": prefix, "message": message }).to_string()
            }
          }
          None => text,
        };
        eprintln!("{}", text);
        ExitCode::FAILURE.report()
      }
    }
  }
}
