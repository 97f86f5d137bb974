use std::os::unix::prelude::RawFd;

use nix::{
  errno::Errno,
  fcntl::OFlag,
  unistd::{self, close, pipe2},
};

use crate::error::CatRunError;

/// Pipe the child uses to report failures that happen before its target program starts.
///
/// Both ends are `O_CLOEXEC`, so a successful `execvpe` closes the write end and the parent
/// reads nothing.
pub struct ExecPipe(RawFd, RawFd);

pub struct ExecReadPipe(RawFd);

pub struct ExecWritePipe(RawFd);

impl ExecPipe {
  pub fn new() -> Result<Self, CatRunError> {
    let result = pipe2(OFlag::O_CLOEXEC | OFlag::O_NONBLOCK)?;
    Ok(ExecPipe(result.0, result.1))
  }

  pub fn read(self) -> Result<ExecReadPipe, CatRunError> {
    let (read, write) = (self.0, self.1);
    std::mem::forget(self);
    close(write)?;
    Ok(ExecReadPipe(read))
  }

  pub fn write(self) -> Result<ExecWritePipe, CatRunError> {
    let (read, write) = (self.0, self.1);
    std::mem::forget(self);
    close(read)?;
    Ok(ExecWritePipe(write))
  }
}

impl Drop for ExecPipe {
  fn drop(&mut self) {
    let _ = close(self.0);
    let _ = close(self.1);
  }
}

impl ExecReadPipe {
  /// Read the reported message, empty when the child reported nothing.
  ///
  /// Call after the child has been reaped. Another thread's child may still hold a copy
  /// of the write end between its fork and exec, so `EAGAIN` counts as "no more data".
  pub fn read(&self) -> Result<String, CatRunError> {
    let mut message = Vec::new();
    let mut buf = [0u8; 512];
    loop {
      match unistd::read(self.0, &mut buf) {
        Ok(0) => break,
        Ok(size) => {
          message.extend_from_slice(&buf[..size]);
          if message.len() >= 4096 {
            break;
          }
        }
        Err(Errno::EINTR) => continue,
        Err(Errno::EAGAIN) => break,
        Err(err) => return Err(err.into()),
      }
    }
    // 忽略 UTF-8 parse 错误
    Ok(String::from_utf8_lossy(&message).into_owned())
  }
}

impl Drop for ExecReadPipe {
  fn drop(&mut self) {
    let _ = close(self.0);
  }
}

impl ExecWritePipe {
  pub fn write<S: AsRef<str>>(&self, text: S) -> Result<usize, CatRunError> {
    let size = unistd::write(self.0, text.as_ref().as_bytes())?;
    Ok(size)
  }
}

impl Drop for ExecWritePipe {
  fn drop(&mut self) {
    let _ = close(self.0);
  }
}
