use std::fs::{create_dir, create_dir_all, remove_file, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use remove_dir_all::remove_dir_all;

use crate::error::CatRunError;
use crate::preset::{SourceLayout, TemplateVars, ToolchainSpec};

/// Scratch directory owned by exactly one execution request.
///
/// Every request gets `<language>_<id>` under the scratch root, named from a fresh random
/// id, and all of its files live inside. Steps run with that directory as their working
/// directory, so files a program creates are removed by [`Workspace::destroy`], which also
/// runs on drop.
#[derive(Debug)]
pub struct Workspace {
  id: String,
  workdir: PathBuf,
  source: PathBuf,
  executable: PathBuf,
  stdin: PathBuf,
  stdout: PathBuf,
  stderr: PathBuf,
  paths: Vec<PathBuf>,
  destroyed: bool,
}

/// 128 random bits, hex encoded
fn fresh_id() -> String {
  format!("{:032x}", rand::random::<u128>())
}

impl Workspace {
  /// Allocate a workspace under `root` laid out for `toolchain`
  pub fn create<P: AsRef<Path>>(root: P, toolchain: &ToolchainSpec) -> Result<Self, CatRunError> {
    let root = root.as_ref();
    create_dir_all(root)?;

    let id = fresh_id();
    let workdir = root.join(format!("{}_{}", toolchain.language().name(), id));
    // 目录已存在说明 id 冲突
    create_dir(&workdir)?;

    let (source, executable) = match toolchain.source() {
      SourceLayout::Flat(extension) => (
        workdir.join(format!("code_{}.{}", id, extension)),
        workdir.join(format!("bin_{}", id)),
      ),
      // 固定文件名的语言（Java）编译产物写在目录本身
      SourceLayout::Entry(file_name) => (workdir.join(file_name), workdir.clone()),
    };

    let workspace = Workspace {
      stdin: workdir.join(format!("input_{}.txt", id)),
      stdout: workdir.join(format!("out_{}.txt", id)),
      stderr: workdir.join(format!("err_{}.txt", id)),
      paths: vec![workdir.clone()],
      id,
      workdir,
      source,
      executable,
      destroyed: false,
    };

    debug!("Create workspace {} under {}", workspace.id, root.to_string_lossy());
    Ok(workspace)
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn source(&self) -> &Path {
    &self.source
  }

  pub fn executable(&self) -> &Path {
    &self.executable
  }

  pub fn workdir(&self) -> &Path {
    &self.workdir
  }

  pub fn stdin(&self) -> &Path {
    &self.stdin
  }

  pub fn stdout(&self) -> &Path {
    &self.stdout
  }

  pub fn stderr(&self) -> &Path {
    &self.stderr
  }

  /// Every path this workspace owns
  pub fn paths(&self) -> &[PathBuf] {
    &self.paths
  }

  pub fn template_vars(&self) -> TemplateVars<'_> {
    TemplateVars {
      source: &self.source,
      executable: &self.executable,
      workdir: &self.workdir,
    }
  }

  /// Write submitted code to the source path
  pub fn write_source(&self, code: &str) -> Result<&Path, CatRunError> {
    write_new(&self.source, code.as_bytes())?;
    Ok(&self.source)
  }

  /// Write data fed to the run step
  pub fn write_stdin(&self, data: &[u8]) -> Result<&Path, CatRunError> {
    write_new(&self.stdin, data)?;
    Ok(&self.stdin)
  }

  /// Remove every owned path. Never fails: problems are logged and skipped.
  pub fn destroy(&mut self) {
    if self.destroyed {
      return;
    }
    self.destroyed = true;

    for path in self.paths.iter() {
      let result = if path.is_dir() {
        remove_dir_all(path)
      } else {
        remove_file(path)
      };
      match result {
        Ok(_) => debug!("Remove {}", path.to_string_lossy()),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!("Fails removing {}: {}", path.to_string_lossy(), err),
      }
    }
    debug!("Destroy workspace {}", self.id);
  }

  pub fn is_destroyed(&self) -> bool {
    self.destroyed
  }
}

impl Drop for Workspace {
  fn drop(&mut self) {
    self.destroy();
  }
}

/// Refuse to overwrite: an existing file means the id collided
fn write_new(path: &Path, data: &[u8]) -> Result<(), CatRunError> {
  let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
  file.write_all(data)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;
  use std::fs;

  use tempfile::tempdir;

  use super::*;
  use crate::language::Language;
  use crate::preset::resolve;

  #[test]
  fn it_should_remove_everything_on_destroy() {
    let root = tempdir().unwrap();
    let mut workspace = Workspace::create(root.path(), resolve(Language::Cpp)).unwrap();
    workspace.write_source("int main() {}").unwrap();
    workspace.write_stdin(b"1 2\n").unwrap();
    fs::write(workspace.executable(), b"\x7fELF").unwrap();
    fs::write(workspace.stdout(), b"3\n").unwrap();

    assert!(workspace.source().exists());
    workspace.destroy();
    assert!(workspace.is_destroyed());
    for path in workspace.paths() {
      assert!(!path.exists(), "{} should be removed", path.to_string_lossy());
    }
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
  }

  #[test]
  fn it_should_tolerate_missing_paths() {
    let root = tempdir().unwrap();
    let mut workspace = Workspace::create(root.path(), resolve(Language::Python)).unwrap();
    workspace.destroy();
    workspace.destroy();
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
  }

  #[test]
  fn it_should_clean_up_on_drop() {
    let root = tempdir().unwrap();
    {
      let workspace = Workspace::create(root.path(), resolve(Language::Java)).unwrap();
      workspace.write_source("public class Main {}").unwrap();
      fs::write(workspace.workdir().join("Main.class"), b"cafebabe").unwrap();
      assert!(workspace.source().starts_with(workspace.workdir()));
    }
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
  }

  #[test]
  fn it_should_lay_out_java_in_own_directory() {
    let root = tempdir().unwrap();
    let workspace = Workspace::create(root.path(), resolve(Language::Java)).unwrap();
    assert!(workspace.workdir().is_dir());
    assert_eq!(workspace.source().file_name().unwrap(), "Main.java");
    assert_eq!(workspace.executable(), workspace.workdir());
    assert!(workspace
      .workdir()
      .file_name()
      .unwrap()
      .to_string_lossy()
      .contains(workspace.id()));
  }

  #[test]
  fn it_should_keep_every_file_in_own_directory() {
    let root = tempdir().unwrap();
    let first = Workspace::create(root.path(), resolve(Language::Cpp)).unwrap();
    let second = Workspace::create(root.path(), resolve(Language::Cpp)).unwrap();
    assert_ne!(first.workdir(), second.workdir());
    assert_eq!(first.workdir().parent().unwrap(), root.path());
    for path in [
      first.source(),
      first.executable(),
      first.stdin(),
      first.stdout(),
      first.stderr(),
    ] {
      assert!(path.starts_with(first.workdir()), "{}", path.to_string_lossy());
    }
    assert_eq!(first.paths(), &[first.workdir().to_path_buf()]);
  }

  #[test]
  fn it_should_remove_files_written_by_program() {
    let root = tempdir().unwrap();
    let mut workspace = Workspace::create(root.path(), resolve(Language::Python)).unwrap();
    fs::create_dir(workspace.workdir().join("nested")).unwrap();
    fs::write(workspace.workdir().join("nested").join("leak.txt"), b"x").unwrap();
    workspace.destroy();
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
  }

  #[test]
  fn it_should_use_unique_ids() {
    let root = tempdir().unwrap();
    let ids = (0..64)
      .map(|_| {
        Workspace::create(root.path(), resolve(Language::Python))
          .unwrap()
          .id()
          .to_string()
      })
      .collect::<HashSet<String>>();
    assert_eq!(ids.len(), 64);
  }

  #[test]
  fn it_should_not_overwrite_source() {
    let root = tempdir().unwrap();
    let workspace = Workspace::create(root.path(), resolve(Language::Python)).unwrap();
    workspace.write_source("print(1)").unwrap();
    assert!(workspace.write_source("print(2)").is_err());
    assert_eq!(fs::read_to_string(workspace.source()).unwrap(), "print(1)");
  }
}
