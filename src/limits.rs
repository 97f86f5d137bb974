use std::time::Duration;

use nix::errno::Errno;
use nix::sys::resource::{setrlimit, Resource};

pub type CpuLimitType = u64;

pub type MemoryLimitType = u64;

/// Per-process ceilings for one spawned step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceLimits {
  /// CPU time (unit: second), enforced by RLIMIT_CPU
  pub cpu_seconds: CpuLimitType,
  /// Address space (unit: byte), enforced by RLIMIT_AS
  pub memory_bytes: MemoryLimitType,
  /// Real elapsed time (unit: second), enforced by the parent
  pub wall_clock_seconds: f64,
  /// Largest file the process may write (unit: byte), enforced by RLIMIT_FSIZE
  pub output_bytes: u64,
}

impl ResourceLimits {
  pub fn new(cpu_seconds: CpuLimitType, memory_bytes: MemoryLimitType, wall_clock_seconds: f64) -> Self {
    ResourceLimits {
      cpu_seconds,
      memory_bytes,
      wall_clock_seconds,
      output_bytes: 64 * 1024 * 1024,
    }
  }

  /// Budget for compilers
  pub fn compile() -> Self {
    ResourceLimits::new(10, 2 * 1024 * 1024 * 1024, 10.0)
  }

  pub fn output_bytes(mut self, value: u64) -> Self {
    self.output_bytes = value;
    self
  }

  pub fn wall_clock(&self) -> Duration {
    Duration::try_from_secs_f64(self.wall_clock_seconds).unwrap_or(Duration::ZERO)
  }
}

impl Default for ResourceLimits {
  fn default() -> Self {
    ResourceLimits::new(3, 256 * 1024 * 1024, 5.0)
  }
}

/// 在子进程 exec 之前调用 setrlimit
///
/// Limits bind to the calling process and are inherited by anything it forks, but each
/// descendant gets its own budget: this is not a guard against fork bombs.
pub(crate) fn apply_resource_limits(limits: &ResourceLimits) -> Result<(), Errno> {
  // 超过 soft 收到 SIGXCPU，hard 再多给 1 秒后 SIGKILL
  let cpu = limits.cpu_seconds.max(1);
  setrlimit(Resource::RLIMIT_CPU, cpu, cpu + 1)?;

  setrlimit(Resource::RLIMIT_AS, limits.memory_bytes, limits.memory_bytes)?;

  setrlimit(Resource::RLIMIT_FSIZE, limits.output_bytes, limits.output_bytes)?;

  // 不产生 core dump
  setrlimit(Resource::RLIMIT_CORE, 0, 0)?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn it_should_have_defaults() {
    let limits = ResourceLimits::default();
    assert_eq!(limits.cpu_seconds, 3);
    assert_eq!(limits.memory_bytes, 256 * 1024 * 1024);
    assert_eq!(limits.wall_clock(), Duration::from_secs(5));
  }

  #[test]
  fn it_should_not_panic_on_bad_wall_clock() {
    let limits = ResourceLimits::new(1, 1024, -1.0);
    assert_eq!(limits.wall_clock(), Duration::ZERO);
    let limits = ResourceLimits::new(1, 1024, f64::NAN);
    assert_eq!(limits.wall_clock(), Duration::ZERO);
  }
}
