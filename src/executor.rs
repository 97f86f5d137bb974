use std::convert::Infallible;
use std::ffi::CString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::{Duration, Instant};

use libc_stdhandle::{stderr, stdin, stdout};
use log::{debug, info, warn};
use nix::errno::Errno;
use nix::libc::{self, c_int, freopen};
use nix::sys::signal::{kill, killpg, Signal};
use nix::sys::wait::WaitStatus;
use nix::unistd::{chdir, execvpe, fork, setpgid, ForkResult, Pid};

use crate::error::CatRunError;
use crate::limits::{apply_resource_limits, ResourceLimits};
use crate::pipe::{ExecPipe, ExecWritePipe};
use crate::utils::{into_c_string, path_c_string};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// One child process to spawn: a compile step or the run step
#[derive(Debug, Clone)]
pub struct StepCommand {
  argv: Vec<String>,
  cwd: PathBuf,
  env: Vec<(String, String)>,
  stdin: Option<PathBuf>,
  stdout: PathBuf,
  stderr: PathBuf,
  limits: Option<ResourceLimits>,
  timeout: Duration,
}

/// Captured result of a step that finished before its deadline
#[derive(Debug, Clone)]
pub struct StepOutput {
  status: Option<i32>,
  signal: Option<Signal>,
  stdout: String,
  stderr: String,
  elapsed: Duration,
  cpu_time: Duration,
  cpu_exceeded: bool,
  memory: Option<u64>,
}

/// Everything the child needs, converted before fork
struct PreparedStep {
  program: CString,
  args: Vec<CString>,
  env: Vec<CString>,
  stdin: CString,
  stdout: CString,
  stderr: CString,
}

impl StepCommand {
  pub fn new<OP: Into<PathBuf>, EP: Into<PathBuf>>(argv: Vec<String>, stdout: OP, stderr: EP) -> Self {
    StepCommand {
      argv,
      cwd: PathBuf::from("/"),
      env: vec![],
      stdin: None,
      stdout: stdout.into(),
      stderr: stderr.into(),
      limits: None,
      timeout: Duration::from_secs(5),
    }
  }

  /// Set stdin redirection, `/dev/null` otherwise
  pub fn stdin<P: Into<PathBuf>>(mut self, path: P) -> Self {
    self.stdin = Some(path.into());
    self
  }

  pub fn cwd<P: Into<PathBuf>>(mut self, path: P) -> Self {
    self.cwd = path.into();
    self
  }

  pub fn env(mut self, env: Vec<(String, String)>) -> Self {
    self.env = env;
    self
  }

  /// Set rlimits applied in the child, or none
  pub fn limits(mut self, limits: Option<ResourceLimits>) -> Self {
    self.limits = limits;
    self
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn argv(&self) -> &[String] {
    &self.argv
  }

  fn prepare(&self) -> Result<PreparedStep, CatRunError> {
    let program = self
      .argv
      .first()
      .ok_or_else(|| CatRunError::exec("Empty command"))?;
    let args = self
      .argv
      .iter()
      .map(into_c_string)
      .collect::<Result<Vec<CString>, CatRunError>>()?;
    // 只传递显式给出的环境变量
    let env = self
      .env
      .iter()
      .map(|(key, value)| into_c_string(format!("{}={}", key, value)))
      .collect::<Result<Vec<CString>, CatRunError>>()?;
    let stdin = match &self.stdin {
      Some(path) => path_c_string(path)?,
      None => into_c_string("/dev/null")?,
    };

    Ok(PreparedStep {
      program: into_c_string(program)?,
      args,
      env,
      stdin,
      stdout: path_c_string(&self.stdout)?,
      stderr: path_c_string(&self.stderr)?,
    })
  }
}

impl StepOutput {
  #[cfg(test)]
  pub(crate) fn fake(status: Option<i32>, signal: Option<Signal>, stdout: &str, stderr: &str) -> Self {
    StepOutput {
      status,
      signal,
      stdout: stdout.to_string(),
      stderr: stderr.to_string(),
      elapsed: Duration::from_millis(12),
      cpu_time: Duration::from_millis(10),
      cpu_exceeded: signal == Some(Signal::SIGXCPU),
      memory: Some(1 << 20),
    }
  }

  #[cfg(test)]
  pub(crate) fn fake_cpu_exceeded(mut self) -> Self {
    self.cpu_exceeded = true;
    self
  }

  pub fn status(&self) -> Option<i32> {
    self.status
  }

  pub fn signal(&self) -> Option<Signal> {
    self.signal
  }

  pub fn stdout(&self) -> &str {
    &self.stdout
  }

  pub fn stderr(&self) -> &str {
    &self.stderr
  }

  pub fn elapsed(&self) -> Duration {
    self.elapsed
  }

  /// User plus system CPU time
  pub fn cpu_time(&self) -> Duration {
    self.cpu_time
  }

  /// Killed for running past its CPU-time rlimit, by SIGXCPU or by the hard-limit SIGKILL
  pub fn cpu_exceeded(&self) -> bool {
    self.cpu_exceeded
  }

  /// Peak resident memory (unit: byte), absent when the platform did not report it
  pub fn memory(&self) -> Option<u64> {
    self.memory
  }

  pub fn success(&self) -> bool {
    self.status == Some(0) && self.signal.is_none()
  }
}

/// 重定向输入输出
fn redirect_io(step: &PreparedStep) -> Result<(), String> {
  let read = CString::new("r").map_err(|e| e.to_string())?;
  let write = CString::new("w").map_err(|e| e.to_string())?;
  unsafe {
    if freopen(step.stdin.as_ptr(), read.as_ptr(), stdin()).is_null() {
      return Err(format!("Redirect stdin fails: {}", Errno::last()));
    }
    if freopen(step.stdout.as_ptr(), write.as_ptr(), stdout()).is_null() {
      return Err(format!("Redirect stdout fails: {}", Errno::last()));
    }
    if freopen(step.stderr.as_ptr(), write.as_ptr(), stderr()).is_null() {
      return Err(format!("Redirect stderr fails: {}", Errno::last()));
    }
  }
  Ok(())
}

/// Runs in the forked child, returns only on failure
fn exec_child(
  step: &PreparedStep,
  cwd: &Path,
  limits: Option<&ResourceLimits>,
) -> Result<Infallible, String> {
  // 独立进程组，超时时整组 kill
  setpgid(Pid::from_raw(0), Pid::from_raw(0)).map_err(|e| format!("setpgid fails: {}", e))?;

  redirect_io(step)?;

  chdir(cwd).map_err(|e| format!("chdir fails: {}", e))?;

  if let Some(limits) = limits {
    apply_resource_limits(limits).map_err(|e| format!("setrlimit fails: {}", e))?;
  }

  execvpe(&step.program, &step.args, &step.env)
    .map_err(|e| format!("execvpe {} fails: {}", step.program.to_string_lossy(), e.desc()))
}

fn child_main(step: &PreparedStep, cwd: &Path, limits: Option<&ResourceLimits>, pipe: ExecWritePipe) -> ! {
  let message = match exec_child(step, cwd, limits) {
    Ok(never) => match never {},
    Err(message) => message,
  };
  let _ = pipe.write(message);
  drop(pipe);
  unsafe { libc::_exit(127) }
}

/// Kill the whole process group of the step, falling back to the child alone
fn kill_step(child: Pid) {
  if let Err(err) = killpg(child, Signal::SIGKILL) {
    debug!("killpg #{} fails: {}", child, err);
    if let Err(err) = kill(child, Signal::SIGKILL) {
      warn!("Kill child process #{} fails: {}", child, err);
    }
  }
}

fn timeval_duration(time: &libc::timeval) -> Duration {
  let secs = u64::try_from(time.tv_sec).unwrap_or(0);
  let micros = u32::try_from(time.tv_usec).unwrap_or(0);
  Duration::from_secs(secs) + Duration::from_micros(micros as u64)
}

fn cpu_time(usage: &libc::rusage) -> Duration {
  timeval_duration(&usage.ru_utime) + timeval_duration(&usage.ru_stime)
}

fn max_rss_bytes(usage: &libc::rusage) -> Option<u64> {
  let max_rss = u64::try_from(usage.ru_maxrss).ok()?;
  // macOS 单位是 byte，Linux 是 KB
  if cfg!(target_os = "macos") {
    Some(max_rss)
  } else {
    max_rss.checked_mul(1024)
  }
}

/// Reap the child, killing it once the deadline passes.
/// Returns the raw status, its resource usage and whether it was killed for time.
fn wait_with_deadline(child: Pid, deadline: Option<Instant>) -> Result<(c_int, libc::rusage, bool), CatRunError> {
  let mut timed_out = false;
  loop {
    let mut status: c_int = 0;
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let options = if timed_out { 0 } else { libc::WNOHANG };
    let ret = unsafe { libc::wait4(child.as_raw(), &mut status, options, &mut usage) };

    if ret == -1 {
      match Errno::last() {
        Errno::EINTR => continue,
        errno => return Err(errno.into()),
      }
    }
    if ret == child.as_raw() {
      return Ok((status, usage, timed_out));
    }

    if deadline.map_or(false, |d| Instant::now() >= d) {
      info!("Child process #{}. exceeds wall clock limit", child);
      kill_step(child);
      timed_out = true;
    } else {
      sleep(POLL_INTERVAL);
    }
  }
}

fn read_output(path: &Path) -> Result<String, CatRunError> {
  match fs::read(path) {
    Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
    Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
    Err(err) => Err(err.into()),
  }
}

/// Spawn one step and wait for it under its wall-clock ceiling.
///
/// Fails with [`CatRunError::Timeout`] when the deadline passes (the step's process group is
/// killed first), and with [`CatRunError::Exec`] when the child could not start its program.
pub fn run_step(command: &StepCommand) -> Result<StepOutput, CatRunError> {
  let step = command.prepare()?;
  let pipe = ExecPipe::new()?;

  info!("Start running {}", command.argv.join(" "));

  match unsafe { fork() } {
    Ok(ForkResult::Parent { child, .. }) => {
      let pipe = pipe.read()?;
      let start = Instant::now();
      // 父进程也设置一次，避免子进程尚未 setpgid 时无法整组 kill
      let _ = setpgid(child, child);

      let (status, usage, timed_out) = wait_with_deadline(child, start.checked_add(command.timeout))?;
      let elapsed = start.elapsed();
      let message = pipe.read()?;

      if timed_out {
        return Err(CatRunError::Timeout(command.timeout));
      }
      if !message.is_empty() {
        return Err(CatRunError::exec(message));
      }

      let (status, signal) = match WaitStatus::from_raw(child, status)? {
        WaitStatus::Exited(pid, status) => {
          info!("Child process #{}. exited with status {}", pid, status);
          (Some(status), None)
        }
        WaitStatus::Signaled(pid, signal, _) => {
          info!("Child process #{}. is signaled by {}", pid, signal);
          (None, Some(signal))
        }
        other => {
          return Err(CatRunError::fork(format!("Unexpected wait status {:?}", other)));
        }
      };

      let memory = max_rss_bytes(&usage);
      let cpu_time = cpu_time(&usage);
      // 忽略 SIGXCPU 的程序会在 hard limit 处被 SIGKILL
      let cpu_exceeded = match (signal, command.limits.as_ref()) {
        (Some(Signal::SIGXCPU), _) => true,
        (Some(Signal::SIGKILL), Some(limits)) => cpu_time >= Duration::from_secs(limits.cpu_seconds.max(1)),
        _ => false,
      };
      debug!(
        "Child process #{}. elapsed {:?}, cpu {:?}, max rss {:?}",
        child, elapsed, cpu_time, memory
      );

      Ok(StepOutput {
        status,
        signal,
        stdout: read_output(&command.stdout)?,
        stderr: read_output(&command.stderr)?,
        elapsed,
        cpu_time,
        cpu_exceeded,
        memory,
      })
    }
    Ok(ForkResult::Child) => {
      let pipe = match pipe.write() {
        Ok(pipe) => pipe,
        Err(_) => unsafe { libc::_exit(127) },
      };
      child_main(&step, &command.cwd, command.limits.as_ref(), pipe)
    }
    Err(err) => Err(CatRunError::fork(format!("Fork failed: {}", err))),
  }
}
