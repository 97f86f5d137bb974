use std::env;
use std::fs;
use std::io::{stdin, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use flexi_logger::{Duplicate, FileSpec, Logger};
use log::info;
use serde_json::Value;

use catrun::preset::resolve;
use catrun::{
  default_format, handle, judge, judge::parse_cases, CatRunError, CatRunExit, ExecutionRequest,
  Language, Report, Sandbox, WireRequest, WireResponse,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[arg(short, long, help = "Wall-clock limit (unit: second)")]
  time: Option<f64>,

  #[arg(short, long, help = "CPU time limit (unit: second)")]
  cpu: Option<u64>,

  #[arg(short, long, help = "Memory limit (unit: byte)")]
  memory: Option<u64>,

  #[arg(long, help = "Wall-clock limit of compile steps (unit: second)")]
  compile_time: Option<f64>,

  #[arg(long, help = "Scratch directory")]
  tmp_dir: Option<PathBuf>,

  #[arg(short, long, help = "Pass environment variables (KEY=VALUE or KEY)")]
  env: Vec<String>,

  #[arg(long, default_value_t = false)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
  #[command(about = "Run a source file")]
  Run {
    #[arg(help = "Source file")]
    source: PathBuf,

    #[arg(short, long, help = "Language, detected from the file extension by default")]
    language: Option<String>,

    #[arg(short, long, help = "File fed to stdin")]
    input: Option<PathBuf>,

    #[arg(short, long, help = "Call arguments as a JSON array")]
    args: Option<String>,

    #[arg(long, help = "Function to call")]
    entry: Option<String>,
  },

  #[command(about = "Serve one JSON request from stdin")]
  Request,

  #[command(about = "Judge a function against test cases")]
  Judge {
    #[arg(help = "Source file")]
    source: PathBuf,

    #[arg(long, help = "JSON array of {arguments, expected}")]
    cases: PathBuf,

    #[arg(short, long, help = "Language, detected from the file extension by default")]
    language: Option<String>,

    #[arg(long, help = "Function to call")]
    entry: Option<String>,
  },

  #[command(about = "List supported languages")]
  Languages,
}

fn read_file(path: &Path) -> Result<String, CatRunError> {
  fs::read_to_string(path)
    .map_err(|err| CatRunError::Fs(format!("Fail reading {}: {}", path.display(), err)))
}

fn resolve_language(language: Option<String>, source: &Path) -> Result<Language, CatRunError> {
  match language {
    Some(name) => name.parse(),
    None => source
      .file_name()
      .and_then(|name| name.to_str())
      .and_then(Language::detect)
      .ok_or_else(|| CatRunError::cli("Can not detect language, please use --language")),
  }
}

impl Cli {
  fn sandbox(&self) -> Result<Sandbox, CatRunError> {
    let mut builder = Sandbox::builder()
      .set_default_time_limit(self.time)
      .set_default_cpu_limit(self.cpu)
      .set_default_memory_limit(self.memory)
      .set_compile_time_limit(self.compile_time)
      .parse_env_list(self.env.clone())?;
    if let Some(root) = &self.tmp_dir {
      builder = builder.workspace_root(root);
    }
    builder.build()
  }

  fn start(self) -> Result<(), CatRunError> {
    let sandbox = self.sandbox()?;

    match self.command {
      Commands::Run {
        source,
        language,
        input,
        args,
        entry,
      } => {
        let language = resolve_language(language, &source)?;
        let mut request = ExecutionRequest::new(language, read_file(&source)?).set_entry(entry);
        if let Some(input) = input {
          request = request.stdin(read_file(&input)?);
        }
        if let Some(args) = args {
          request = request.call_arguments(serde_json::from_str::<Vec<Value>>(&args)?);
        }

        info!("Start running {}", source.display());
        let result = sandbox.execute(&request);
        WireResponse::from(&result).report();
      }
      Commands::Request => {
        let mut body = String::new();
        stdin().read_to_string(&mut body)?;
        let request: WireRequest = serde_json::from_str(&body)?;
        handle(&sandbox, &request).report_json();
      }
      Commands::Judge {
        source,
        cases,
        language,
        entry,
      } => {
        let language = resolve_language(language, &source)?;
        let code = read_file(&source)?;
        let cases = parse_cases(&read_file(&cases)?)?;

        info!("Start judging {} with {} cases", source.display(), cases.len());
        judge(&sandbox, language, &code, entry.as_deref(), &cases).report();
      }
      Commands::Languages => {
        for language in Language::all() {
          let toolchain = resolve(language);
          let mut steps = toolchain
            .compile_commands()
            .iter()
            .map(|c| format!("{} {}", c.program(), c.arguments().join(" ")))
            .collect::<Vec<String>>();
          let run = toolchain.execute_command();
          steps.push(format!("{} {}", run.program(), run.arguments().join(" ")));
          println!("{:<12}{}", language.name(), steps.join("  &&  "));
        }
      }
    }

    Ok(())
  }
}

fn main() -> CatRunExit {
  let cli = Cli::parse();

  let spec = if cli.verbose { "catrun=debug" } else { "catrun=info" };
  let logger = Logger::try_with_str(spec).and_then(|logger| {
    logger
      .log_to_file(
        FileSpec::default()
          .directory(env::var("LOG_DIR").unwrap_or("./logs/".into()))
          .basename("catrun")
          .discriminant(format!("{}", chrono::offset::Local::now().format("%Y-%m-%d")))
          .suppress_timestamp(),
      )
      .append()
      .duplicate_to_stderr(Duplicate::Warn)
      .format_for_files(default_format)
      .start()
  });
  let _logger = match logger {
    Ok(handle) => handle,
    Err(err) => return CatRunExit::Err(err.into()),
  };

  info!("Start catrun");
  match cli.start() {
    Ok(_) => {
      info!("Catrun finished");
      CatRunExit::Ok
    }
    Err(err) => CatRunExit::Err(err),
  }
}
