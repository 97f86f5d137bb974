pub use context::{ExecutionRequest, ExecutionResult, ReturnValue, Verdict};
pub use error::{CatRunError, CatRunExit};
pub use judge::{judge, JudgeReport, TestCase};
pub use language::Language;
pub use limits::ResourceLimits;
pub use sandbox::{Sandbox, SandboxBuilder};
pub use utils::default_format;
pub use wire::{handle, Report, WireRequest, WireResponse};

pub mod driver;
pub mod executor;
pub mod judge;
pub mod normalize;
pub mod preset;
pub mod wire;
pub mod workspace;

mod context;
mod error;
mod language;
mod limits;
mod pipe;
mod sandbox;
mod utils;
