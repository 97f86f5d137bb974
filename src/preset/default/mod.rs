pub(crate) use c::C_PRESET;
pub(crate) use cpp::CPP_PRESET;
pub use java::JAVA_ENTRY_CLASS;
pub(crate) use java::JAVA_PRESET;
pub(crate) use javascript::JAVASCRIPT_PRESET;
pub(crate) use python::PYTHON_PRESET;

mod c;
mod cpp;
mod java;
mod javascript;
mod python;
