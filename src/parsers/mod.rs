pub mod common;
pub mod python;

pub use python::PythonParser;
