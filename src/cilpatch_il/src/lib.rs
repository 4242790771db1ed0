pub mod errors;
pub mod probe;
pub mod provider;

pub use errors::{IlError, Result};
pub use probe::probe_type_names;
pub use provider::{AssemblyIo, JsonAssemblyIo};
