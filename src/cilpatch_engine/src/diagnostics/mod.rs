pub mod diagnostic;
pub mod diagnostic_code;
pub mod diagnostic_collection;

pub use diagnostic::{Diagnostic, DiagnosticSeverity};
pub use diagnostic_code::DiagnosticCode;
pub use diagnostic_collection::DiagnosticCollection;
