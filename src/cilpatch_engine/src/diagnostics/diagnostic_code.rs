use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable codes for everything the engine reports without failing
/// the run.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    TargetTypeMissing,
    TargetMemberMissing,
    AmbiguousTargetName,
    CloneFailure,
    InvalidConstructorShape,
    ModuleInvariantBroken,
    SelfReferenceLeft,
    ParameterOutOfRange,
    InitializerShapeSkipped,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::TargetTypeMissing => "CP0001",
            DiagnosticCode::TargetMemberMissing => "CP0002",
            DiagnosticCode::AmbiguousTargetName => "CP0003",
            DiagnosticCode::CloneFailure => "CP0004",
            DiagnosticCode::InvalidConstructorShape => "CP0005",
            DiagnosticCode::ModuleInvariantBroken => "CP0006",
            DiagnosticCode::SelfReferenceLeft => "CP0007",
            DiagnosticCode::ParameterOutOfRange => "CP0008",
            DiagnosticCode::InitializerShapeSkipped => "CP0009",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
