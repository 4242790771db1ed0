use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticCode;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// One recoverable event recorded during a patch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: DiagnosticSeverity,
    pub message: String,
    /// Full name of the plug type or member involved, when known.
    pub plug: Option<String>,
    /// Full name of the target type or member involved, when known.
    pub target: Option<String>,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, message: String) -> Diagnostic {
        Diagnostic {
            code,
            severity: DiagnosticSeverity::Error,
            message,
            plug: None,
            target: None,
        }
    }

    pub fn warning(code: DiagnosticCode, message: String) -> Diagnostic {
        Diagnostic {
            code,
            severity: DiagnosticSeverity::Warning,
            message,
            plug: None,
            target: None,
        }
    }

    pub fn with_plug(mut self, plug: String) -> Diagnostic {
        self.plug = Some(plug);
        self
    }

    pub fn with_target(mut self, target: String) -> Diagnostic {
        self.target = Some(target);
        self
    }
}
