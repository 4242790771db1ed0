use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostics::DiagnosticCode;

/// Fatal failures that abort a patch run. Everything recoverable is reported
/// through the session's diagnostics instead.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("failed to enumerate candidate assemblies in {}: {source}", .path.display())]
    CandidateScan {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("module invariant broken after patching: {0}")]
    ModuleInvariantBroken(String),
}

/// Failure while patching a single plug member. The orchestrator records the
/// matching diagnostic and moves on to the next member.
#[derive(Debug, Error)]
pub enum MemberError {
    #[error("plug method has no body")]
    MissingPlugBody,
    #[error("branch target {0} does not resolve inside the cloned body")]
    DanglingBranch(u32),
    #[error("exception region position {0} does not resolve inside the cloned body")]
    DanglingRegion(u32),
    #[error("plug and target properties must both declare a getter and a setter")]
    IncompleteProperty,
    #[error("no field load found in the property getter")]
    MissingBackingField,
}

impl MemberError {
    pub fn code(&self) -> DiagnosticCode {
        match self {
            MemberError::MissingPlugBody
            | MemberError::DanglingBranch(_)
            | MemberError::DanglingRegion(_) => DiagnosticCode::CloneFailure,
            MemberError::IncompleteProperty | MemberError::MissingBackingField => {
                DiagnosticCode::TargetMemberMissing
            }
        }
    }
}
