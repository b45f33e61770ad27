//! The error taxonomy shared by every component.
//!
//! Errors are split along the recoverability axis described in the design:
//! a bad pair or a bad object should not bring a whole query down, an
//! invalid invariant should cancel the in-flight query, and an I/O or
//! communication failure should bring down the calling operation entirely.
//! [`Severity`] is how callers decide which of the three responses to take
//! without having to match on every [`EngineError`] variant.

use thiserror::Error;

/// The fine-grained error kinds, named after the original taxonomy in §7.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("disk read failed: {0}")]
    DiskRead(String),

    #[error("disk write failed: {0}")]
    DiskWrite(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid query type: {0}")]
    InvalidQueryType(String),

    #[error("APRIL synthesis failed for object {rec_id}: {reason}")]
    AprilCreate { rec_id: u64, reason: String },

    #[error("APRIL filter produced an unexpected result: {0}")]
    AprilUnexpectedResult(String),

    #[error("communication failure: {0}")]
    CommFailure(String),

    #[error("communication timed out: {0}")]
    CommTimeout(String),

    #[error("allocation failed: {0}")]
    MallocFailed(String),

    #[error("feature unsupported: {0}")]
    FeatureUnsupported(String),
}

/// Where a failure sits on the recoverability axis (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Per-pair / per-object: skip the pair, bump a counter, keep going.
    Recoverable,
    /// Per-query: cancel the enclosing parallel region, return non-OK.
    ThreadFatal,
    /// Whole-process: no partial result is ever reported as success.
    ProcessFatal,
}

impl EngineError {
    pub fn severity(&self) -> Severity {
        match self {
            EngineError::InvalidGeometry(_) | EngineError::AprilCreate { .. } => {
                Severity::Recoverable
            }
            EngineError::InvalidParameter(_)
            | EngineError::InvalidQueryType(_)
            | EngineError::AprilUnexpectedResult(_) => Severity::ThreadFatal,
            EngineError::DiskRead(_)
            | EngineError::DiskWrite(_)
            | EngineError::CommFailure(_)
            | EngineError::CommTimeout(_)
            | EngineError::MallocFailed(_) => Severity::ProcessFatal,
            EngineError::FeatureUnsupported(_) => Severity::ThreadFatal,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.severity() == Severity::Recoverable
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
