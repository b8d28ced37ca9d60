//! Default contracts: the ambient policy for calls no specification decides
//!
//! An outcome table hands control to a default contract when it has no
//! specification-based opinion, and a postcondition checker delegates to
//! one after its own checks pass.

use crate::classification::BehaviorType;
use crate::config::OracleConfig;
use crate::outcome::{ExceptionKind, ExecutionOutcome};
use std::fmt;

/// Classifies an outcome without reference to any specification
pub trait DefaultContract: fmt::Debug {
    fn classify(&self, outcome: &ExecutionOutcome) -> BehaviorType;
}

/// Every outcome is expected
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl DefaultContract for AcceptAll {
    fn classify(&self, _outcome: &ExecutionOutcome) -> BehaviorType {
        BehaviorType::Expected
    }
}

/// Any escaped exception is an error
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectExceptions;

impl DefaultContract for RejectExceptions {
    fn classify(&self, outcome: &ExecutionOutcome) -> BehaviorType {
        match outcome {
            ExecutionOutcome::Returned(_) => BehaviorType::Expected,
            ExecutionOutcome::Threw(_) => BehaviorType::Error,
        }
    }
}

/// Configurable per-category exception policy
///
/// A normal return is expected. A thrown exception is looked up in order:
/// flaky list, then its [`ExceptionKind`].
#[derive(Debug, Clone, Default)]
pub struct ExceptionBehaviorContract {
    config: OracleConfig,
}

impl ExceptionBehaviorContract {
    pub fn new(config: OracleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }
}

impl DefaultContract for ExceptionBehaviorContract {
    fn classify(&self, outcome: &ExecutionOutcome) -> BehaviorType {
        let thrown = match outcome {
            ExecutionOutcome::Returned(_) => return BehaviorType::Expected,
            ExecutionOutcome::Threw(thrown) => thrown,
        };

        let exception_type = &thrown.exception_type;
        if self.config.is_flaky(&exception_type.name) {
            return BehaviorType::Invalid;
        }

        match exception_type.kind {
            ExceptionKind::OutOfMemory => self.config.oom_exception,
            ExceptionKind::StackOverflow => self.config.sof_exception,
            ExceptionKind::NullDereference if thrown.null_input => self.config.npe_on_null_input,
            ExceptionKind::NullDereference => self.config.npe_on_non_null_input,
            ExceptionKind::Checked => self.config.checked_exception,
            ExceptionKind::Unchecked => self.config.unchecked_exception,
        }
    }
}
