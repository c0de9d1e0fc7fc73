use serde::Serialize;
use std::fmt;

/// One step of the request pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ValidateParams,
    Authenticate,
    ResolveMembership,
    CheckRole,
    ValidateBodyAndQuery,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidateParams => "validate_params",
            Self::Authenticate => "authenticate",
            Self::ResolveMembership => "resolve_membership",
            Self::CheckRole => "check_role",
            Self::ValidateBodyAndQuery => "validate_body_and_query",
        }
    }

    /// State reached once this stage succeeds.
    pub fn completes(&self) -> PipelineState {
        match self {
            Self::ValidateParams => PipelineState::ParamsValidated,
            Self::Authenticate => PipelineState::Authenticated,
            Self::ResolveMembership => PipelineState::MembershipResolved,
            Self::CheckRole => PipelineState::RoleChecked,
            Self::ValidateBodyAndQuery => PipelineState::BodyQueryValidated,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a request stands in the pipeline.
///
/// States only move forward. `Failed` is terminal and reachable from any
/// state before `Dispatched`; a [`PipelineFailure`](super::PipelineFailure)
/// reports it along with the state reached before the failing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Start,
    ParamsValidated,
    Authenticated,
    MembershipResolved,
    RoleChecked,
    BodyQueryValidated,
    Dispatched,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Dispatched | Self::Failed)
    }
}
