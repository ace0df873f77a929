//! Route gating — pure mapping from `CombinedState` to a `RouteDecision`.
//!
//! SYSTEM CONTEXT
//! ==============
//! Layout wrappers in the presentation layer call `Gate::decide` and either
//! render their children, redirect, or show a wait indicator. There is no
//! timer anywhere in here: the decision only changes when a new snapshot is
//! committed.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::state::CombinedState;

pub const AUTH_PATH: &str = "/auth";
pub const ONBOARDING_PATH: &str = "/onboarding";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// What the presentation layer should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "path", rename_all = "snake_case")]
pub enum RouteDecision {
    Loading,
    Redirect(&'static str),
    Render,
}

/// Where a settled state sits in the auth lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStage {
    Unauthenticated,
    /// Signed in, but no profile is available.
    SessionOnly,
    ProfileIncomplete,
    Ready,
}

impl GateStage {
    /// Classify a state, or `None` while it is still loading.
    #[must_use]
    pub fn classify(state: &CombinedState) -> Option<Self> {
        if state.is_loading() {
            return None;
        }
        let stage = match (&state.session, &state.profile) {
            (None, _) => Self::Unauthenticated,
            (Some(_), None) => Self::SessionOnly,
            (Some(_), Some(profile)) if profile.profile_completed => Self::Ready,
            (Some(_), Some(_)) => Self::ProfileIncomplete,
        };
        Some(stage)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown gate: {0}")]
pub struct UnknownGate(pub String);

/// Which surface is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// Main application pages; require a completed profile.
    Protected,
    /// Sign-in / sign-up pages; signed-in users are sent to the dashboard.
    Entry,
    /// The onboarding form; only for signed-in users who have not finished it.
    Onboarding,
}

impl Gate {
    #[must_use]
    pub fn decide(self, state: &CombinedState) -> RouteDecision {
        let Some(stage) = GateStage::classify(state) else {
            return RouteDecision::Loading;
        };
        match (self, stage) {
            (Self::Protected | Self::Onboarding, GateStage::Unauthenticated) => RouteDecision::Redirect(AUTH_PATH),
            (Self::Protected, GateStage::SessionOnly | GateStage::ProfileIncomplete) => {
                RouteDecision::Redirect(ONBOARDING_PATH)
            }
            (Self::Onboarding, GateStage::Ready) => RouteDecision::Redirect(DASHBOARD_PATH),
            (Self::Entry, GateStage::Unauthenticated) => RouteDecision::Render,
            (Self::Entry, _) => RouteDecision::Redirect(DASHBOARD_PATH),
            (Self::Protected, GateStage::Ready) | (Self::Onboarding, _) => RouteDecision::Render,
        }
    }
}

impl FromStr for Gate {
    type Err = UnknownGate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "protected" => Ok(Self::Protected),
            "entry" => Ok(Self::Entry),
            "onboarding" => Ok(Self::Onboarding),
            other => Err(UnknownGate(other.to_owned())),
        }
    }
}

/// `AccessGate` decision for protected pages.
#[must_use]
pub fn decide(state: &CombinedState) -> RouteDecision {
    Gate::Protected.decide(state)
}

/// `EntryGate` decision for the credential-entry pages.
#[must_use]
pub fn decide_entry(state: &CombinedState) -> RouteDecision {
    Gate::Entry.decide(state)
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
