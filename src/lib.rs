//! Authentication/profile synchronization and route gating.
//!
//! ARCHITECTURE
//! ============
//! Identity-provider events flow through a single pipeline:
//!
//! ```text
//! IdentityProvider event -> SessionStore transition (generation bump)
//!     -> ProfileResolver fetch-or-create -> CombinedState commit
//!     -> Gate::decide -> render / redirect / wait
//! ```
//!
//! `AuthContext` is constructed once at the application root and handed to
//! consumers by reference. Nothing in this crate lives in ambient global state.

pub mod config;
pub mod db;
pub mod gate;
pub mod identity;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use gate::{Gate, GateStage, RouteDecision};
pub use services::auth::{AuthContext, AuthError};
pub use session::{Generation, Session, SessionStore};
pub use state::{CombinedState, Profile, ProfileUpdate};

/// Lock a std mutex, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
