//! The single authoritative session state, mutated only through a closed set
//! of named transitions.
//!
//! The store is injectable: every operation takes it by `&mut` instead of
//! reaching for ambient globals. It performs no concurrency enforcement of
//! its own; `locked` is an advisory single-flight guard the caller must gate
//! on before starting a new operation.

use crate::errors::ErrorInfo;
use crate::snap::SnapMetadata;
use serde::Serialize;

/// Connection/lock state shared by all user-triggered operations.
///
/// `error` and `success` reflect the last completed operation; a new
/// operation does not clear them until it itself completes. Both persist
/// until explicitly overwritten; chronological staleness between the two is
/// the presentation layer's concern.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub is_capable_wallet: bool,
    pub installed_snap: Option<SnapMetadata>,
    pub locked: bool,
    pub error: Option<ErrorInfo>,
    pub success: Option<String>,
}

/// The closed transition set. No other mutation path exists.
#[derive(Debug, Clone)]
pub enum Transition {
    SetLocked(bool),
    SetError(ErrorInfo),
    SetSuccess(String),
    SetCapability(bool),
    SetInstalled(Option<SnapMetadata>),
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, t: Transition) {
        match t {
            Transition::SetLocked(v) => self.locked = v,
            Transition::SetError(e) => self.error = Some(e),
            Transition::SetSuccess(msg) => self.success = Some(msg),
            Transition::SetCapability(v) => self.is_capable_wallet = v,
            Transition::SetInstalled(snap) => self.installed_snap = snap,
        }
    }
}
