//! Shared application state handed to all handlers.

use crate::services::{
    session_service::SessionService, signaling_service::SignalingService,
    turn_service::TurnService, workflow_service::WorkflowClient,
};

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionService,
    pub signaling: SignalingService,
    pub turn: TurnService,
    pub workflow: WorkflowClient,
}
