pub mod analysis;
pub mod session_service;
pub mod signaling_service;
pub mod turn_service;
pub mod workflow_service;
