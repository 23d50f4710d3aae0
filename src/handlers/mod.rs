pub mod health_handlers;
pub mod session_handlers;
pub mod signaling_handlers;
