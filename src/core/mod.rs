// Core module - client sessions
pub mod session;
