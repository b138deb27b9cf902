pub mod commands;
pub mod notify;
