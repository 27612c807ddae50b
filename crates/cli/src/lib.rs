pub mod commands;
pub mod host;
pub mod telemetry;
