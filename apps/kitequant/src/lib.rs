pub mod commands;
pub mod infra;
pub mod obs;
pub mod output;
