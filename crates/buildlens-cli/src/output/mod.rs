pub mod compile_commands;
pub mod report;
