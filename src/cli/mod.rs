mod cli;

pub use cli::{Cli, Command, ComparedInputs, HistoryCommand};
