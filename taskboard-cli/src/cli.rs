//! Command-line argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Taskboard - keep a task board in sync with its server
#[derive(Parser, Debug)]
#[command(name = "taskboard", version, about, long_about = None)]
pub struct Cli {
    /// Config file (TOML, YAML or JSON); defaults to ./taskboard.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Owner whose board is loaded; overrides `owner_id` from config
    #[arg(long, global = true, value_name = "ID")]
    pub owner: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log applied operations
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log everything, including request phases
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Board(BoardCommand),

    /// Start an interactive session (adds undo, refresh and activity)
    Shell,
}

/// Commands available both from the command line and inside the shell
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum BoardCommand {
    /// List tasks
    Tasks {
        /// Only tasks in this column
        #[arg(long)]
        column: Option<String>,
    },

    /// Show one task, fetched fresh from the server
    Show { id: String },

    /// Create a task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Column id; the first column when omitted
        #[arg(long)]
        status: Option<String>,
        /// Due date, e.g. 2025-07-01 or "2025-07-01 17:00"
        #[arg(long)]
        due: Option<String>,
    },

    /// Change fields of a task
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        due: Option<String>,
    },

    /// Move a task to another column
    Move { id: String, column: String },

    /// Delete a task
    Delete { id: String },

    /// List columns with task counts
    Columns,

    /// Add or remove a column
    Column {
        #[command(subcommand)]
        action: ColumnCommand,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ColumnCommand {
    /// Append a column
    Add { title: String },
    /// Remove a column, moving its tasks to the first column
    Remove { id: String },
}

/// One line typed into the interactive shell
#[derive(Parser, Debug)]
#[command(multicall = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ShellCommand {
    #[command(flatten)]
    Board(BoardCommand),

    /// Undo the most recent column removal
    Undo,

    /// Reload tasks from the server
    Refresh,

    /// Show recent operations
    Activity {
        /// Number of entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_with_globals() {
        let cli = Cli::try_parse_from([
            "taskboard",
            "--owner",
            "42",
            "add",
            "Ship it",
            "--status",
            "Done",
            "--due",
            "2025-07-01",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.owner.as_deref(), Some("42"));
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Board(BoardCommand::Add { ref title, ref status, .. })
                if title == "Ship it" && status.as_deref() == Some("Done")
        ));
    }

    #[test]
    fn test_parse_column_remove() {
        let cli = Cli::try_parse_from(["taskboard", "column", "remove", "Needs Review"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Board(BoardCommand::Column {
                action: ColumnCommand::Remove { ref id }
            }) if id == "Needs Review"
        ));
    }

    #[test]
    fn test_log_flags() {
        let cli = Cli::try_parse_from(["taskboard", "-q", "columns"]).unwrap();
        assert!(cli.quiet);
        assert!(!cli.debug);
    }

    #[test]
    fn test_shell_only_commands_rejected_on_command_line() {
        assert!(Cli::try_parse_from(["taskboard", "undo"]).is_err());
    }

    #[test]
    fn test_shell_line_parsing() {
        let line = ShellLine::try_parse_from(["undo"]).unwrap();
        assert_eq!(line.command, ShellCommand::Undo);

        let line = ShellLine::try_parse_from(["exit"]).unwrap();
        assert_eq!(line.command, ShellCommand::Quit);

        let line = ShellLine::try_parse_from(["move", "3", "Done"]).unwrap();
        assert_eq!(
            line.command,
            ShellCommand::Board(BoardCommand::Move {
                id: "3".into(),
                column: "Done".into()
            })
        );
    }
}
