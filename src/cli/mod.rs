//! CLI module for Kurs.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Kurs - Questions and answers over course material
///
/// Loads course documents into a searchable index and answers questions
/// about them with a tool-calling language model.
#[derive(Parser, Debug)]
#[command(name = "kurs")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a single question about the loaded courses
    Ask {
        /// The question to ask
        question: String,

        /// Maximum number of tool rounds
        #[arg(short = 'r', long)]
        max_rounds: Option<usize>,
    },

    /// Start an interactive chat session
    Chat,

    /// Load course documents from a file or folder
    Load {
        /// Course document, or folder of .txt/.md documents
        path: String,

        /// Clear the index before loading
        #[arg(long)]
        clear: bool,
    },

    /// List indexed courses
    Courses,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Folder of course documents to load at startup
        #[arg(long)]
        docs: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration file if none exists
    Init,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["kurs", "-vv", "ask", "What is MCP?", "--max-rounds", "3"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask { question, max_rounds } => {
                assert_eq!(question, "What is MCP?");
                assert_eq!(max_rounds, Some(3));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_and_load() {
        let cli = Cli::try_parse_from(["kurs", "serve", "--port", "9000", "--docs", "./docs"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve { host: None, port: Some(9000), docs: Some(_) }
        ));

        let cli = Cli::try_parse_from(["kurs", "load", "docs", "--clear"]).unwrap();
        assert!(matches!(cli.command, Commands::Load { clear: true, .. }));
    }
}
