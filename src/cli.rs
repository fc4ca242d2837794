use crate::core::Language;
use crate::io::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "context-extractor")]
#[command(
    about = "Extract the types and headers relevant to a program hole",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract relevant types and headers for the hole in a sketch file
    Extract {
        /// Sketch file containing the hole
        sketch: PathBuf,

        /// Repository root scanned for headers (defaults to the sketch's directory)
        #[arg(long)]
        repo: Option<PathBuf>,

        /// Source language (defaults to config, then the sketch extension)
        #[arg(short, long, value_enum)]
        language: Option<Language>,

        /// Language server command line, overriding the configured one
        #[arg(long, env = "CONTEXT_EXTRACTOR_SERVER")]
        server: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,
    },
}

impl Commands {
    /// Default log filter for a `-v` count.
    pub fn log_level(&self) -> &'static str {
        let Commands::Extract { verbosity, .. } = self;
        match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from([
            "context-extractor",
            "extract",
            "todo/sketch.ts",
            "--language",
            "typescript",
            "--format",
            "text",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.command.log_level(), "debug");
        let Commands::Extract {
            sketch,
            repo,
            language,
            format,
            ..
        } = cli.command;
        assert_eq!(sketch, PathBuf::from("todo/sketch.ts"));
        assert_eq!(repo, None);
        assert_eq!(language, Some(Language::TypeScript));
        assert!(matches!(format, OutputFormat::Text));
    }

    #[test]
    fn test_rejects_unknown_language() {
        assert!(Cli::try_parse_from(["context-extractor", "extract", "a.ts", "-l", "cobol"]).is_err());
    }
}
