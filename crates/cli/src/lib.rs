pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::commands::select::SelectArgs;

#[derive(Debug, Parser)]
#[command(
    name = "shelfpick",
    about = "Shelfpick catalog widget CLI",
    long_about = "Prepare the catalog database, inspect configuration, and run widget product selections.",
    after_help = "Examples:\n  shelfpick migrate\n  shelfpick seed\n  shelfpick select bestseller --period current_month\n  shelfpick select 10 --category --limit 4\n  shelfpick select related --product 1"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo catalog and verify every seeded table")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Select products for a widget configuration and print them as JSON")]
    Select(SelectArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Select(args) => commands::select::run(args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn select_arguments_parse_from_the_command_line() {
        let cli = Cli::try_parse_from([
            "shelfpick",
            "select",
            "bestseller",
            "--period",
            "current_month",
            "--limit",
            "4",
            "--at",
            "2026-10-18 15:45:00",
        ])
        .expect("parse");

        let Command::Select(args) = cli.command else {
            panic!("expected select command");
        };
        assert_eq!(args.value, "bestseller");
        assert_eq!(args.period.as_deref(), Some("current_month"));
        assert_eq!(args.limit.as_deref(), Some("4"));
        assert!(!args.category);
    }

    #[test]
    fn select_requires_a_value() {
        assert!(Cli::try_parse_from(["shelfpick", "select"]).is_err());
    }
}
