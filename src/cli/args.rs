//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use clap::{Parser, Subcommand};

/// Voluntalia - volunteer management API
#[derive(Parser, Debug)]
#[command(name = "voluntalia")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Run database migrations
    Migrate(MigrateArgs),

    /// Manage the e-mail job queue
    Jobs(JobsArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Host to bind to (overrides SERVER_HOST)
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on (overrides SERVER_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Skip pending migrations at startup
    #[arg(long)]
    pub no_migrate: bool,
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Drop everything and re-run all migrations
    Fresh,
}

/// Arguments for the jobs command
#[derive(Parser, Debug)]
pub struct JobsArgs {
    #[command(subcommand)]
    pub action: JobsAction,
}

/// Job management actions
#[derive(Subcommand, Debug)]
pub enum JobsAction {
    /// Deliver queued e-mails
    Work,
    /// Show queue counts by status
    List,
    /// Remove failed e-mail jobs
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_flags_are_optional_overrides() {
        let cli = Cli::try_parse_from(["voluntalia", "serve"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, None);
                assert!(!args.no_migrate);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::try_parse_from(["voluntalia", "serve", "-p", "8080", "--no-migrate"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(8080));
                assert!(args.no_migrate);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn migrate_requires_an_action() {
        assert!(Cli::try_parse_from(["voluntalia", "migrate"]).is_err());
        assert!(Cli::try_parse_from(["voluntalia", "migrate", "status"]).is_ok());
    }
}
