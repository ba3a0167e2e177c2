use clap::{Parser, Subcommand};

/// Command-line interface definition for rsanctions
/// CLI application to reconcile attendance into sanctions with SQLite
#[derive(Parser)]
#[command(
    name = "rsanctions",
    version = env!("CARGO_PKG_VERSION"),
    about = "Attendance sanction reconciliation: derive fines from check-in/check-out windows using SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Use this configuration file instead of the default one
    #[arg(global = true, long = "config-file", value_name = "FILE")]
    pub config_file: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view, check or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration file")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields and bad tariffs")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing configuration fields with default values")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Run one reconciliation pass
    Run {
        /// Target date (YYYY-MM-DD), defaults to today
        #[arg(long = "date", help = "Target date (YYYY-MM-DD), defaults to today")]
        date: Option<String>,

        /// Evaluation instant, defaults to the current local time
        #[arg(
            long = "now",
            help = "Evaluate deadlines as of this instant (YYYY-MM-DD HH:MM)"
        )]
        now: Option<String>,

        #[arg(long = "json", help = "Print the run summary as JSON")]
        json: bool,
    },

    /// Run a reconciliation pass for today at a fixed interval
    Schedule {
        #[arg(
            long = "interval",
            value_name = "SECS",
            help = "Seconds between ticks (default: schedule_interval_secs from config)"
        )]
        interval: Option<u64>,

        #[arg(long = "ticks", help = "Stop after this many ticks")]
        ticks: Option<u64>,
    },

    /// List or settle sanctions
    Sanctions {
        #[arg(long = "date", help = "Only sanctions for events on this date (YYYY-MM-DD)")]
        date: Option<String>,

        #[arg(long = "event", help = "Only sanctions for this event id")]
        event: Option<i64>,

        #[arg(long = "member", help = "Only sanctions for this member id")]
        member: Option<i64>,

        #[arg(long = "status", help = "Only sanctions with this status (unpaid, paid, excused)")]
        status: Option<String>,

        #[arg(
            long = "pay",
            value_name = "ID",
            conflicts_with = "excuse",
            help = "Record payment of an unpaid sanction"
        )]
        pay: Option<i64>,

        #[arg(
            long = "at",
            requires = "pay",
            help = "Payment timestamp (YYYY-MM-DD HH:MM), defaults to now"
        )]
        at: Option<String>,

        #[arg(long = "excuse", value_name = "ID", help = "Excuse an unpaid sanction")]
        excuse: Option<i64>,
    },

    /// List or close attendance events
    Events {
        #[arg(long = "date", help = "Date to list (YYYY-MM-DD), defaults to today")]
        date: Option<String>,

        #[arg(long = "close", value_name = "ID", help = "Close an active event")]
        close: Option<i64>,
    },
}
