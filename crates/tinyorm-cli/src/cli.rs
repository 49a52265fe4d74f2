use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};
use tinyorm::Aggregate;

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl From<AggregateFn> for Aggregate {
    fn from(value: AggregateFn) -> Self {
        match value {
            AggregateFn::Count => Aggregate::Count,
            AggregateFn::Sum => Aggregate::Sum,
            AggregateFn::Avg => Aggregate::Avg,
            AggregateFn::Max => Aggregate::Max,
            AggregateFn::Min => Aggregate::Min,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the CREATE TABLE statements of the declared tables
    Schema {
        /// Only print this table
        #[arg(required = false)]
        table: Option<String>,
    },

    /// Create every declared table
    Init,

    /// Select rows
    #[command(arg_required_else_help = true)]
    Select {
        /// Table to query
        #[arg(required = true)]
        table: String,

        /// Filters as `column[__op]=value`
        #[arg(required = false, value_name = "FILTER")]
        filters: Vec<String>,
    },

    /// Insert one row
    #[command(arg_required_else_help = true)]
    Insert {
        /// Table to insert into
        #[arg(required = true)]
        table: String,

        /// Values as `column=value`; omitted columns take their default
        #[arg(required = false, value_name = "FIELD=VALUE")]
        values: Vec<String>,
    },

    /// Update matching rows
    #[command(arg_required_else_help = true)]
    Update {
        /// Table to update
        #[arg(required = true)]
        table: String,

        /// New values as `column=value`
        #[arg(long = "set", required = true, value_name = "FIELD=VALUE")]
        set: Vec<String>,

        /// Filters as `column[__op]=value`
        #[arg(required = false, value_name = "FILTER")]
        filters: Vec<String>,
    },

    /// Delete matching rows
    #[command(arg_required_else_help = true)]
    Delete {
        /// Table to delete from
        #[arg(required = true)]
        table: String,

        /// Filters as `column[__op]=value`
        #[arg(required = false, value_name = "FILTER")]
        filters: Vec<String>,
    },

    /// Compute an aggregate over matching rows
    #[command(arg_required_else_help = true)]
    Aggregate {
        /// Aggregate function
        #[arg(required = true, value_enum)]
        function: AggregateFn,

        /// Table to query
        #[arg(required = true)]
        table: String,

        /// Column to aggregate; all rows when omitted
        #[arg(short = 'C', long)]
        column: Option<String>,

        /// Filters as `column[__op]=value`
        #[arg(required = false, value_name = "FILTER")]
        filters: Vec<String>,
    },
}
