use clap::Parser;
use cli::{Args, Commands};
use commands::Context;
use error::CliResult;
use logging::setup_logging;
use tinyorm_config::Config;
use tracing::debug;
use utils::COLOR;

mod cli;
mod commands;
mod error;
mod logging;
mod utils;

fn handle_cli() -> CliResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        if let Ok(mut color) = COLOR.write() {
            *color = false;
        }
    }

    let config = Config::load(args.config.as_deref())?;
    let db = config.open()?;
    debug!("opened database at {}", config.database.path);

    let ctx = Context {
        tables: config.declare(&db)?,
        db,
        json: args.json,
    };

    match args.command {
        Commands::Schema { table } => commands::schema(&ctx, table.as_deref())?,
        Commands::Init => commands::init(&ctx)?,
        Commands::Select { table, filters } => commands::select(&ctx, &table, &filters)?,
        Commands::Insert { table, values } => commands::insert(&ctx, &table, &values)?,
        Commands::Update {
            table,
            set,
            filters,
        } => commands::update(&ctx, &table, &set, &filters)?,
        Commands::Delete { table, filters } => commands::delete(&ctx, &table, &filters)?,
        Commands::Aggregate {
            function,
            table,
            column,
            filters,
        } => commands::aggregate(&ctx, function.into(), &table, column.as_deref(), &filters)?,
    }

    Ok(())
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
