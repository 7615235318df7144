mod aggregation;
mod approval;
mod categories;
mod cli;
mod db;
mod error;
mod export;
mod fmt;
mod models;
mod settings;
mod store;
mod users;
mod validation;
mod xlsx;

use clap::Parser;
use tracing_subscriber::{fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Commands, ReportCommands, UsersCommands};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "daybook=info".into()))
        .with(log_fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Users { command } => match command {
            UsersCommands::Add { name } => cli::users::add(&name),
            UsersCommands::List => cli::users::list(),
        },
        Commands::Categories => cli::categories::list(),
        Commands::Report { command } => match command {
            ReportCommands::Create { user, date, tasks } => cli::report::create(user, &date, &tasks),
            ReportCommands::List { page } => cli::report::list(page),
            ReportCommands::Show { id } => cli::report::show(id),
            ReportCommands::Update { id, date, tasks } => cli::report::update(id, &date, &tasks),
            ReportCommands::Delete { id } => cli::report::delete(id),
            ReportCommands::Approve { id, by } => cli::report::approve(id, by),
        },
        Commands::Dashboard { date } => cli::dashboard::run(date),
        Commands::Chart { category_id, range } => cli::chart::run(category_id, &range),
        Commands::Export {
            from_date,
            to_date,
            output,
        } => cli::export::run(&from_date, &to_date, output),
        Commands::Backup { output } => cli::backup::run(output),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
