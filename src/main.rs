use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use deskboard::api::{ApiClient, DEFAULT_API_URL};
use deskboard::commands::{self, init::STORAGE_DB, init::STORAGE_DIR, TicketSource};
use deskboard::db::Database;
use deskboard::filter::FilterCriteria;
use deskboard::models::{Catalog, TicketStatus};
use deskboard::session;

#[derive(Parser)]
#[command(name = "deskboard")]
#[command(about = "Admin dashboard and PDF reports for the incident ticketing backend")]
#[command(version)]
struct Cli {
    /// Base URL of the ticketing REST API
    #[arg(long, global = true, env = "DESKBOARD_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Log output format (logs go to stderr; level via RUST_LOG)
    #[arg(long, global = true, env = "DESKBOARD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Args)]
struct FilterArgs {
    /// Company name contains (case-insensitive)
    #[arg(long)]
    company: Option<String>,
    /// Technician name contains (case- and accent-insensitive)
    #[arg(long)]
    technician: Option<String>,
    /// Fault type contains (case-insensitive)
    #[arg(long)]
    fault: Option<String>,
    /// Exact status (open, waiting, closed, resolved)
    #[arg(long)]
    status: Option<String>,
    /// First day included (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,
    /// Last day included (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria::from_args(
            self.company.as_deref(),
            self.technician.as_deref(),
            self.fault.as_deref(),
            self.status.as_deref(),
            self.from.as_deref(),
            self.to.as_deref(),
        )
    }
}

#[derive(Args)]
struct SourceArgs {
    /// Read tickets from a JSON file instead of the backend
    #[arg(long, conflicts_with = "demo")]
    input: Option<PathBuf>,
    /// Use the bundled demo tickets
    #[arg(long)]
    demo: bool,
}

impl SourceArgs {
    fn source(&self) -> TicketSource {
        match (&self.input, self.demo) {
            (Some(path), _) => TicketSource::File(path.clone()),
            (None, true) => TicketSource::Demo,
            (None, false) => TicketSource::Api,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize deskboard storage in the current directory
    Init,

    /// Store the session issued by the backend
    Login {
        /// Opaque session blob
        #[arg(long)]
        session: String,
    },

    /// Clear the stored session
    Logout,

    /// Show the user and role of the stored session
    Whoami,

    /// Show KPI counters and the latest tickets
    Dashboard,

    /// List technicians
    Technicians,

    /// List clients
    Clients,

    /// Catalog management
    Catalogs {
        #[command(subcommand)]
        action: Option<CatalogCommands>,
    },

    /// List technical sheets
    Sheets,

    /// Internal ticket management
    Ticket {
        #[command(subcommand)]
        action: TicketCommands,
    },

    /// Filter and summarize tickets
    Tickets {
        #[command(subcommand)]
        action: TicketsCommands,
    },

    /// Change a ticket's status in a ticket file
    Status {
        /// Ticket ID
        id: i64,
        /// New status (open, waiting, closed, resolved)
        status: TicketStatus,
        /// Ticket file to update
        #[arg(long)]
        input: PathBuf,
    },

    /// Generate the PDF incident report
    Report {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        source: SourceArgs,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Export the report charts as PNG files
    Charts {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        source: SourceArgs,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum CatalogCommands {
    /// List every catalog
    List,
    /// Delete a catalog entry
    Delete {
        /// Catalog name (empresas, equipo, cat_elementos, falla_reportada, solucion)
        catalog: Catalog,
        /// Entry ID
        id: i64,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum TicketCommands {
    /// Open a new internal ticket
    Create {
        /// Client ID
        #[arg(long)]
        client: i64,
        /// Bus number
        #[arg(long)]
        bus: String,
        /// Reported fault ID
        #[arg(long)]
        fault: i64,
        /// Assigned technician ID
        #[arg(long)]
        technician: Option<i64>,
    },
}

#[derive(Subcommand)]
enum TicketsCommands {
    /// List tickets matching the filters
    List {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Status counts and tallies for tickets matching the filters
    Stats {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn find_deskboard_dir() -> Result<PathBuf> {
    let mut current = env::current_dir()?;

    loop {
        let candidate = current.join(STORAGE_DIR);
        if candidate.exists() && candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            bail!("Not a deskboard directory (or any parent). Run 'deskboard init' first.");
        }
    }
}

fn get_db() -> Result<Database> {
    let deskboard_dir = find_deskboard_dir()?;
    let db_path = deskboard_dir.join(STORAGE_DB);
    Database::open(&db_path).context("Failed to open database")
}

/// Open storage and refuse to continue without a session.
fn gated_db() -> Result<Database> {
    let db = get_db()?;
    session::require(&db)?;
    Ok(db)
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let api = ApiClient::new(&cli.api_url);

    match cli.command {
        Commands::Init => {
            let cwd = env::current_dir()?;
            commands::init::run(&cwd)
        }

        Commands::Login { session } => {
            let db = get_db()?;
            commands::session::login(&db, &session)
        }

        Commands::Logout => {
            let db = get_db()?;
            commands::session::logout(&db)
        }

        Commands::Whoami => {
            let db = get_db()?;
            commands::session::whoami(&db)
        }

        Commands::Dashboard => {
            gated_db()?;
            commands::dashboard::run(&api)
        }

        Commands::Technicians => {
            gated_db()?;
            commands::people::technicians(&api)
        }

        Commands::Clients => {
            gated_db()?;
            commands::people::clients(&api)
        }

        Commands::Catalogs { action } => {
            gated_db()?;
            match action.unwrap_or(CatalogCommands::List) {
                CatalogCommands::List => commands::catalogs::list(&api),
                CatalogCommands::Delete { catalog, id, force } => {
                    commands::catalogs::delete(&api, catalog, id, force)
                }
            }
        }

        Commands::Sheets => {
            gated_db()?;
            commands::sheets::run(&api)
        }

        Commands::Ticket { action } => {
            gated_db()?;
            match action {
                TicketCommands::Create {
                    client,
                    bus,
                    fault,
                    technician,
                } => commands::ticket::create(&api, client, &bus, fault, technician),
            }
        }

        Commands::Tickets { action } => {
            gated_db()?;
            match action {
                TicketsCommands::List { filters, source } => {
                    let store = source.source().load(&api)?;
                    commands::tickets::list(store.tickets(), &filters.criteria())
                }
                TicketsCommands::Stats { filters, source } => {
                    let store = source.source().load(&api)?;
                    commands::tickets::stats(store.tickets(), &filters.criteria())
                }
            }
        }

        Commands::Status { id, status, input } => {
            gated_db()?;
            commands::status::set(&input, id, status)
        }

        Commands::Report {
            filters,
            source,
            out,
            yes,
        } => {
            gated_db()?;
            let store = source.source().load(&api)?;
            commands::report::run(store.tickets(), &filters.criteria(), &out, yes)
        }

        Commands::Charts {
            filters,
            source,
            out,
        } => {
            gated_db()?;
            let store = source.source().load(&api)?;
            commands::report::export_charts(store.tickets(), &filters.criteria(), &out)
        }
    }
}
