use clap::{Args, Parser, Subcommand};
use cnc_enrollment::application::transactions::TransactionStore;
use cnc_enrollment::application::workflow::EnrollmentService;
use cnc_enrollment::config::{Config, StorageConfig};
use cnc_enrollment::domain::profile::{Profile, Rank};
use cnc_enrollment::domain::recommendation::recommend;
use cnc_enrollment::infrastructure::http::HttpClient;
use cnc_enrollment::interfaces::csv::program_writer::ProgramWriter;
use cnc_enrollment::interfaces::csv::registration_writer::RegistrationWriter;
use cnc_enrollment::telemetry;
use miette::{IntoDiagnostic, Result};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./cnc-enrollment.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to a persistent database. If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the available programs
    Catalog,
    /// List programs matching comma-separated interests
    Recommend {
        /// e.g. "IA, Programmation"
        interests: String,
    },
    /// Register for a program and obtain a payment link
    Enroll(EnrollArgs),
    /// List stored registrations (admin)
    Registrations,
}

#[derive(Args)]
struct EnrollArgs {
    /// Full name
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: Option<String>,
    /// CNC track: MP, PSI or TSI
    #[arg(long)]
    rank: Option<Rank>,
    /// Comma-separated fields of interest
    #[arg(long)]
    interests: Option<String>,
    /// Program code, see `catalog`
    #[arg(long)]
    program: String,
}

impl EnrollArgs {
    fn into_profile(self) -> (Profile, String) {
        let profile = Profile {
            name: self.name,
            email: self.email,
            rank: self.rank,
            phone: self.phone,
            interests: self.interests,
        };
        (profile, self.program)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    telemetry::init();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).into_diagnostic()?;
    if let Some(path) = cli.db_path {
        config.storage = StorageConfig::Rocksdb { path };
    }
    let client = HttpClient::new();

    let stdout = io::stdout();
    match cli.command {
        Command::Catalog => {
            let catalog = config.catalog();
            let mut writer = ProgramWriter::new(stdout.lock());
            writer.write_programs(catalog.programs()).into_diagnostic()?;
        }
        Command::Recommend { interests } => {
            let catalog = config.catalog();
            let matches = recommend(catalog.programs(), &interests);
            if matches.is_empty() {
                eprintln!("No program matches \"{}\"", interests);
            }
            let mut writer = ProgramWriter::new(stdout.lock());
            writer.write_programs(matches).into_diagnostic()?;
        }
        Command::Registrations => {
            let store = TransactionStore::new(config.storage.open(&client).into_diagnostic()?);
            let registrations = store.list_transactions().await.into_diagnostic()?;
            let mut writer = RegistrationWriter::new(stdout.lock());
            writer.write_registrations(&registrations).into_diagnostic()?;
        }
        Command::Enroll(args) => {
            if config.storage.is_volatile() {
                tracing::warn!(
                    "Registrations are kept in memory and will be lost when the process exits."
                );
            }
            let service = EnrollmentService::new(
                config.catalog(),
                config.validator(),
                TransactionStore::new(config.storage.open(&client).into_diagnostic()?),
                config.payment_initiator(&client).into_diagnostic()?,
            );
            let (profile, program) = args.into_profile();

            let mut session = service.start();
            match session.run(profile, &program).await {
                Ok(link) => {
                    if let (Some(program), Some(registration)) =
                        (session.selected_program(), session.registration())
                    {
                        println!("Registration: {}", registration.id);
                        println!("Program: {}", program.name);
                        println!("Institution: {}", program.institution);
                        println!("Application fee: {}", program.fee_label());
                    }
                    println!("Checkout: {}", link);
                }
                Err(e) => {
                    eprintln!("Error ({}): {}", session.state(), e);
                    if let Some(registration) = session.registration() {
                        eprintln!(
                            "Registration {} is kept as {}; no payment was started.",
                            registration.id, registration.status
                        );
                    }
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
