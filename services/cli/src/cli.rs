use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use housing_allocation::allocation::{
    ApplicationStatus, BookingStatus, Decision, FlatOffering, FlatType, MaritalStatus,
    RegistrationStatus,
};
use housing_allocation::config::AppConfig;
use housing_allocation::error::AppError;
use housing_allocation::telemetry;
use tracing::debug;

use crate::commands;
use crate::demo::{run_demo, DemoArgs};
use crate::infra::{open_service, parse_date, parse_offering};

#[derive(Parser, Debug)]
#[command(
    name = "housing",
    about = "Manage housing projects, applications, officer registrations and flat bookings",
    version
)]
struct Cli {
    /// Directory holding the CSV record store (overrides HOUSING_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Evaluate windows and expiry as of this date (YYYY-MM-DD). Defaults to today.
    #[arg(long, global = true, value_parser = parse_date)]
    today: Option<NaiveDate>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create, list and administer housing projects
    Projects {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Add an applicant or officer account
    Users {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Submit an application for a flat type in a project
    Apply(ApplyArgs),
    /// Request withdrawal of the applicant's current application
    Withdraw(ApplicantArgs),
    /// Approve or reject a pending application
    DecideApplication(DecideArgs),
    /// Approve or reject a pending withdrawal request
    DecideWithdrawal(DecideArgs),
    /// List applications
    Applications(ApplicationListArgs),
    /// Register an officer to help run a project
    Register(RegisterArgs),
    /// Approve or reject a pending officer registration
    DecideRegistration(DecideArgs),
    /// List officer registrations
    Registrations(RegistrationListArgs),
    /// Release officers whose assigned project has closed
    ReleaseAssignments,
    /// Request a flat booking for a successful application
    Book(ApplicantArgs),
    /// Approve a pending flat booking as an assigned officer
    ApproveBooking(ApproveBookingArgs),
    /// Booking listings and reports
    Bookings {
        #[command(subcommand)]
        command: BookingCommand,
    },
    /// Print the receipt for an approved booking
    Receipt(ApplicantArgs),
    /// Walk through the full allocation lifecycle on an in-memory store
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
pub(crate) enum ProjectCommand {
    /// List projects: everything, a manager's, an officer's, or what an applicant may apply for
    List(ProjectListArgs),
    /// List a new project
    Create(ProjectCreateArgs),
    /// Change a project's attributes
    Edit(ProjectEditArgs),
    /// Show or hide a project from applicants
    Visibility(VisibilityArgs),
    /// Delete a project together with its applications, registrations and bookings
    Delete(ProjectRefArgs),
}

#[derive(Subcommand, Debug)]
pub(crate) enum UserCommand {
    /// Add an applicant account
    Applicant(UserArgs),
    /// Add an officer account
    Officer(UserArgs),
}

#[derive(Subcommand, Debug)]
pub(crate) enum BookingCommand {
    /// List bookings, optionally by status
    List(BookingListArgs),
    /// Approved bookings filtered by marital status, flat type and project
    Report(BookingReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ProjectListArgs {
    /// Only projects this applicant may currently apply for
    #[arg(long, conflicts_with_all = ["manager", "officer"])]
    pub(crate) applicant: Option<String>,
    /// Only projects run by this manager
    #[arg(long, conflicts_with = "officer")]
    pub(crate) manager: Option<String>,
    /// Only projects this officer is assigned to
    #[arg(long)]
    pub(crate) officer: Option<String>,
    #[arg(long)]
    pub(crate) flat_type: Option<FlatType>,
    #[arg(long)]
    pub(crate) neighborhood: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ProjectCreateArgs {
    #[arg(long)]
    pub(crate) manager: String,
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) neighborhood: String,
    /// Offered flat type as TYPE:UNITS:PRICE, e.g. TWO_ROOM:10:350000 (repeat for a second type)
    #[arg(long = "offering", required = true, value_parser = parse_offering)]
    pub(crate) offerings: Vec<FlatOffering>,
    #[arg(long, value_parser = parse_date)]
    pub(crate) opens: NaiveDate,
    #[arg(long, value_parser = parse_date)]
    pub(crate) closes: NaiveDate,
    #[arg(long, default_value_t = 10)]
    pub(crate) officer_slots: u32,
    /// Keep the project hidden from applicants
    #[arg(long)]
    pub(crate) hidden: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ProjectEditArgs {
    #[command(flatten)]
    pub(crate) target: ProjectRefArgs,
    #[arg(long)]
    pub(crate) neighborhood: Option<String>,
    /// Replacement offerings as TYPE:UNITS:PRICE
    #[arg(long = "offering", value_parser = parse_offering)]
    pub(crate) offerings: Vec<FlatOffering>,
    #[arg(long, value_parser = parse_date)]
    pub(crate) opens: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date)]
    pub(crate) closes: Option<NaiveDate>,
    #[arg(long)]
    pub(crate) officer_slots: Option<u32>,
}

#[derive(Args, Debug)]
pub(crate) struct ProjectRefArgs {
    #[arg(long)]
    pub(crate) manager: String,
    #[arg(long)]
    pub(crate) project: String,
}

#[derive(Args, Debug)]
pub(crate) struct VisibilityArgs {
    #[command(flatten)]
    pub(crate) target: ProjectRefArgs,
    #[arg(long, action = clap::ArgAction::Set)]
    pub(crate) visible: bool,
}

#[derive(Args, Debug)]
pub(crate) struct UserArgs {
    #[arg(long)]
    pub(crate) id: String,
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) age: u8,
    #[arg(long)]
    pub(crate) marital_status: MaritalStatus,
}

#[derive(Args, Debug)]
pub(crate) struct ApplyArgs {
    #[arg(long)]
    pub(crate) applicant: String,
    #[arg(long)]
    pub(crate) project: String,
    #[arg(long)]
    pub(crate) flat_type: FlatType,
}

#[derive(Args, Debug)]
pub(crate) struct ApplicantArgs {
    #[arg(long)]
    pub(crate) applicant: String,
}

#[derive(Args, Debug)]
pub(crate) struct DecideArgs {
    #[arg(long)]
    pub(crate) manager: String,
    /// Application or registration id
    #[arg(long)]
    pub(crate) id: String,
    /// approve or reject
    #[arg(long)]
    pub(crate) decision: Decision,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ApplicationListArgs {
    #[arg(long)]
    pub(crate) project: Option<String>,
    #[arg(long)]
    pub(crate) status: Option<ApplicationStatus>,
    #[arg(long)]
    pub(crate) applicant: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct RegisterArgs {
    #[arg(long)]
    pub(crate) officer: String,
    #[arg(long)]
    pub(crate) project: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RegistrationListArgs {
    #[arg(long)]
    pub(crate) project: Option<String>,
    #[arg(long)]
    pub(crate) status: Option<RegistrationStatus>,
    #[arg(long)]
    pub(crate) officer: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ApproveBookingArgs {
    #[arg(long)]
    pub(crate) officer: String,
    #[arg(long)]
    pub(crate) id: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct BookingListArgs {
    #[arg(long)]
    pub(crate) status: Option<BookingStatus>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct BookingReportArgs {
    #[arg(long)]
    pub(crate) marital_status: Option<MaritalStatus>,
    #[arg(long)]
    pub(crate) flat_type: Option<FlatType>,
    #[arg(long)]
    pub(crate) project: Option<String>,
}

pub(crate) fn run() -> Result<(), AppError> {
    let Cli {
        data_dir,
        today,
        command,
    } = Cli::parse();
    let mut config = AppConfig::load()?;
    if let Some(dir) = data_dir {
        config.storage.data_dir = dir;
    }
    telemetry::init(&config.telemetry)?;
    debug!(?config.environment, data_dir = %config.storage.data_dir.display(), "configuration loaded");

    // The demo never touches the CSV store.
    let command = match command {
        Command::Demo(args) => return run_demo(args, &config, today),
        command => command,
    };

    let service = open_service(&config, today)?;
    match command {
        Command::Projects { command } => commands::projects(&service, command),
        Command::Users { command } => commands::users(&service, command),
        Command::Apply(args) => commands::apply(&service, args),
        Command::Withdraw(args) => commands::withdraw(&service, args),
        Command::DecideApplication(args) => commands::decide_application(&service, args),
        Command::DecideWithdrawal(args) => commands::decide_withdrawal(&service, args),
        Command::Applications(args) => commands::applications(&service, args),
        Command::Register(args) => commands::register(&service, args),
        Command::DecideRegistration(args) => commands::decide_registration(&service, args),
        Command::Registrations(args) => commands::registrations(&service, args),
        Command::ReleaseAssignments => commands::release_assignments(&service),
        Command::Book(args) => commands::book(&service, args),
        Command::ApproveBooking(args) => commands::approve_booking(&service, args),
        Command::Bookings { command } => commands::bookings(&service, command),
        Command::Receipt(args) => commands::receipt(&service, args),
        Command::Demo(args) => run_demo(args, &config, today),
    }
}
