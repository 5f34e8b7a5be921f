use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use finance_organizer::{
    clock::{Clock, FixedClock, SystemClock},
    config::{database, settings},
    core::{
        processor, recurring,
        recurring::{NewSchedule, SchedulePatch},
        report,
        schedule::Frequency,
    },
    entities::recurring_transaction,
    errors::{self, Error},
};
use sea_orm::DatabaseConnection;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "finance-organizer")]
#[command(about = "Operator utilities for recurring transactions")]
struct Cli {
    /// Treat this date (YYYY-MM-DD) as today instead of the current UTC date
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Materialize every due schedule
    ProcessDue,
    /// Create a recurring schedule
    Create(CreateArgs),
    /// List a user's active schedules
    List(ListArgs),
    /// Show one schedule
    Show(OwnedArgs),
    /// Update fields of a schedule
    Update(UpdateArgs),
    /// Deactivate a schedule
    Deactivate(OwnedArgs),
    /// Materialize one schedule now, whether or not it is due
    Trigger(OwnedArgs),
}

#[derive(Args, Debug)]
struct CreateArgs {
    #[arg(long)]
    owner: i64,
    #[arg(long)]
    amount: f64,
    #[arg(long = "type")]
    transaction_type: String,
    #[arg(long)]
    category: String,
    #[arg(long)]
    frequency: Frequency,
    #[arg(long)]
    start: NaiveDate,
    #[arg(long)]
    end: Option<NaiveDate>,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long)]
    owner: i64,
    #[arg(long, default_value_t = 0)]
    skip: u64,
    /// Defaults to `page_limit` from the configuration
    #[arg(long)]
    limit: Option<u64>,
}

#[derive(Args, Debug)]
struct OwnedArgs {
    #[arg(long)]
    id: i64,
    /// The user making the request; must own the schedule
    #[arg(long)]
    owner: i64,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    #[command(flatten)]
    target: OwnedArgs,
    #[arg(long)]
    amount: Option<f64>,
    #[arg(long = "type")]
    transaction_type: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    frequency: Option<Frequency>,
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl From<UpdateArgs> for SchedulePatch {
    fn from(args: UpdateArgs) -> Self {
        Self {
            amount: args.amount,
            transaction_type: args.transaction_type,
            category: args.category,
            description: args.description.map(Some),
            frequency: args.frequency,
            start_date: args.start,
            end_date: args.end.map(Some),
            ..Default::default()
        }
    }
}

/// Loads a schedule and checks it belongs to the requesting user.
async fn owned_schedule(
    db: &DatabaseConnection,
    target: &OwnedArgs,
) -> errors::Result<recurring_transaction::Model> {
    let schedule = recurring::get_schedule(db, target.id)
        .await?
        .ok_or(Error::ScheduleNotFound { id: target.id })?;

    if schedule.user_id != target.owner {
        return Err(Error::PermissionDenied { id: target.id });
    }
    Ok(schedule)
}

async fn run(
    db: &DatabaseConnection,
    clock: &impl Clock,
    page_limit: u64,
    command: Command,
) -> errors::Result<()> {
    match command {
        Command::ProcessDue => {
            let summary = processor::process_due_with_summary(db, clock).await?;
            print!("{}", processor::format_process_summary(&summary));
        }
        Command::Create(args) => {
            let schedule = recurring::create_schedule(
                db,
                clock,
                NewSchedule {
                    user_id: args.owner,
                    amount: args.amount,
                    transaction_type: args.transaction_type,
                    category: args.category,
                    description: args.description,
                    frequency: args.frequency,
                    start_date: args.start,
                    end_date: args.end,
                },
            )
            .await?;
            println!("{}", report::format_schedule_summary(&schedule));
        }
        Command::List(args) => {
            let limit = args.limit.unwrap_or(page_limit);
            let schedules =
                recurring::list_active_schedules(db, args.owner, args.skip, limit).await?;
            for schedule in &schedules {
                println!("{}", report::format_schedule_summary(schedule));
            }
        }
        Command::Show(target) => {
            let schedule = owned_schedule(db, &target).await?;
            println!("{}", report::format_schedule_summary(&schedule));
        }
        Command::Update(args) => {
            let schedule = owned_schedule(db, &args.target).await?;
            let updated =
                recurring::update_schedule(db, clock, schedule.id, SchedulePatch::from(args))
                    .await?;
            println!("{}", report::format_schedule_summary(&updated));
        }
        Command::Deactivate(target) => {
            owned_schedule(db, &target).await?;
            let schedule = recurring::deactivate_schedule(db, target.id)
                .await?
                .ok_or(Error::ScheduleNotFound { id: target.id })?;
            println!("{}", report::format_schedule_summary(&schedule));
        }
        Command::Trigger(target) => {
            owned_schedule(db, &target).await?;
            let outcome = recurring::trigger_schedule(db, clock, target.id).await?;
            println!(
                "{}",
                report::format_transaction_summary(&outcome.transaction)
            );
            println!("{}", report::format_schedule_summary(&outcome.schedule));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> errors::Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    let cli = Cli::parse();

    // 3. Load the application configuration
    let app_config = settings::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure the tables exist
    let db = database::create_connection(&app_config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Run the requested command
    let result = match cli.date {
        Some(date) => run(&db, &FixedClock(date), app_config.page_limit, cli.command).await,
        None => run(&db, &SystemClock, app_config.page_limit, cli.command).await,
    };
    result.inspect_err(|e| error!("Command failed: {}", e))
}
