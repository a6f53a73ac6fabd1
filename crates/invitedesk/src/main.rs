//! Invitedesk - health-screening invitation intake client.
//!
//! Captures invitation records into a durable local queue, offline if
//! need be, and reconciles them with the remote store one record at a
//! time.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::AppConfig;
use invitedesk_core::{
    Calendar, InviteService, InvitationInput, InvitationPatch, InvitationRecord, LocalId,
    ScreeningSelections, StoreRepository,
};
use invitedesk_gateway::GatewayClient;

/// Invitation intake with offline-first sync.
#[derive(Parser, Debug)]
#[command(name = "invitedesk", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in against the backend's account store.
    Login {
        /// Staff user name.
        username: String,
        /// Password; accounts without one sign in with an empty string.
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Clear the signed-in user.
    Logout,
    /// Capture one invitation into the local queue.
    Submit(SubmitArgs),
    /// Edit a queued invitation.
    Edit(EditArgs),
    /// List today's invitations.
    List,
    /// Push pending and failed records to the remote store.
    Sync,
    /// Show today's quota usage.
    Quota,
    /// Remove an invitation from the local queue.
    Remove {
        /// Local id of the record to remove.
        local_id: String,
    },
    /// Show connectivity, sign-in, and sync state.
    Status,
}

/// Arguments for `submit`.
#[derive(Args, Debug)]
struct SubmitArgs {
    /// Participant name.
    #[arg(long)]
    name: String,
    /// Primary phone number.
    #[arg(long)]
    phone1: String,
    /// Secondary phone number.
    #[arg(long, default_value = "")]
    phone2: String,
    /// Free-text notes.
    #[arg(long, default_value = "")]
    notes: String,
    /// Session label (morning/afternoon/evening).
    #[arg(long)]
    session: String,
    /// Session descriptor (`date-region-location-appointmentType`).
    #[arg(long)]
    descriptor: String,
    /// Mammography screening.
    #[arg(long)]
    mammography: bool,
    /// First-time screening.
    #[arg(long)]
    first_screen: bool,
    /// Cervical smear screening.
    #[arg(long)]
    cervical_smear: bool,
    /// Adult health check.
    #[arg(long)]
    adult_health: bool,
    /// Hepatitis B/C screening.
    #[arg(long)]
    hepatitis: bool,
    /// Colorectal screening.
    #[arg(long)]
    colorectal: bool,
}

/// Arguments for `edit`.
#[derive(Args, Debug)]
struct EditArgs {
    /// Local id of the record to edit.
    local_id: String,
    /// New participant name.
    #[arg(long)]
    name: Option<String>,
    /// New primary phone number.
    #[arg(long)]
    phone1: Option<String>,
    /// New secondary phone number.
    #[arg(long)]
    phone2: Option<String>,
    /// New notes.
    #[arg(long)]
    notes: Option<String>,
    /// New session label.
    #[arg(long)]
    session: Option<String>,
    /// New session descriptor.
    #[arg(long)]
    descriptor: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "invitedesk=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    let store = StoreRepository::new(
        config
            .database_path()?
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("non-UTF-8 state path"))?,
    )
    .await?;
    let gateway = GatewayClient::for_endpoint(&config.endpoint)?;
    let mut service = InviteService::open(store, Calendar::system(), gateway).await;

    match cli.command {
        Commands::Login { username, password } => {
            let user = service.sign_in(&username, &password).await?;
            info!(name = %user.name, role = ?user.role, "signed in");
            println!("signed in as {}", user.name);
            if let Some(limits) = service.cached_limits() {
                println!(
                    "today's quota: morning {} / afternoon {} / evening {}",
                    limits.morning, limits.afternoon, limits.evening
                );
            }
        }
        Commands::Logout => {
            service.sign_out().await;
            println!("signed out");
        }
        Commands::Submit(args) => {
            let record = service.submit(submit_input(args)).await?;
            println!(
                "queued {} for {} ({} {})",
                record.local_id, record.name, record.date, record.session
            );
            // Opportunistic push; a dead link just leaves the record
            // pending for the next sync.
            probe_connectivity(&service).await;
            if let Some(outcome) = service.sync_tick().await {
                report_outcome(&outcome);
            }
        }
        Commands::Edit(args) => {
            let local_id = LocalId(args.local_id.clone());
            let patch = edit_patch(args);
            if service.edit(&local_id, patch).await? {
                println!("updated {local_id}");
            } else {
                println!("no record with id {local_id}");
            }
        }
        Commands::List => {
            let records = service.list_today()?;
            if records.is_empty() {
                println!("no invitations today");
            }
            for record in records {
                print_record(record);
            }
        }
        Commands::Sync => {
            probe_connectivity(&service).await;
            match service.sync_now().await {
                Ok(outcome) => report_outcome(&outcome),
                Err(skip) => println!("{skip}"),
            }
        }
        Commands::Quota => {
            let limits = service.refresh_limits().await?;
            let counts = service.counts_today()?;
            println!("session    used  limit");
            println!("morning    {:>4}  {:>5}", counts.morning, limits.morning);
            println!("afternoon  {:>4}  {:>5}", counts.afternoon, limits.afternoon);
            println!("evening    {:>4}  {:>5}", counts.evening, limits.evening);
        }
        Commands::Remove { local_id } => {
            let local_id = LocalId(local_id);
            if service.remove(&local_id).await {
                println!("removed {local_id}");
            } else {
                println!("no record with id {local_id}");
            }
        }
        Commands::Status => {
            let reachable = service.orchestrator().gateway().probe().await.is_ok();
            println!(
                "backend:   {}",
                if reachable { "reachable" } else { "unreachable" }
            );
            println!(
                "user:      {}",
                service
                    .current_user()
                    .map_or("not signed in", |user| user.name.as_str())
            );
            println!(
                "last sync: {}",
                service.last_sync().await.unwrap_or_else(|| "never".to_string())
            );
            let pending = service
                .queue()
                .records()
                .iter()
                .filter(|record| record.sync_status.is_sync_candidate())
                .count();
            println!("unsynced:  {pending}");
        }
    }

    Ok(())
}

/// Probes the backend and records the connectivity result.
async fn probe_connectivity(service: &InviteService<GatewayClient>) {
    let online = service.orchestrator().gateway().probe().await.is_ok();
    service.set_online(online);
}

fn submit_input(args: SubmitArgs) -> InvitationInput {
    InvitationInput {
        name: args.name,
        phone1: args.phone1,
        phone2: args.phone2,
        screening: ScreeningSelections {
            mammography: args.mammography,
            first_screen: args.first_screen,
            cervical_smear: args.cervical_smear,
            adult_health: args.adult_health,
            hepatitis: args.hepatitis,
            colorectal: args.colorectal,
        },
        notes: args.notes,
        session: args.session,
        session_info: args.descriptor,
    }
}

fn edit_patch(args: EditArgs) -> InvitationPatch {
    InvitationPatch {
        name: args.name,
        phone1: args.phone1,
        phone2: args.phone2,
        screening: None,
        notes: args.notes,
        session: args.session,
        session_info: args.descriptor,
    }
}

fn print_record(record: &InvitationRecord) {
    println!(
        "{:<8} {:<9} {:<20} {:<12} {}",
        record.sync_status.display_name(),
        record.session,
        record.name,
        record.phone1,
        record.local_id,
    );
    if let Some(error) = &record.sync_error {
        println!("         last sync error: {error}");
    }
}

fn report_outcome(outcome: &invitedesk_core::SyncOutcome) {
    if outcome.total == 0 {
        println!("nothing to sync");
    } else {
        println!(
            "synced {} of {} record(s), {} failed",
            outcome.succeeded, outcome.total, outcome.failed
        );
    }
}
