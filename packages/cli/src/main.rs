#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line administration for SafeGuard.
//!
//! ```text
//! safeguard serve [--bind 0.0.0.0] [--port 8080]
//! safeguard seed [--seed 42]
//! safeguard users add <email> [--name "Ann Lee"]
//! safeguard sessions issue <user>
//! safeguard sessions revoke <session-id>
//! safeguard contacts add <user> <name> <phone>
//! safeguard contacts list <user>
//! safeguard events recent <user> [--limit 10]
//! ```
//!
//! `<user>` is a user id or email address. The database path comes from
//! `--db`, then `DATABASE_PATH`, then `data/safeguard.db`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::{SeedableRng as _, rngs::StdRng};
use safeguard_database::{
    DbStore,
    seed::{DEFAULT_PER_CITY, generate_crime_records},
};
use safeguard_database_models::{
    ContactStore as _, CrimeStore as _, EventStore as _, NewEmergencyContact, SessionStore as _,
    User, UserStore as _,
};
use safeguard_server::{ServerConfig, run_server};

#[derive(Parser)]
#[command(name = "safeguard", about = "SafeGuard server and data administration")]
struct Cli {
    /// `SQLite` database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind (overrides `BIND_ADDR`)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides `PORT`)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Insert randomly generated crime records around the reference cities
    Seed {
        /// RNG seed for a reproducible dataset
        #[arg(long)]
        seed: Option<u64>,
    },
    #[command(flatten)]
    Admin(AdminCommands),
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Manage users
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Manage API sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Manage emergency contacts
    Contacts {
        #[command(subcommand)]
        command: ContactCommands,
    },
    /// Inspect SOS events
    Events {
        #[command(subcommand)]
        command: EventCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user
    Add {
        /// Unique email address
        email: String,
        /// Name shown to emergency contacts
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Issue a session id for the `x-session-id` header
    Issue {
        /// User id or email
        user: String,
    },
    /// Revoke a session
    Revoke {
        /// Session id
        session: String,
    },
}

#[derive(Subcommand)]
enum ContactCommands {
    /// Add an emergency contact
    Add {
        /// User id or email
        user: String,
        /// Contact name
        name: String,
        /// Phone number in international format
        phone: String,
    },
    /// List a user's emergency contacts
    List {
        /// User id or email
        user: String,
    },
}

#[derive(Subcommand)]
enum EventCommands {
    /// Show a user's most recent SOS events
    Recent {
        /// User id or email
        user: String,
        /// Maximum number of events to show
        #[arg(long, default_value = "10")]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let mut config = ServerConfig::from_env();
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    match cli.command {
        Commands::Serve { bind, port } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(port) = port {
                config.port = port;
            }

            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(run_server(config))
            })
            .await??;
        }
        Commands::Seed { seed } => {
            let store = DbStore::open(&config.database_path).await?;
            let mut rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
            let records = generate_crime_records(&mut rng, DEFAULT_PER_CITY, chrono::Utc::now());
            let inserted = store.insert_many(&records).await?;
            let total = store.count_crimes().await?;

            println!("Seeded {inserted} crime records ({total} total)");
        }
        Commands::Admin(command) => {
            let store = DbStore::open(&config.database_path).await?;
            admin(&store, command).await?;
        }
    }

    Ok(())
}

async fn admin(store: &DbStore, command: AdminCommands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        AdminCommands::Users {
            command: UserCommands::Add { email, name },
        } => {
            let user = store.create_user(&email, name.as_deref()).await?;
            println!("Created user {} <{}>", user.id, user.email);
        }
        AdminCommands::Sessions { command } => match command {
            SessionCommands::Issue { user } => {
                let user = resolve_user(store, &user).await?;
                let session = store.issue(&user.id).await?;
                println!("{session}");
            }
            SessionCommands::Revoke { session } => {
                if store.revoke(&session).await? {
                    println!("Revoked session {session}");
                } else {
                    eprintln!("Session not found: {session}");
                    std::process::exit(1);
                }
            }
        },
        AdminCommands::Contacts { command } => match command {
            ContactCommands::Add { user, name, phone } => {
                let user = resolve_user(store, &user).await?;
                let contact = NewEmergencyContact::new(&name, &phone)?;
                let contact = store.add(&user.id, contact).await?;
                println!("Added contact {} ({})", contact.id, contact.name);
            }
            ContactCommands::List { user } => {
                let user = resolve_user(store, &user).await?;
                let contacts = store.list_by_user(&user.id).await?;

                if contacts.is_empty() {
                    println!("No emergency contacts for {}.", user.email);
                    return Ok(());
                }

                println!("{:<38} {:<24} PHONE", "ID", "NAME");
                println!("{}", "-".repeat(80));
                for contact in &contacts {
                    println!(
                        "{:<38} {:<24} {}",
                        contact.id, contact.name, contact.phone_number
                    );
                }
            }
        },
        AdminCommands::Events {
            command: EventCommands::Recent { user, limit },
        } => {
            let user = resolve_user(store, &user).await?;
            let events = store.recent(&user.id, limit).await?;

            if events.is_empty() {
                println!("No SOS events for {}.", user.email);
                return Ok(());
            }

            println!("{:<38} {:<22} {:<24} ADDRESS", "ID", "CREATED", "LOCATION");
            println!("{}", "-".repeat(100));
            for event in &events {
                println!(
                    "{:<38} {:<22} {:<24} {}",
                    event.id,
                    event.created_at.format("%Y-%m-%d %H:%M:%S"),
                    event.location.to_string(),
                    event.address.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}

/// Looks a user up by email when `key` contains `@`, otherwise by id.
/// Exits the process when no user matches.
async fn resolve_user(store: &DbStore, key: &str) -> Result<User, Box<dyn std::error::Error>> {
    let user = if key.contains('@') {
        store.find_user_by_email(key).await?
    } else {
        store.find_user(key).await?
    };

    let Some(user) = user else {
        eprintln!("User not found: {key}");
        std::process::exit(1);
    };

    Ok(user)
}
