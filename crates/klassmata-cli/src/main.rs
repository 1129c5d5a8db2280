use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use klassmata_core::{MIN_PASSWORD_LENGTH, hash_password_async};
use klassmata_db::{InviteStore, PgInviteStore, init_db_pool, run_migrations};
use klassmata_models::{Email, NewUser, Role, SchoolId};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "klassmata-cli")]
#[command(about = "KlassMata CLI - Administrative tools for KlassMata", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create a school
    CreateSchool {
        /// School name
        name: Option<String>,
    },
    /// Create a school admin, or a super admin with --super-admin
    CreateAdmin {
        /// School the admin manages
        #[arg(short = 's', long)]
        school_id: Option<Uuid>,

        /// First name of the admin
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name of the admin
        #[arg(short = 'l', long)]
        last_name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,

        /// Create a platform-wide super admin
        #[arg(long)]
        super_admin: bool,
    },
}

fn prompt_if_missing(value: Option<String>, prompt: &str) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Input::new()
            .with_prompt(prompt)
            .interact_text()
            .with_context(|| format!("Failed to read {}", prompt.to_lowercase())),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = init_db_pool(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Migrate => {
            run_migrations(&pool).await.context("Migration failed")?;
            println!("✅ Migrations applied");
        }
        Commands::CreateSchool { name } => {
            let name = prompt_if_missing(name, "School name")?;
            let name = name.trim();
            if name.is_empty() {
                bail!("School name must not be empty");
            }

            let school = PgInviteStore::new(pool).create_school(name).await?;
            println!("\n✅ School created successfully!");
            println!("   ID: {}", school.id);
            println!("   Name: {}", school.name);
        }
        Commands::CreateAdmin {
            school_id,
            first_name,
            last_name,
            email,
            password,
            super_admin,
        } => {
            let store = PgInviteStore::new(pool);
            let school_id = school_id.map(SchoolId::from_uuid);

            let role = if super_admin { Role::SuperAdmin } else { Role::Admin };
            if role == Role::Admin {
                let Some(id) = school_id else {
                    bail!("--school-id is required for a school admin");
                };
                if store.find_school(id).await?.is_none() {
                    bail!("School {} does not exist", id);
                }
            }

            let first_name = prompt_if_missing(first_name, "First name")?;
            let last_name = prompt_if_missing(last_name, "Last name")?;
            let email = prompt_if_missing(email, "Email address")?;
            let email = Email::new(&email).map_err(|e| anyhow!("{}", e))?;

            let password = match password {
                Some(password) => password,
                None => Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords don't match")
                    .interact()
                    .context("Failed to read password")?,
            };
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                bail!(
                    "Password must be at least {} characters",
                    MIN_PASSWORD_LENGTH
                );
            }

            let password_hash = hash_password_async(password)
                .await
                .map_err(|e| anyhow!("{}", e))?;

            let account = store
                .create_user(NewUser {
                    email,
                    first_name,
                    last_name,
                    role,
                    school_id,
                    password_hash,
                })
                .await?;

            println!("\n✅ {} created successfully!", role);
            println!("   ID: {}", account.id);
            println!("   Email: {}", account.email);
            println!("   Name: {} {}", account.first_name, account.last_name);
        }
    }

    Ok(())
}
