use std::error::Error;

use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{
    AccountKind, Engine, FinancerSnapshot, MoneyCents, NewAccountCmd, TransactionListFilter,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

mod settings;

mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub role: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

const ADMIN_ROLE: &str = "admin";

#[derive(Parser, Debug)]
#[command(name = "saldo_admin")]
#[command(about = "Admin utilities for Saldo (bootstrap, Financer import, balance checks)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    ///
    /// Overrides `database.url` from `saldo.toml` / `SALDO__DATABASE__URL`.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply or inspect schema migrations.
    Migrate(MigrateArgs),
    User(User),
    Account(Account),
    /// Replace a user's data with a Financer JSON export.
    Import(ImportArgs),
    Transactions(TransactionsArgs),
    Balances(Balances),
}

#[derive(Args, Debug)]
struct MigrateArgs {
    #[arg(value_enum, default_value_t = MigrateAction::Up)]
    action: MigrateAction,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MigrateAction {
    Up,
    /// Roll back the last migration.
    Down,
    /// Drop every table and migrate from scratch.
    Fresh,
    Status,
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    id: String,
    /// Grant the administrator role (required for imports).
    #[arg(long)]
    admin: bool,
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create(AccountCreateArgs),
    List(UserArg),
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
    /// bank, credit_card, wallet, investment or loan.
    #[arg(long, value_parser = parse_account_kind)]
    kind: AccountKind,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    initial_balance: MoneyCents,
}

#[derive(Args, Debug)]
struct UserArg {
    #[arg(long)]
    user: String,
}

#[derive(Args, Debug)]
struct ImportArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    file: std::path::PathBuf,
    /// Only check the document; nothing is written.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct TransactionsArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    month: Option<u32>,
    #[arg(long)]
    account: Option<Uuid>,
    #[arg(long)]
    limit: Option<u64>,
}

#[derive(Args, Debug)]
struct Balances {
    #[command(subcommand)]
    command: BalancesCommand,
}

#[derive(Subcommand, Debug)]
enum BalancesCommand {
    /// Report accounts whose balance disagrees with their transactions.
    Check(UserArg),
    /// Repair drifted balances.
    Recompute(UserArg),
}

fn parse_account_kind(raw: &str) -> Result<AccountKind, String> {
    AccountKind::try_from(raw).map_err(|err| err.to_string())
}

async fn run_migration(
    db: &DatabaseConnection,
    action: MigrateAction,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match action {
        MigrateAction::Up => migration::Migrator::up(db, None).await?,
        MigrateAction::Down => migration::Migrator::down(db, Some(1)).await?,
        MigrateAction::Fresh => migration::Migrator::fresh(db).await?,
        MigrateAction::Status => migration::Migrator::status(db).await?,
    }
    tracing::info!(?action, "migration finished");
    Ok(())
}

async fn find_user(
    db: &DatabaseConnection,
    id: &str,
) -> Result<Option<users::Model>, Box<dyn Error + Send + Sync>> {
    Ok(users::Entity::find_by_id(id.to_string()).one(db).await?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "saldo_admin={level},engine={level}",
            level = settings.log.level
        ))
        .init();

    let database_url = cli.database_url.unwrap_or(settings.database.url);
    let db = Database::connect(&database_url).await?;
    // Every other command works on an up-to-date schema.
    if !matches!(cli.command, Command::Migrate(_)) {
        migration::Migrator::up(&db, None).await?;
    }
    let engine = Engine::builder().database(db.clone()).build().await?;

    match cli.command {
        Command::Migrate(args) => run_migration(&db, args.action).await?,
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            if find_user(&db, &args.id).await?.is_some() {
                eprintln!("user already exists: {}", args.id);
                std::process::exit(1);
            }

            let role = if args.admin { ADMIN_ROLE } else { "user" };
            let user = users::ActiveModel {
                id: Set(args.id.clone()),
                role: Set(role.to_string()),
            };
            users::Entity::insert(user).exec(&db).await?;
            tracing::debug!(user_id = %args.id, role, "user created");

            println!("created user: {} ({role})", args.id);
        }
        Command::Account(Account {
            command: AccountCommand::Create(args),
        }) => {
            if find_user(&db, &args.owner).await?.is_none() {
                eprintln!("user not found: {}", args.owner);
                std::process::exit(1);
            }

            let account = engine
                .create_account(
                    NewAccountCmd::new(&args.owner, &args.name, args.kind)
                        .initial_balance_minor(args.initial_balance.cents()),
                )
                .await?;
            println!("created account: {} ({})", account.name, account.id);
        }
        Command::Account(Account {
            command: AccountCommand::List(args),
        }) => {
            for account in engine.accounts(&args.user).await? {
                println!(
                    "{}  {:<12} {:>12}  {}",
                    account.id,
                    account.kind.as_str(),
                    MoneyCents::new(account.balance_minor).to_string(),
                    account.name
                );
            }
        }
        Command::Import(args) => {
            let Some(user) = find_user(&db, &args.user).await? else {
                eprintln!("user not found: {}", args.user);
                std::process::exit(1);
            };
            if user.role != ADMIN_ROLE {
                eprintln!("import requires an administrator: {}", args.user);
                std::process::exit(1);
            }

            let raw = std::fs::read_to_string(&args.file)?;
            let snapshot = FinancerSnapshot::from_json(&raw)?;
            if args.dry_run {
                snapshot.validate()?;
                println!(
                    "snapshot ok: {} account(s), {} transaction(s)",
                    snapshot.accounts.len(),
                    snapshot.transactions.len()
                );
                return Ok(());
            }
            tracing::info!(user_id = %args.user, file = %args.file.display(), "importing snapshot");
            let summary = engine
                .import_financer_snapshot(&args.user, &snapshot)
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Transactions(args) => {
            let filter = TransactionListFilter {
                year: args.year,
                month: args.month,
                account_id: args.account,
                limit: args.limit,
            };
            for tx in engine.transactions(&args.user, &filter).await? {
                println!(
                    "{}  {}  {:<8} {:>12}  {}",
                    tx.id,
                    tx.date.format("%Y-%m-%d"),
                    tx.kind().as_str(),
                    MoneyCents::new(tx.amount_minor).to_string(),
                    tx.description
                );
            }
        }
        Command::Balances(Balances {
            command: BalancesCommand::Check(args),
        }) => {
            let found = engine.verify_balances(&args.user).await?;
            if found.is_empty() {
                println!("all balances consistent");
            } else {
                for item in &found {
                    println!(
                        "{} {}: stored {} expected {}",
                        item.account_id,
                        item.name,
                        MoneyCents::new(item.stored_minor),
                        MoneyCents::new(item.expected_minor)
                    );
                }
                std::process::exit(1);
            }
        }
        Command::Balances(Balances {
            command: BalancesCommand::Recompute(args),
        }) => {
            let fixed = engine.recompute_balances(&args.user).await?;
            println!("recomputed balances: {fixed} account(s) fixed");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_defaults_to_up() {
        let cli = Cli::try_parse_from(["saldo_admin", "migrate"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Migrate(MigrateArgs {
                action: MigrateAction::Up
            })
        ));

        let cli = Cli::try_parse_from(["saldo_admin", "migrate", "down"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Migrate(MigrateArgs {
                action: MigrateAction::Down
            })
        ));
        assert!(Cli::try_parse_from(["saldo_admin", "migrate", "sideways"]).is_err());
    }

    #[tokio::test]
    async fn migrate_actions_drive_the_schema() {
        let db = Database::connect("sqlite::memory:").await.unwrap();

        run_migration(&db, MigrateAction::Up).await.unwrap();
        assert!(find_user(&db, "root").await.unwrap().is_none());
        run_migration(&db, MigrateAction::Status).await.unwrap();

        run_migration(&db, MigrateAction::Down).await.unwrap();
        assert!(find_user(&db, "root").await.is_err());

        run_migration(&db, MigrateAction::Fresh).await.unwrap();
        assert!(find_user(&db, "root").await.unwrap().is_none());
    }
}
