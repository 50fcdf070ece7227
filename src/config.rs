use clap::{Parser, Subcommand, ValueEnum};
use ledgerdb_core::{AccountType, TransactionType};
use rust_decimal::Decimal;
use serde::Deserialize;

pub const ENV_HOST: &str = "DB_HOST";
pub const ENV_PORT: &str = "DB_PORT";
pub const ENV_NAME: &str = "DB_NAME";
pub const ENV_USER: &str = "DB_USER";
pub const ENV_PASSWORD: &str = "DB_PASS";

#[derive(Parser, Debug)]
#[command(name = "ledgerdb", about = "LedgerDB - accounts, transactions and ledger reports")]
pub struct CliArgs {
    /// Path to config file
    #[arg(short, long, default_value = "ledgerdb.toml")]
    pub config: String,

    /// Storage backend (overrides config file)
    #[arg(short, long, value_enum)]
    pub backend: Option<Backend>,

    /// Log level (overrides config file)
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Seed the sample account and its transactions, then print every report
    Demo,
    /// Create an account
    CreateAccount {
        account_number: String,
        #[arg(allow_negative_numbers = true)]
        balance: Decimal,
        owner_name: String,
        #[arg(long = "type", default_value = "SAVINGS")]
        account_type: AccountType,
    },
    /// Record a transaction against an account number
    CreateTransaction {
        account_number: String,
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
        description: String,
        #[arg(long = "type", default_value = "DEPOSIT")]
        transaction_type: TransactionType,
    },
    /// Show one account
    Account { account_number: String },
    /// List an account's transactions, most recent first
    Transactions { account_number: String },
    /// Run one of the ledger reports
    Report {
        #[arg(value_enum)]
        kind: ReportKind,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Every account paired with each of its transactions
    Join,
    /// The most recent transaction of each account
    Latest,
    /// Sum of transaction amounts per account
    Balances,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Postgres,
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: Backend,
    pub host: String,
    pub port: u16,
    pub name: String,
    /// Unset means the server's default user.
    pub user: Option<String>,
    pub password: Option<String>,
    pub sqlite_path: String,
    /// Run `CREATE TABLE IF NOT EXISTS` for both tables on connect.
    pub bootstrap_schema: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            backend: Backend::Postgres,
            host: "localhost".to_string(),
            port: 5432,
            name: "financial_db".to_string(),
            user: None,
            password: None,
            sqlite_path: "ledger.db".to_string(),
            bootstrap_schema: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Defaults, then the config file, then `DB_*` variables, then CLI flags.
    pub fn load(cli: &CliArgs) -> Self {
        let contents = std::fs::read_to_string(&cli.config).ok();
        let mut config = Self::from_toml(contents.as_deref());
        config.apply_env(|key| std::env::var(key).ok());
        config.apply_cli(cli);
        config
    }

    fn from_toml(contents: Option<&str>) -> Self {
        match contents {
            Some(contents) => toml::from_str(contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Config::default()
            }),
            None => Config::default(),
        }
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let db = &mut self.database;
        if let Some(host) = var(ENV_HOST) {
            db.host = host;
        }
        if let Some(port) = var(ENV_PORT) {
            match port.parse() {
                Ok(port) => db.port = port,
                Err(_) => eprintln!("Warning: ignoring invalid {}={}", ENV_PORT, port),
            }
        }
        if let Some(name) = var(ENV_NAME) {
            db.name = name;
        }
        if let Some(user) = var(ENV_USER) {
            db.user = Some(user);
        }
        if let Some(password) = var(ENV_PASSWORD) {
            db.password = Some(password);
        }
    }

    fn apply_cli(&mut self, cli: &CliArgs) {
        if let Some(backend) = cli.backend {
            self.database.backend = backend;
        }
        if let Some(ref level) = cli.log_level {
            self.logging.level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_toml(None);
        assert_eq!(config.database.backend, Backend::Postgres);
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.name, "financial_db");
        assert!(config.database.user.is_none());
        assert!(config.database.password.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(Some(
            "
            [database]
            backend = \"sqlite\"
            sqlite_path = \"/tmp/ledger.db\"

            [logging]
            json = true
            ",
        ));
        assert_eq!(config.database.backend, Backend::Sqlite);
        assert_eq!(config.database.sqlite_path, "/tmp/ledger.db");
        assert_eq!(config.database.port, 5432);
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unparsable_file_falls_back_to_defaults() {
        let config = Config::from_toml(Some("[database\nport = 1"));
        assert_eq!(config.database.port, 5432);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::from_toml(Some("[database]\nhost = \"db.internal\"\nport = 6000"));
        config.apply_env(env(&[
            (ENV_HOST, "10.0.0.5"),
            (ENV_NAME, "ledger"),
            (ENV_USER, "app"),
            (ENV_PASSWORD, "secret"),
        ]));
        assert_eq!(config.database.host, "10.0.0.5");
        assert_eq!(config.database.port, 6000);
        assert_eq!(config.database.name, "ledger");
        assert_eq!(config.database.user.as_deref(), Some("app"));
        assert_eq!(config.database.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_invalid_env_port_is_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[(ENV_PORT, "not-a-port")]));
        assert_eq!(config.database.port, 5432);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = CliArgs::parse_from(["ledgerdb", "--backend", "memory", "-l", "debug", "demo"]);
        let mut config = Config::default();
        config.apply_cli(&cli);
        assert_eq!(config.database.backend, Backend::Memory);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_cli_parses_typed_arguments() {
        let cli = CliArgs::parse_from([
            "ledgerdb",
            "create-transaction",
            "1234567890",
            "250.00",
            "Groceries",
            "--type",
            "withdrawal",
        ]);
        match cli.command {
            Command::CreateTransaction { amount, transaction_type, .. } => {
                assert_eq!(amount.to_string(), "250.00");
                assert_eq!(transaction_type, TransactionType::Withdrawal);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_accepts_negative_amounts() {
        let cli = CliArgs::parse_from(["ledgerdb", "create-transaction", "1234567890", "-42.50", "Refund reversal"]);
        match cli.command {
            Command::CreateTransaction { amount, .. } => assert_eq!(amount.to_string(), "-42.50"),
            other => panic!("unexpected command {:?}", other),
        }

        let cli = CliArgs::parse_from(["ledgerdb", "create-account", "9", "-5", "Overdrawn", "--type", "credit"]);
        match cli.command {
            Command::CreateAccount { balance, account_type, .. } => {
                assert_eq!(balance.to_string(), "-5");
                assert_eq!(account_type, AccountType::Credit);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
