use std::{error::Error, process::ExitCode};

use clap::Parser;
use ledgerdb::{
    accounts,
    config::{CliArgs, Command, Config, LoggingConfig, ReportKind},
    connection::{connector_for, ConnectionProvider},
    render, reports, transactions, AccountType, NewAccount, NewTransaction, TransactionType,
};
use ledgerdb_core::timestamp;
use rust_decimal_macros::dec;
use time::Duration;
use tracing_subscriber::EnvFilter;

const SAMPLE_ACCOUNT: &str = "1234567890";

fn main() -> ExitCode {
    let cli = CliArgs::parse();
    let config = Config::load(&cli);
    init_logging(&config.logging);

    let mut provider = ConnectionProvider::new(connector_for(&config.database));
    let result = run(&mut provider, cli.command);
    provider.release();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(provider: &mut ConnectionProvider, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Demo => demo(provider),
        Command::CreateAccount {
            account_number,
            balance,
            owner_name,
            account_type,
        } => {
            let account = NewAccount::new(account_number, balance, owner_name, account_type);
            let created = accounts::create_account(provider.acquire()?, &account)?;
            println!("{}", render::account(&created));
            Ok(())
        }
        Command::CreateTransaction {
            account_number,
            amount,
            description,
            transaction_type,
        } => {
            let transaction = NewTransaction::new(account_number, amount, transaction_type, description);
            let created = transactions::create_transaction(provider.acquire()?, &transaction)?;
            println!("{}", render::transactions(&[created]));
            Ok(())
        }
        Command::Account { account_number } => {
            match accounts::account_by_number(provider.acquire()?, &account_number)? {
                Some(account) => println!("{}", render::account(&account)),
                None => println!("No account with number {}", account_number),
            }
            Ok(())
        }
        Command::Transactions { account_number } => {
            let history = transactions::transactions_by_account(provider.acquire()?, &account_number)?;
            println!("{}", render::transactions(&history));
            Ok(())
        }
        Command::Report { kind, json } => report(provider, kind, json),
    }
}

fn report(provider: &mut ConnectionProvider, kind: ReportKind, json: bool) -> Result<(), Box<dyn Error>> {
    let session = provider.acquire()?;
    let out = match kind {
        ReportKind::Join => {
            let rows = reports::account_transactions(session)?;
            if json { render::json(&rows)? } else { render::account_transactions(&rows) }
        }
        ReportKind::Latest => {
            let latest = reports::latest_transactions(session)?;
            if json { render::json(&latest)? } else { render::latest_transactions(&latest) }
        }
        ReportKind::Balances => {
            let balances = reports::account_balances(session)?;
            if json { render::json(&balances)? } else { render::account_balances(&balances) }
        }
    };
    println!("{}", out);
    Ok(())
}

/// Seeds the sample account unless it already exists, then prints all three
/// reports.
fn demo(provider: &mut ConnectionProvider) -> Result<(), Box<dyn Error>> {
    if accounts::account_by_number(provider.acquire()?, SAMPLE_ACCOUNT)?.is_some() {
        tracing::info!(account_number = SAMPLE_ACCOUNT, "Sample account already present, skipping seed");
    } else {
        seed(provider)?;
        println!("Test data created successfully");
    }

    println!("\nAccount Transactions:");
    report(provider, ReportKind::Join, false)?;
    println!("Latest Transactions:");
    report(provider, ReportKind::Latest, false)?;
    println!("Account Balances:");
    report(provider, ReportKind::Balances, false)
}

fn seed(provider: &mut ConnectionProvider) -> Result<(), Box<dyn Error>> {
    let opened = timestamp::now();

    accounts::create_account(
        provider.acquire()?,
        &NewAccount::new(SAMPLE_ACCOUNT, dec!(1000.00), "Test User", AccountType::Savings).created_at(opened),
    )?;
    transactions::create_transaction(
        provider.acquire()?,
        &NewTransaction::new(SAMPLE_ACCOUNT, dec!(500.00), TransactionType::Deposit, "Initial deposit").at(opened),
    )?;
    transactions::create_transaction(
        provider.acquire()?,
        &NewTransaction::new(SAMPLE_ACCOUNT, dec!(250.00), TransactionType::Withdrawal, "Groceries")
            .at(opened + Duration::seconds(1)),
    )?;
    Ok(())
}
