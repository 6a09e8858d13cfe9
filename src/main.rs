// Entry point for the ledger command-line tool
use clap::Parser;
use log::{error, info, LevelFilter};
use rand::Rng;
use stake_ledger::core::monetary::conversions::format_units;
use stake_ledger::utils::{decode_fixed, derive_id, hex_encode};
use stake_ledger::{
    address_from_public_key, derive_keypair, Block, ChainConfig, Command, Ledger, Opt,
    Transaction, PUBLIC_KEY_LENGTH,
};
use std::path::PathBuf;
use std::process;

fn main() {
    // Info level shows accepted blocks without per-transaction noise
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.config, opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>) -> stake_ledger::Result<ChainConfig> {
    let config = match path {
        Some(path) => ChainConfig::load(path)?,
        None => ChainConfig::default(),
    }
    .with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn run_command(
    config_path: Option<PathBuf>,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    match command {
        Command::Keypair { secret } => {
            let secret = match secret {
                Some(secret) => secret,
                None => {
                    let entropy: [u8; 16] = rand::thread_rng().gen();
                    let phrase = hex_encode(&entropy);
                    println!("Secret phrase: {phrase}");
                    phrase
                }
            };
            let keypair = derive_keypair(&secret)?;
            println!("Public key: {}", hex_encode(keypair.public_key()));
            println!(
                "Address: {}",
                address_from_public_key(keypair.public_key(), config.account_suffix)
            );
        }
        Command::SignTransaction {
            secret,
            recipient,
            amount,
            fee,
            timestamp,
            second_secret,
        } => {
            let keypair = derive_keypair(&secret)?;
            let mut tx = Transaction::new_payment(&keypair, &recipient, amount, fee, timestamp)?;
            if let Some(second_secret) = second_secret {
                tx.sign_second(&derive_keypair(&second_secret)?)?;
            }
            println!("{}", serde_json::to_string_pretty(&tx.to_json()?)?);
        }
        Command::VerifyTransaction {
            json,
            second_public_key,
        } => {
            let json = match json.strip_prefix('@') {
                Some(path) => std::fs::read_to_string(path)?,
                None => json,
            };
            let tx = Transaction::from_json_str(&json)?;

            let id = tx.get_id()?;
            if !tx.verify_id()? {
                return Err(format!(
                    "Transaction id {id} does not match its contents ({})",
                    derive_id(&tx.get_hash()?)
                )
                .into());
            }
            if !tx.verify() {
                return Err(format!("Transaction {id} signature not valid").into());
            }
            if let Some(public_key) = second_public_key {
                let public_key =
                    decode_fixed::<PUBLIC_KEY_LENGTH>("secondPublicKey", &public_key)?;
                if !tx.verify_second_signature(&public_key) {
                    return Err(
                        format!("Transaction {id} second signature not valid").into(),
                    );
                }
            }
            println!("Transaction {id} is valid");
        }
        Command::Genesis {
            secret,
            timestamp,
            allocations,
        } => {
            let keypair = derive_keypair(&secret)?;
            let transactions = allocations
                .iter()
                .map(|a| Transaction::new_payment(&keypair, &a.recipient, a.amount, 0, timestamp))
                .collect::<stake_ledger::Result<Vec<_>>>()?;

            let block = Block::forge(None, timestamp, transactions, vec![], &keypair)?;
            let mut ledger = Ledger::in_memory(config);
            ledger.accept(block)?;

            let tip = ledger.tip().ok_or("Genesis block missing after acceptance")?;
            println!("{}", serde_json::to_string_pretty(&tip.to_json()?)?);

            let generator = ledger
                .get_account_by_public_key(keypair.public_key())
                .ok_or("Generator account missing after genesis")?;
            info!(
                "Generator {} balance: {}",
                generator.get_id(),
                format_units(generator.get_balance())
            );
            let mut accounts: Vec<_> = ledger
                .accounts()
                .iter()
                .filter(|a| a.get_id() != generator.get_id())
                .collect();
            accounts.sort_by(|a, b| a.get_id().cmp(b.get_id()));
            for account in accounts {
                info!(
                    "{} balance: {}",
                    account.get_id(),
                    format_units(account.get_balance())
                );
            }
        }
    }
    Ok(())
}
