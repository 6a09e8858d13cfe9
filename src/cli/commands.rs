use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// A genesis allocation: recipient account id and amount in units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationArg {
    pub recipient: String,
    pub amount: u64,
}

impl FromStr for AllocationArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (recipient, amount) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid allocation: {s}. Use RECIPIENT:AMOUNT"))?;
        if recipient.is_empty() {
            return Err(format!("Invalid allocation: {s}. Recipient is empty"));
        }
        let amount = amount
            .parse::<u64>()
            .map_err(|e| format!("Invalid allocation amount in {s}: {e}"))?;
        Ok(AllocationArg {
            recipient: recipient.to_string(),
            amount,
        })
    }
}

#[derive(Debug, Parser)]
#[command(name = "stake-ledger")]
pub struct Opt {
    #[arg(long, global = true, help = "Chain parameters as a TOML file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        name = "keypair",
        about = "Derive a keypair from a secret phrase, or generate a new phrase"
    )]
    Keypair {
        #[arg(long, help = "Secret phrase; a random one is generated when omitted")]
        secret: Option<String>,
    },
    #[command(name = "sign-transaction", about = "Build and sign a payment")]
    SignTransaction {
        #[arg(long, help = "Sender's secret phrase")]
        secret: String,
        #[arg(long, help = "Recipient account id, with its marker suffix")]
        recipient: String,
        #[arg(long)]
        amount: u64,
        #[arg(long, default_value_t = 0)]
        fee: u64,
        #[arg(long, default_value_t = 0)]
        timestamp: u32,
        #[arg(long, help = "Second secret phrase for the optional second signature")]
        second_secret: Option<String>,
    },
    #[command(
        name = "verify-transaction",
        about = "Check the signature of a transaction in JSON form"
    )]
    VerifyTransaction {
        #[arg(help = "Transaction JSON, or @path to read it from a file")]
        json: String,
        #[arg(long, help = "Hex public key that must carry the second signature")]
        second_public_key: Option<String>,
    },
    #[command(
        name = "genesis",
        about = "Forge a genesis block and apply it to an empty ledger"
    )]
    Genesis {
        #[arg(long, help = "Generator's secret phrase")]
        secret: String,
        #[arg(long, default_value_t = 0)]
        timestamp: u32,
        #[arg(long = "fund", help = "RECIPIENT:AMOUNT paid by the generator; repeatable")]
        allocations: Vec<AllocationArg>,
    },
}
