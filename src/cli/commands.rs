use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "simplecoin", about = "A minimal proof-of-work coin ledger")]
pub struct Opt {
    #[arg(
        long = "config",
        global = true,
        help = "TOML file with difficulty, workers, log_level and relay_probability"
    )]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        name = "demo",
        about = "Issue coins to Kamil, Piotr and Zofia, transfer, mine and report balances"
    )]
    Demo {
        #[arg(long, help = "Leading zero hex characters required in block hashes")]
        difficulty: Option<u32>,
        #[arg(long, help = "Threads used for the nonce search")]
        workers: Option<usize>,
        #[arg(long, help = "Print the resulting chain as JSON")]
        json: bool,
    },
    #[command(name = "keygen", about = "Generate a key pair and print its public key")]
    Keygen {
        #[arg(default_value = "wallet", help = "Name shown next to the key")]
        name: String,
    },
}
