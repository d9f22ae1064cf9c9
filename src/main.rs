// Entry point for the simplecoin demo binary.
// The ledger itself lives in the library; this file only plays the part of the
// people using it: it creates wallets, hands out the first coins, sends
// transfers between per-user ledgers and asks one of them to mine.
use clap::Parser;
use data_encoding::HEXLOWER;
use log::{error, warn};
use serde_json::json;
use simplecoin::core::short_key;
use simplecoin::{
    relay_transaction, Blockchain, Command, Opt, RelayOutcome, Transaction, Wallet, GLOBAL_CONFIG,
};
use std::process;
use std::sync::atomic::AtomicBool;

// The three users of the demo, in genesis order (coin 1, 2, 3)
const DEMO_USERS: [&str; 3] = ["Kamil", "Piotr", "Zofia"];

// A person with a wallet and their own copy of the ledger
struct User {
    wallet: Wallet,
    blockchain: Blockchain,
}

fn main() {
    let opt = Opt::parse();

    // I load the config file first so the log level from it applies
    if let Some(path) = &opt.config {
        if let Err(e) = GLOBAL_CONFIG.load_file(path) {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
    env_logger::Builder::new()
        .parse_filters(&GLOBAL_CONFIG.get().log_level)
        .init();
    if let Some(reason) = GLOBAL_CONFIG.env_error() {
        warn!("Ignoring environment configuration: {reason}");
    }

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Demo {
            difficulty,
            workers,
            json,
        } => {
            if let Some(difficulty) = difficulty {
                GLOBAL_CONFIG.set_difficulty(difficulty);
            }
            if let Some(workers) = workers {
                GLOBAL_CONFIG.set_workers(workers);
            }
            run_demo(json)?;
        }
        Command::Keygen { name } => {
            let wallet = Wallet::new(&name)?;
            println!("Name:       {}", wallet.get_name());
            println!("Address:    {}", wallet.get_address());
            println!("Public key: {}", HEXLOWER.encode(wallet.get_public_key()));
        }
    }
    Ok(())
}

fn run_demo(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let settings = GLOBAL_CONFIG.get();

    // The issuer only ever signs the genesis transfers
    let issuer = Wallet::new("BLOCKCHAIN")?;
    let wallets = DEMO_USERS
        .iter()
        .map(|name| Wallet::new(name))
        .collect::<Result<Vec<_>, _>>()?;
    let recipients: Vec<&[u8]> = wallets.iter().map(|w| w.get_public_key()).collect();
    let genesis_ledger = Blockchain::with_initial_coins(&issuer, &recipients)?;

    // Every user starts from the same genesis block
    let mut users: Vec<User> = wallets
        .into_iter()
        .map(|wallet| User {
            wallet,
            blockchain: genesis_ledger.clone(),
        })
        .collect();

    for user in &users {
        print_balance(&users[1].blockchain, &user.wallet);
    }
    println!("----");

    // Piotr (coin 2) pays Kamil, then Zofia tries to spend the same coin
    send(&mut users, 1, 0, 2, settings.relay_probability)?;
    send(&mut users, 2, 0, 2, settings.relay_probability)?;
    println!("----");

    let miner = &mut users[1];
    let block = miner.blockchain.mine_with(
        settings.difficulty,
        settings.workers,
        &AtomicBool::new(false),
    )?;
    println!(
        "{} mined block {} (nonce {}): {}",
        miner.wallet.get_name(),
        block.get_index(),
        block.get_nonce(),
        block.get_hash_hex()
    );
    println!("----");

    let ledger = &users[1].blockchain;
    for user in &users {
        print_balance(ledger, &user.wallet);
    }
    println!(
        "Chain integrity: {}, genesis issuance valid: {}",
        ledger.check_integrity(),
        ledger.validate_initial_coins(issuer.get_public_key())
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&chain_to_json(ledger))?);
    }
    Ok(())
}

// I submit the transfer to the sender's own ledger first; only if it is accepted
// there do I relay it to every other user's ledger
fn send(
    users: &mut [User],
    from: usize,
    to: usize,
    coin_id: u64,
    relay_probability: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let recipient = users[to].wallet.get_public_key().to_vec();
    let recipient_name = users[to].wallet.get_name().to_string();
    let sender = &mut users[from];
    let signature = sender.wallet.sign_transfer(&recipient, coin_id)?;

    let transaction = match sender.blockchain.new_transaction(
        sender.wallet.get_public_key(),
        &recipient,
        coin_id,
        &signature,
    ) {
        Ok(tx) => {
            println!(
                "{}: coin {coin_id} sent to {recipient_name}",
                sender.wallet.get_name()
            );
            tx
        }
        Err(e) => {
            println!(
                "{}: coin {coin_id} not sent to {recipient_name}: {e}",
                sender.wallet.get_name()
            );
            return Ok(());
        }
    };

    relay(users, from, &transaction, relay_probability);
    Ok(())
}

fn relay(users: &mut [User], from: usize, transaction: &Transaction, probability: f64) {
    let names: Vec<String> = users
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != from)
        .map(|(_, peer)| peer.wallet.get_name().to_string())
        .collect();
    let peers = users
        .iter_mut()
        .enumerate()
        .filter(|(index, _)| *index != from)
        .map(|(_, peer)| &mut peer.blockchain);

    let outcomes = relay_transaction(peers, transaction, probability, &mut rand::thread_rng());
    for (name, outcome) in names.iter().zip(outcomes) {
        match outcome {
            RelayOutcome::Accepted => {}
            RelayOutcome::Dropped => println!("  {name} did not receive the transaction"),
            RelayOutcome::Rejected(e) => {
                println!("  {name} did not accept the transaction: {e}")
            }
        }
    }
}

fn print_balance(ledger: &Blockchain, wallet: &Wallet) {
    let coins = ledger.check_balance(wallet.get_public_key());
    println!(
        "{} ({}) owns {} coin(s): {:?}",
        wallet.get_name(),
        wallet.get_address(),
        coins.len(),
        coins
    );
}

fn chain_to_json(ledger: &Blockchain) -> serde_json::Value {
    let blocks: Vec<_> = ledger
        .get_blocks()
        .iter()
        .map(|block| {
            let transactions: Vec<_> = block
                .get_transactions()
                .iter()
                .map(|tx| {
                    json!({
                        "sender": short_key(tx.get_sender()),
                        "recipient": short_key(tx.get_recipient()),
                        "coin_id": tx.get_coin_id(),
                    })
                })
                .collect();
            json!({
                "index": block.get_index(),
                "timestamp": block.get_timestamp(),
                "previous_hash": HEXLOWER.encode(block.get_previous_hash()),
                "nonce": block.get_nonce(),
                "hash": block.get_hash_hex(),
                "transactions": transactions,
            })
        })
        .collect();
    json!({ "blocks": blocks })
}
