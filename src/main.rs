mod blockchain;
mod config;
mod error;
mod mining;

use dotenvy::dotenv;
use log::{error, info, warn};
use serde_json::json;
use std::io;
use std::process::ExitCode;
use std::thread;

use blockchain::reducer::field_map;
use blockchain::{
    Ledger, chain_with_difficulty, genesis_block, genesis_chain, with_block_fields,
    with_chain_fields,
};
use config::MinerConfig;
use error::Error;
use mining::{Miner, StreamReporter, run_rounds};

fn main() -> ExitCode {
    let _ = dotenv();
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Error> {
    let config = MinerConfig::from_env()?;

    let mut genesis = genesis_block(&config.genesis_name)?;
    if let Some(nonce) = config.start_nonce {
        genesis = with_block_fields(&genesis, field_map(json!({ "nonce": nonce })))?;
    }

    let mut chain = match config.difficulty {
        Some(diff) => chain_with_difficulty(&genesis, diff)?,
        None => genesis_chain(&genesis)?,
    };
    if let Some(max_nonce) = config.max_nonce {
        chain = with_chain_fields(&chain, field_map(json!({ "max_nonce": max_nonce })))?;
    }

    info!(
        "⛏️ Mining {} rounds at difficulty {} ({:?} mode, {} nonces per round)",
        config.rounds, chain.diff, config.mode, chain.max_nonce
    );

    let miner = Miner::new();
    if let Some(limit) = config.time_limit {
        let token = miner.cancel_token();
        thread::spawn(move || {
            thread::sleep(limit);
            warn!("time limit of {limit:?} reached, stopping");
            token.cancel();
        });
    }

    let mut reporter = StreamReporter::new(io::stdout().lock(), config.output);
    let summary = run_rounds(
        &miner,
        &genesis,
        &chain,
        config.rounds,
        config.mode,
        &mut reporter,
    )?;

    info!(
        "done: {} blocks mined, {} rounds exhausted{}",
        summary.mined.len(),
        summary.exhausted,
        if summary.cancelled { ", cancelled" } else { "" }
    );
    if let Some(ledger) = &summary.ledger {
        log_ledger(ledger);
    }
    Ok(())
}

fn log_ledger(ledger: &Ledger) {
    if ledger.is_empty() {
        info!("ledger is empty");
        return;
    }

    let mut walked = 0;
    let mut cursor = ledger.get(0);
    while let Some(block) = cursor {
        walked += 1;
        cursor = ledger.next_of(block);
    }

    let tip = ledger.last_block().and_then(|block| block.hash);
    info!(
        "ledger height={} linked={} valid={} tip={}",
        ledger.len(),
        walked,
        ledger.is_valid_chain(),
        tip.map(|hash| hash.to_hex()).unwrap_or_default()
    );
}
