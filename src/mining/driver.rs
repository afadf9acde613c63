use log::{debug, info, warn};
use std::str::FromStr;

use super::{BlockReport, Clock, MineOutcome, MinedBlock, Miner, Reporter};
use crate::blockchain::{Block, Chain, Ledger};
use crate::error::{ConfigError, Error};

/// Where each round starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundMode {
    /// Every round mines from the same genesis block and chain.
    #[default]
    Restart,
    /// Each round mines the head produced by the previous round.
    Continue,
}

impl FromStr for RoundMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restart" => Ok(RoundMode::Restart),
            "continue" => Ok(RoundMode::Continue),
            _ => Err(ConfigError::Invalid {
                key: "MINER_MODE",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub mined: Vec<MinedBlock>,
    pub exhausted: usize,
    pub cancelled: bool,
    /// History of sealed blocks. Only kept in [`RoundMode::Continue`], where
    /// rounds build on each other.
    pub ledger: Option<Ledger>,
}

/// Mine `rounds` rounds starting from `genesis`/`chain`, reporting every hit.
pub fn run_rounds<C: Clock>(
    miner: &Miner<C>,
    genesis: &Block,
    chain: &Chain,
    rounds: usize,
    mode: RoundMode,
    reporter: &mut dyn Reporter,
) -> Result<RunSummary, Error> {
    let mut summary = RunSummary {
        mined: Vec::with_capacity(rounds),
        exhausted: 0,
        cancelled: false,
        ledger: match mode {
            RoundMode::Continue => Some(Ledger::new(chain.target)),
            RoundMode::Restart => None,
        },
    };

    let mut candidate = genesis.clone();
    let mut tip = chain.clone();

    for round in 0..rounds {
        let outcome = match mode {
            RoundMode::Restart => miner.mine(genesis, chain),
            RoundMode::Continue => miner.mine(&candidate, &tip),
        };

        match outcome {
            MineOutcome::Found(mined) => {
                let report = BlockReport::from(&*mined);
                info!(
                    "round {} -> {} #{} hash={} nonce={}",
                    round + 1,
                    report.name,
                    report.block_num,
                    report.hash,
                    report.nonce
                );
                reporter.report(&report)?;

                if let Some(ledger) = summary.ledger.as_mut() {
                    ledger.append(mined.sealed.clone())?;
                    candidate = mined.next.clone();
                    tip = mined.chain.clone();
                }
                summary.mined.push(*mined);
            }
            MineOutcome::Exhausted { attempts, elapsed } => {
                warn!(
                    "round {} produced no block ({} attempts in {:.3?})",
                    round + 1,
                    attempts,
                    elapsed
                );
                summary.exhausted += 1;
            }
            MineOutcome::Cancelled { attempts, elapsed } => {
                warn!(
                    "round {} cancelled after {} attempts in {:.3?}",
                    round + 1,
                    attempts,
                    elapsed
                );
                summary.cancelled = true;
                break;
            }
        }
    }

    debug!(
        "run finished: mined={} exhausted={} cancelled={}",
        summary.mined.len(),
        summary.exhausted,
        summary.cancelled
    );
    Ok(summary)
}
