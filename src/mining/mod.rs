pub mod driver;
pub mod engine;
pub mod report;

pub use driver::{RoundMode, run_rounds};
#[cfg(test)]
pub use engine::FixedClock;
pub use engine::{Clock, MineOutcome, MinedBlock, Miner};
pub use report::{BlockReport, OutputFormat, Reporter, StreamReporter};
