use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use super::MinedBlock;
use crate::blockchain::Hash256;
use crate::error::ConfigError;

/// What gets emitted after each successful round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockReport {
    pub name: String,
    pub hash: Hash256,
    pub block_num: u64,
    pub nonce: u64,
    pub attempts: u64,
    pub elapsed_ms: f64,
}

impl From<&MinedBlock> for BlockReport {
    fn from(mined: &MinedBlock) -> Self {
        Self {
            name: mined.sealed.name.clone(),
            hash: mined.hash,
            block_num: mined.sealed.block_num,
            nonce: mined.sealed.nonce,
            attempts: mined.attempts,
            elapsed_ms: mined.elapsed.as_secs_f64() * 1000.0,
        }
    }
}

impl fmt::Display for BlockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block Name: {}", self.name)?;
        writeln!(f, "Block Hash: {}", self.hash)?;
        writeln!(f, "BlockNo: {}", self.block_num)?;
        writeln!(f, "Hashes: {}", self.nonce)?;
        writeln!(f, "Elapsed: {:.3} ms", self.elapsed_ms)?;
        write!(f, "--------------")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ConfigError::Invalid {
                key: "MINER_OUTPUT",
                value: s.to_string(),
            }),
        }
    }
}

/// Sink for mined-block reports.
pub trait Reporter {
    fn report(&mut self, report: &BlockReport) -> io::Result<()>;
}

/// Writes reports to any `Write` in the configured format.
pub struct StreamReporter<W: Write> {
    out: W,
    format: OutputFormat,
}

impl<W: Write> StreamReporter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }
}

impl<W: Write> Reporter for StreamReporter<W> {
    fn report(&mut self, report: &BlockReport) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.out, "{report}")?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, report)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()
    }
}
