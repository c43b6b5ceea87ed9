//! Interactive count prompts.
//!
//! Counts are read as whitespace-separated tokens, so both values may come on
//! one line or on separate lines. Anything that is not a non-negative integer
//! is fatal; there is no re-prompt.

use crate::error::CliError;
use permalloc_core::builder::GraphConfig;
use std::collections::VecDeque;
use std::io::{BufRead, Write};

pub const RESOURCE_PROMPT: &str = "Enter number of Resource nodes: ";
pub const PROCESS_PROMPT: &str = "Enter number of Process nodes: ";

/// Splits a reader into whitespace-separated tokens, a line at a time.
/// Tokens are raw bytes; decoding happens where the token is parsed.
pub struct TokenReader<R> {
    reader: R,
    pending: VecDeque<Vec<u8>>,
}

impl<R: BufRead> TokenReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
        }
    }

    /// The next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Vec<u8>>, CliError> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(Some(token));
            }
            let mut line = Vec::new();
            if self.reader.read_until(b'\n', &mut line)? == 0 {
                return Ok(None);
            }
            self.pending.extend(
                line.split(u8::is_ascii_whitespace)
                    .filter(|t| !t.is_empty())
                    .map(<[u8]>::to_vec),
            );
        }
    }
}

/// Print `prompt` and read one count.
pub fn prompt_count<R: BufRead, W: Write>(
    tokens: &mut TokenReader<R>,
    out: &mut W,
    prompt: &str,
    what: &'static str,
) -> Result<u32, CliError> {
    out.write_all(prompt.as_bytes())?;
    out.flush()?;
    let token = tokens
        .next_token()?
        .ok_or(CliError::MissingInput { what })?;
    std::str::from_utf8(&token)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| CliError::InputFormat {
            what,
            value: String::from_utf8_lossy(&token).into_owned(),
        })
}

/// Assemble the graph config, prompting for any count not given on the
/// command line.
pub fn resolve_config<R: BufRead, W: Write>(
    resources: Option<u32>,
    processes: Option<u32>,
    max_requests: u32,
    tokens: &mut TokenReader<R>,
    out: &mut W,
) -> Result<GraphConfig, CliError> {
    let resources = match resources {
        Some(n) => n,
        None => prompt_count(tokens, out, RESOURCE_PROMPT, "resource count")?,
    };
    let processes = match processes {
        Some(n) => n,
        None => prompt_count(tokens, out, PROCESS_PROMPT, "process count")?,
    };
    let config = GraphConfig::new(resources, processes).with_max_requests(max_requests);
    config.validate()?;
    Ok(config)
}
