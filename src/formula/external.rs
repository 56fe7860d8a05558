use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::debug;
use serde::Deserialize;

use super::exchange::write_ms;
use super::{DecomposerError, DecompositionRequest, FormulaCandidate, FormulaDecomposer};
use crate::chemistry::Formula;

/// Exit status a decomposer uses to report a temporary failure (`EX_TEMPFAIL`)
pub const EXIT_TEMPFAIL: i32 = 75;

/// Placeholder in the argument list replaced by the `.ms` input path
pub const INPUT_PLACEHOLDER: &str = "{input}";

#[derive(Debug, Deserialize)]
struct OutputRow {
    formula: String,
    score: f64,
}

/// Runs an external mass-decomposition program once per feature.
///
/// The feature is written to a temporary `.ms` file whose path replaces
/// `{input}` in the arguments (or is appended when no argument contains it).
/// The program prints `formula,score` CSV with a header on stdout. Exit status
/// 75 is a transient failure; any other non-zero status is fatal.
#[derive(Debug, Clone)]
pub struct ExternalDecomposer {
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalDecomposer {
    /// Decomposer invoking `program` with `args`
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command_args(&self, input: &str) -> Vec<String> {
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace(INPUT_PLACEHOLDER, input))
            .collect();
        if !self.args.iter().any(|a| a.contains(INPUT_PLACEHOLDER)) {
            args.push(input.to_string());
        }
        args
    }
}

impl FormulaDecomposer for ExternalDecomposer {
    fn decompose(
        &self,
        request: &DecompositionRequest<'_>,
    ) -> Result<Vec<FormulaCandidate>, DecomposerError> {
        let mut input = tempfile::Builder::new()
            .prefix("lipidann-")
            .suffix(".ms")
            .tempfile()?;
        write_ms(&mut input, request)?;
        input.flush()?;

        let path = input.path().to_string_lossy().into_owned();
        let args = self.command_args(&path);
        debug!("Running {} {:?}", self.program.display(), args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                DecomposerError::Fatal(format!("cannot run {}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return match output.status.code() {
                Some(EXIT_TEMPFAIL) => Err(DecomposerError::Transient(stderr)),
                Some(code) => Err(DecomposerError::Fatal(format!("exit status {code}: {stderr}"))),
                None => Err(DecomposerError::Fatal(format!("terminated by signal: {stderr}"))),
            };
        }

        parse_output(&output.stdout)
    }
}

/// Parse `formula,score` CSV output
pub fn parse_output(stdout: &[u8]) -> Result<Vec<FormulaCandidate>, DecomposerError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(stdout);

    let mut candidates = Vec::new();
    for row in reader.deserialize::<OutputRow>() {
        let row = row?;
        let formula: Formula = row
            .formula
            .parse()
            .map_err(|e| DecomposerError::Fatal(format!("decomposer returned {e}")))?;
        candidates.push(FormulaCandidate {
            formula,
            score: row.score,
            mass_error_ppm: None,
        });
    }
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(candidates)
}
