//! Per-operation outcomes, reports and the saved results file

use serde::{ Deserialize, Serialize };
use std::{
    fmt,
    fs::File,
    io::{ self, BufWriter, Write },
    path::{ Path, PathBuf },
};

use crate::{ config::RetentionPolicy, registry::Module };

/// Outcome of one operation, stored at the same index as the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestResult
{
    pub passed: bool,
    /// Last value observed by the operation, in the operation's unit. Zero for operations that do
    /// not measure anything.
    pub measured_value: i32,
    /// Duration of the last attempt
    pub elapsed_ms: u32,
}

impl TestResult
{
    /// Records one attempt of the operation
    ///
    /// Under [`RetentionPolicy::FirstPass`] a slot that has already passed keeps its measured
    /// value, even if this attempt failed.
    pub fn record(&mut self, passed: bool, measured_value: i32, elapsed_ms: u32, policy: RetentionPolicy)
    {
        self.elapsed_ms = elapsed_ms;

        match policy {
            RetentionPolicy::Latest => self.measured_value = measured_value,
            RetentionPolicy::FirstPass => {
                if !self.passed {
                    self.measured_value = measured_value;
                }
            },
        }

        self.passed = passed;
    }
}

/// Results of every operation of one module, index-parallel to its operation table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultBuffer
{
    results: Vec<TestResult>,
}

impl ResultBuffer
{
    /// A zeroed buffer with one slot per operation
    pub fn new(len: usize) -> Self
    {
        Self {
            results: vec![TestResult::default(); len],
        }
    }

    pub fn for_module(module: &Module) -> Self
    {
        Self::new(module.operations.len())
    }

    /// Zeroes every slot, re-arming the buffer for a new insertion
    pub fn reset(&mut self)
    {
        for result in self.results.iter_mut() {
            *result = TestResult::default();
        }
    }

    pub fn len(&self) -> usize
    {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TestResult>
    {
        self.results.get(index)
    }

    pub fn as_slice(&self) -> &[TestResult]
    {
        &self.results
    }

    pub fn as_mut_slice(&mut self) -> &mut [TestResult]
    {
        &mut self.results
    }

    pub fn all_passed(&self) -> bool
    {
        self.results.iter().all(|result| result.passed)
    }

    /// Index of the first slot that has not passed
    pub fn first_failure(&self) -> Option<usize>
    {
        self.results.iter().position(|result| !result.passed)
    }

    /// Writes the saved results format: the module name on the first line, then one
    /// `<passed> <measured> <elapsed_ms>` line per operation
    pub fn write_to<W: Write>(&self, name: &str, mut out: W) -> io::Result<()>
    {
        writeln!(out, "{}", name)?;

        for result in self.results.iter() {
            writeln!(out, "{} {} {}", result.passed, result.measured_value, result.elapsed_ms)?;
        }

        out.flush()
    }
}

impl From<Vec<TestResult>> for ResultBuffer
{
    fn from(this: Vec<TestResult>) -> Self
    {
        Self { results: this }
    }
}

/// A results file read back from storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedResults
{
    pub module_name: String,
    pub results: ResultBuffer,
}

#[derive(Debug)]
pub enum LoadResultsError
{
    Io(io::Error),
    /// A line (indexed from 1) is not in the saved results format
    InvalidLine
    {
        line: usize,
        mesg: &'static str,
    },
}

impl fmt::Display for LoadResultsError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::Io(io_err) => write!(f, "Failed to read results. {}", io_err),
            Self::InvalidLine { line, mesg } => write!(f, "Invalid results file at line {}: {}", line, mesg),
        }
    }
}

impl std::error::Error for LoadResultsError {}

impl From<io::Error> for LoadResultsError
{
    fn from(this: io::Error) -> Self
    {
        Self::Io(this)
    }
}

impl std::str::FromStr for SavedResults
{
    type Err = LoadResultsError;

    fn from_str(text: &str) -> Result<Self, Self::Err>
    {
        let mut lines = text.lines();
        let module_name = lines
            .next()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(LoadResultsError::InvalidLine { line: 1, mesg: "missing module name" })?;
        let mut results = Vec::new();

        for (index, raw) in lines.enumerate() {
            let line = index + 2;

            if raw.trim().is_empty() {
                continue;
            }

            let mut tokens = raw.split_whitespace();
            let passed = tokens
                .next()
                .and_then(|tok| tok.parse::<bool>().ok())
                .ok_or(LoadResultsError::InvalidLine { line: line, mesg: "expected 'true' or 'false'" })?;
            let measured_value = tokens
                .next()
                .and_then(|tok| tok.parse::<i32>().ok())
                .ok_or(LoadResultsError::InvalidLine { line: line, mesg: "expected a measured value" })?;
            let elapsed_ms = tokens
                .next()
                .and_then(|tok| tok.parse::<u32>().ok())
                .ok_or(LoadResultsError::InvalidLine { line: line, mesg: "expected an elapsed time" })?;

            if tokens.next().is_some() {
                return Err(LoadResultsError::InvalidLine { line: line, mesg: "unexpected trailing token" });
            }

            results.push(TestResult {
                passed: passed,
                measured_value: measured_value,
                elapsed_ms: elapsed_ms,
            });
        }

        Ok(Self {
            module_name: String::from(module_name),
            results: results.into(),
        })
    }
}

impl SavedResults
{
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadResultsError>
    {
        std::fs::read_to_string(path)?.parse()
    }
}

/// Somewhere the results of a finished module go when it is removed
pub trait ResultStore
{
    fn save(&mut self, module: &Module, results: &ResultBuffer) -> io::Result<()>;
}

/// Keeps the results of the most recent module in a single file, overwritten each time
pub struct FileStore
{
    path: PathBuf,
}

impl FileStore
{
    pub fn new(path: impl Into<PathBuf>) -> Self
    {
        Self {
            path: path.into(),
        }
    }
}

impl ResultStore for FileStore
{
    fn save(&mut self, module: &Module, results: &ResultBuffer) -> io::Result<()>
    {
        let file = File::create(&self.path)?;
        results.write_to(&module.name, BufWriter::new(file))?;
        log::info!("Saved results of {} to {}", module.name, self.path.display());

        Ok(())
    }
}

/// A per-operation line of a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry
{
    /// Counted from 1
    pub step: usize,
    pub name: &'static str,
    pub operation: String,
    pub passed: bool,
    pub measured_value: i32,
    pub measured: String,
    pub elapsed_ms: u32,
}

/// Operator facing view of a module's results
pub struct Report<'a>
{
    module: &'a Module,
    results: &'a ResultBuffer,
}

impl <'a> Report<'a>
{
    pub fn new(module: &'a Module, results: &'a ResultBuffer) -> Self
    {
        Self {
            module: module,
            results: results,
        }
    }

    pub fn entries(&self) -> Vec<ReportEntry>
    {
        self.module
            .operations
            .iter()
            .zip(self.results.as_slice().iter())
            .enumerate()
            .map(|(index, (op, result))| ReportEntry {
                step: index + 1,
                name: op.name(),
                operation: op.to_string(),
                passed: result.passed,
                measured_value: result.measured_value,
                measured: op.display_measured(result.measured_value),
                elapsed_ms: result.elapsed_ms,
            })
            .collect()
    }

    /// Every operation with its outcome, one per line
    pub fn listing(&self) -> String
    {
        let mut listing = format!("Module: {} (ID: {})\n", self.module.name, self.module.id);

        for entry in self.entries() {
            listing.push_str(&format!(
                "  {:>3} {:<16} {:<28} {} {} ({} ms)\n",
                entry.step,
                entry.name,
                entry.operation,
                if entry.passed { "PASS" } else { "FAIL" },
                entry.measured,
                entry.elapsed_ms,
            ));
        }

        listing
    }
}

/// Short summary fit for the bench display: the verdict and, on failure, the first failing step
impl fmt::Display for Report<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self.results.first_failure() {
            None => f.write_str("TEST PASSED"),
            Some(index) => match (self.module.operations.get(index), self.results.get(index)) {
                (Some(op), Some(result)) => write!(
                    f,
                    "TEST FAILED\nOp {}: {}\n{}\nResult: {}",
                    index + 1,
                    op.name(),
                    op,
                    op.display_measured(result.measured_value),
                ),
                _ => write!(f, "TEST FAILED\nOp {}", index + 1),
            },
        }
    }
}
