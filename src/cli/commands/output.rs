//! Writers for dump output
//!
//! Dumps are written either as JSON lines (one object per record, the
//! layout of the original dump files) or as CSV with a header row.

use crate::errors::AppResult;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Record dump encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpFormat {
    #[default]
    Jsonl,
    Csv,
}

impl DumpFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DumpFormat::Jsonl => "json",
            DumpFormat::Csv => "csv",
        }
    }
}

impl FromStr for DumpFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "jsonl" => Ok(DumpFormat::Jsonl),
            "csv" => Ok(DumpFormat::Csv),
            other => Err(format!(
                "Unknown dump format '{}' (expected 'jsonl' or 'csv')",
                other
            )),
        }
    }
}

enum Sink {
    Jsonl(BufWriter<Box<dyn Write>>),
    Csv(csv::Writer<Box<dyn Write>>),
}

/// Serializes records one at a time to a file or stdout
pub struct RecordWriter {
    sink: Sink,
    written: u64,
}

impl RecordWriter {
    /// Write to `path`, or stdout when `path` is `None`
    pub fn create(path: Option<&Path>, format: DumpFormat) -> AppResult<Self> {
        let target: Box<dyn Write> = match path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                Box::new(File::create(path)?)
            }
            None => Box::new(io::stdout()),
        };

        let sink = match format {
            DumpFormat::Jsonl => Sink::Jsonl(BufWriter::new(target)),
            DumpFormat::Csv => Sink::Csv(csv::Writer::from_writer(target)),
        };
        Ok(Self { sink, written: 0 })
    }

    pub fn write<T: Serialize>(&mut self, record: &T) -> AppResult<()> {
        match &mut self.sink {
            Sink::Jsonl(writer) => {
                serde_json::to_writer(&mut *writer, record)?;
                writer.write_all(b"\n")?;
            }
            Sink::Csv(writer) => writer.serialize(record)?,
        }
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush buffered output, returning the number of records written
    pub fn finish(self) -> AppResult<u64> {
        match self.sink {
            Sink::Jsonl(mut writer) => writer.flush()?,
            Sink::Csv(mut writer) => writer.flush()?,
        }
        Ok(self.written)
    }
}

/// Resolve `--output`: an explicit path, stdout for "-", or a file in the output directory
pub fn resolve_output_path(
    output: Option<&PathBuf>,
    output_dir: &Path,
    stem: &str,
    format: DumpFormat,
) -> Option<PathBuf> {
    match output {
        Some(path) if path.as_os_str() == "-" => None,
        Some(path) => Some(path.clone()),
        None => Some(output_dir.join(format!("{}.{}", stem, format.extension()))),
    }
}

/// Write output to file with safe directory creation
pub fn write_output_to_file(path: &Path, content: &str, description: &str) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    println!("{} written to: {}", description, path.display());
    Ok(())
}
