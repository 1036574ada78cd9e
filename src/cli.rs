use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Header-driven validation and row entry for tabular files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer per-column validation rules from a file's headers
    Probe(ProbeArgs),
    /// Validate a candidate row without writing anything
    Check(CheckArgs),
    /// Validate a row and append it to the file
    Append(AppendArgs),
    /// Validate a row and overwrite an existing data row
    Update(UpdateArgs),
    /// Delete a data row
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input CSV/TSV file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Write the inferred rules to this YAML file
    #[arg(short, long)]
    pub rules: Option<PathBuf>,
    /// Delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Input CSV/TSV file providing headers and existing values
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Raw field values, one per column
    #[arg(required = true)]
    pub values: Vec<String>,
    /// Rules file with user overrides (inferred from headers if omitted)
    #[arg(short, long)]
    pub rules: Option<PathBuf>,
    /// Delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct AppendArgs {
    /// Input CSV/TSV file to append to
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Raw field values, one per column
    #[arg(required = true)]
    pub values: Vec<String>,
    /// Rules file with user overrides (inferred from headers if omitted)
    #[arg(short, long)]
    pub rules: Option<PathBuf>,
    /// Answer duplicate-warning confirmations with yes (default declines)
    #[arg(long)]
    pub force: bool,
    /// Delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Input CSV/TSV file to modify
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// 1-based data row to overwrite
    #[arg(long)]
    pub row: usize,
    /// Raw field values, one per column
    #[arg(required = true)]
    pub values: Vec<String>,
    /// Rules file with user overrides (inferred from headers if omitted)
    #[arg(short, long)]
    pub rules: Option<PathBuf>,
    /// Answer duplicate-warning confirmations with yes (default declines)
    #[arg(long)]
    pub force: bool,
    /// Delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Input CSV/TSV file to modify
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// 1-based data row to delete
    #[arg(long)]
    pub row: usize,
    /// Delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
