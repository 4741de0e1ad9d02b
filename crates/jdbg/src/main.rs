use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::{Parser, Subcommand};
use jdbg_core::{Address, ChecksumStatus, DebugInfo, LookupStrategy, ResolveOptions, TableKind, ValidationPolicy};
use jdbg_utils::{LogFormat, LogLevel, LoggingGuard, info, init_logging, init_logging_with_level, warn};

/// Resolve crash addresses against JDBG debug-information blobs.
#[derive(Parser, Debug)]
#[command(name = "jdbg")]
#[command(version)]
#[command(about = "Resolve crash addresses against JDBG debug-information blobs", long_about = None)]
struct Cli
{
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (pretty or json); overrides JDBG_LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Show header fields, validity and checksum status
    Info
    {
        /// Path to the debug blob
        file: PathBuf,
    },
    /// Resolve one or more addresses to module, file, line and procedure
    Resolve
    {
        /// Path to the debug blob
        file: PathBuf,
        /// Addresses to resolve (hex format: 0x1000 or decimal)
        #[arg(required = true)]
        addresses: Vec<Address>,
        /// Decode every table once and binary search it
        #[arg(long, default_value_t = false)]
        cached: bool,
        /// Refuse to resolve against a blob that failed validation
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// List the decoded entries of one table
    Dump
    {
        /// Path to the debug blob
        file: PathBuf,
        /// Table to dump (units, sources, lines, symbols)
        table: TableKind,
    },
}

fn main()
{
    let cli = Cli::parse();

    let _guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn setup_logging(cli: &Cli) -> Result<LoggingGuard, jdbg_utils::LoggingError>
{
    match (cli.log_level, cli.log_format) {
        (None, None) => init_logging(),
        (level, format) => init_logging_with_level(level.unwrap_or(LogLevel::Warn), format.unwrap_or_default()),
    }
}

fn load(path: &Path, options: ResolveOptions) -> Result<DebugInfo, Box<dyn std::error::Error>>
{
    let data = fs::read(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    info!("Loaded {} ({} bytes)", path.display(), data.len());

    let debug_info = DebugInfo::with_options(data, options);
    if !debug_info.is_valid() {
        warn!("{} did not pass validation; results may be wrong", path.display());
    }
    Ok(debug_info)
}

fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error>>
{
    match cli.command {
        Commands::Info { file } => {
            let debug_info = load(&file, ResolveOptions::default())?;
            print_blob_info(&debug_info);
            Ok(())
        }
        Commands::Resolve {
            file,
            addresses,
            cached,
            strict,
        } => {
            let options = ResolveOptions {
                strategy: if cached { LookupStrategy::Cached } else { LookupStrategy::Streaming },
                policy: if strict { ValidationPolicy::Strict } else { ValidationPolicy::BestEffort },
            };
            let debug_info = load(&file, options)?;
            for address in addresses {
                let location = debug_info.resolve(address)?;
                println!("{location}");
            }
            Ok(())
        }
        Commands::Dump { file, table } => {
            let debug_info = load(&file, ResolveOptions::default())?;
            dump_table(&debug_info, table)
        }
    }
}

fn print_blob_info(debug_info: &DebugInfo)
{
    println!("Debug Blob Information:");
    println!("  Size: {} bytes", debug_info.data().len());
    println!("  Valid Format: {}", debug_info.valid_format());
    if let Some(defect) = debug_info.format_defect() {
        println!("  Defect: {defect}");
    }

    let checksum = match debug_info.checksum() {
        ChecksumStatus::Skipped => "not checked".to_string(),
        ChecksumStatus::NotPresent => "not recorded".to_string(),
        ChecksumStatus::Valid => "valid".to_string(),
        ChecksumStatus::Mismatch { stored, computed } => {
            format!("MISMATCH (stored 0x{stored:08x}, computed 0x{computed:08x})")
        }
    };
    println!("  Checksum: {checksum}");

    let Some(header) = debug_info.header() else {
        return;
    };
    println!("  Signature: 0x{:08x}", header.signature);
    println!("  Version: {}", header.version);
    println!("  Tables:");
    println!("    Units: {}", header.units);
    println!("    Source Names: {}", header.source_names);
    println!("    Symbols: {}", header.symbols);
    println!("    Line Numbers: {}", header.line_numbers);
    println!("    Words: {}", header.words);

    match debug_info.own_module_name() {
        Ok(name) => println!("  Module: {name}"),
        Err(e) => println!("  Module: <unreadable: {e}>"),
    }
}

fn dump_table(debug_info: &DebugInfo, table: TableKind) -> Result<(), Box<dyn std::error::Error>>
{
    match table {
        TableKind::Units => {
            for entry in debug_info.unit_entries()? {
                println!("{}  {}", Address::new(entry.address), debug_info.name(entry.payload[0])?);
            }
        }
        TableKind::SourceNames => {
            for entry in debug_info.source_name_entries()? {
                println!("{}  {}", Address::new(entry.address), debug_info.name(entry.payload[0])?);
            }
        }
        TableKind::LineNumbers => {
            for entry in debug_info.line_number_entries()? {
                println!("{}  line {}", Address::new(entry.address), entry.payload[0]);
            }
        }
        TableKind::Symbols => {
            for entry in debug_info.symbol_entries()? {
                let [outer, inner] = entry.payload;
                let outer = debug_info.name(outer)?;
                if inner == 0 {
                    println!("{}  {outer}", Address::new(entry.address));
                } else {
                    println!("{}  {outer}.{}", Address::new(entry.address), debug_info.name(inner)?);
                }
            }
        }
    }
    Ok(())
}
