//! gridshift CLI - structural edits on JSON workbook records

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gridshift::prelude::*;
use gridshift::{tokenize, WorkbookRecord};
use log::debug;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gridshift")]
#[command(
    author,
    version,
    about = "Apply structural edits to spreadsheet formulas"
)]
struct Cli {
    /// Log planning details (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply one edit to a workbook record and write the result
    Apply {
        /// Input workbook record (JSON)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep cached values of cells that only moved
        #[arg(long)]
        preserve_cache: bool,

        /// Match sheet names in references case-sensitively
        #[arg(long)]
        case_sensitive: bool,

        /// Keep shared members attached even when they diverge
        #[arg(long)]
        keep_divergent: bool,

        /// Apply the inverse afterwards and fail unless the input is restored
        #[arg(long)]
        verify_undo: bool,

        #[command(subcommand)]
        edit: EditCommand,
    },

    /// List the references found in a formula
    Refs {
        /// Formula text, e.g. '=SUM(A1:B2)+Sheet2!C3'
        formula: String,
    },
}

#[derive(Subcommand)]
enum EditCommand {
    /// Insert empty rows before row AT (0-based)
    InsertRows { sheet: String, at: u32, #[arg(default_value = "1")] count: u32 },
    /// Remove rows starting at row AT (0-based)
    RemoveRows { sheet: String, at: u32, #[arg(default_value = "1")] count: u32 },
    /// Insert empty columns before column AT (0-based)
    InsertCols { sheet: String, at: u32, #[arg(default_value = "1")] count: u32 },
    /// Remove columns starting at column AT (0-based)
    RemoveCols { sheet: String, at: u32, #[arg(default_value = "1")] count: u32 },
    /// Move COUNT rows starting at START to before row TO
    MoveRows { sheet: String, start: u32, count: u32, to: u32 },
    /// Move COUNT columns starting at START to before column TO
    MoveCols { sheet: String, start: u32, count: u32, to: u32 },
    /// Move the range FROM (A1 notation) onto TO
    MoveRange { sheet: String, from: String, to: String },
    /// Insert cells over RANGE, shifting cells below down
    InsertShiftDown { sheet: String, range: String },
    /// Insert cells over RANGE, shifting cells to the right
    InsertShiftRight { sheet: String, range: String },
    /// Delete the cells of RANGE, shifting cells below up
    DeleteShiftUp { sheet: String, range: String },
    /// Delete the cells of RANGE, shifting cells on the right left
    DeleteShiftLeft { sheet: String, range: String },
    /// Give a sheet a new name
    RenameSheet { sheet: String, name: String },
    /// Delete a sheet
    RemoveSheet { sheet: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match cli.command {
        Commands::Apply {
            input,
            output,
            preserve_cache,
            case_sensitive,
            keep_divergent,
            verify_undo,
            edit,
        } => {
            let options = EditOptions {
                preserve_cached_values: preserve_cache,
                case_sensitive_sheet_names: case_sensitive,
                detach_divergent_members: !keep_divergent,
            };
            apply(&input, output.as_deref(), &edit, &options, verify_undo)
        }
        Commands::Refs { formula } => list_refs(&formula),
    }
}

fn load_workbook(path: &Path) -> Result<Workbook> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let record: WorkbookRecord = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse workbook record '{}'", path.display()))?;
    let workbook = record
        .to_workbook()
        .with_context(|| format!("Invalid workbook record '{}'", path.display()))?;
    debug!(
        "loaded {} sheets from '{}'",
        workbook.sheet_count(),
        path.display()
    );
    Ok(workbook)
}

/// Resolve a sheet given by display name or by id
fn resolve_sheet(workbook: &Workbook, sheet: &str) -> Result<SheetId> {
    if let Some(found) = workbook.worksheet_by_name(sheet) {
        return Ok(found.id().clone());
    }
    let id = SheetId::new(sheet);
    if workbook.worksheet(&id).is_some() {
        return Ok(id);
    }
    bail!("No sheet named '{}'", sheet)
}

fn parse_range(a1: &str) -> Result<CellRange> {
    CellRange::parse(a1).with_context(|| format!("Invalid range '{}'", a1))
}

fn build_edit(workbook: &Workbook, command: &EditCommand) -> Result<StructuralEdit> {
    let edit = match command {
        EditCommand::InsertRows { sheet, at, count } => StructuralEdit::InsertRows {
            sheet: resolve_sheet(workbook, sheet)?,
            at: *at,
            count: *count,
        },
        EditCommand::RemoveRows { sheet, at, count } => StructuralEdit::RemoveRows {
            sheet: resolve_sheet(workbook, sheet)?,
            at: *at,
            count: *count,
        },
        EditCommand::InsertCols { sheet, at, count } => StructuralEdit::InsertCols {
            sheet: resolve_sheet(workbook, sheet)?,
            at: *at,
            count: *count,
        },
        EditCommand::RemoveCols { sheet, at, count } => StructuralEdit::RemoveCols {
            sheet: resolve_sheet(workbook, sheet)?,
            at: *at,
            count: *count,
        },
        EditCommand::MoveRows { sheet, start, count, to } => StructuralEdit::MoveRows {
            sheet: resolve_sheet(workbook, sheet)?,
            start: *start,
            count: *count,
            to: *to,
        },
        EditCommand::MoveCols { sheet, start, count, to } => StructuralEdit::MoveCols {
            sheet: resolve_sheet(workbook, sheet)?,
            start: *start,
            count: *count,
            to: *to,
        },
        EditCommand::MoveRange { sheet, from, to } => StructuralEdit::MoveRange {
            sheet: resolve_sheet(workbook, sheet)?,
            from: parse_range(from)?,
            to: parse_range(to)?,
        },
        EditCommand::InsertShiftDown { sheet, range } => StructuralEdit::InsertRangeShiftDown {
            sheet: resolve_sheet(workbook, sheet)?,
            range: parse_range(range)?,
        },
        EditCommand::InsertShiftRight { sheet, range } => StructuralEdit::InsertRangeShiftRight {
            sheet: resolve_sheet(workbook, sheet)?,
            range: parse_range(range)?,
        },
        EditCommand::DeleteShiftUp { sheet, range } => StructuralEdit::DeleteRangeShiftUp {
            sheet: resolve_sheet(workbook, sheet)?,
            range: parse_range(range)?,
        },
        EditCommand::DeleteShiftLeft { sheet, range } => StructuralEdit::DeleteRangeShiftLeft {
            sheet: resolve_sheet(workbook, sheet)?,
            range: parse_range(range)?,
        },
        EditCommand::RenameSheet { sheet, name } => StructuralEdit::RenameSheet {
            sheet: resolve_sheet(workbook, sheet)?,
            new_name: name.clone(),
        },
        EditCommand::RemoveSheet { sheet } => StructuralEdit::RemoveSheet {
            sheet: resolve_sheet(workbook, sheet)?,
        },
    };
    Ok(edit)
}

fn apply(
    input: &Path,
    output: Option<&Path>,
    command: &EditCommand,
    options: &EditOptions,
    verify_undo: bool,
) -> Result<()> {
    let mut workbook = load_workbook(input)?;
    let original = WorkbookRecord::from(&workbook);
    let edit = build_edit(&workbook, command)?;
    debug!("applying {} with {:?}", edit, options);

    let (pair, changed) = workbook
        .apply_edit_with_options(&edit, options)
        .with_context(|| format!("Failed to apply {}", edit))?;

    let stats = &pair.stats;
    eprintln!(
        "{}: {} formulas scanned, {} rewritten, {} moved, {} removed, {} cells changed",
        edit,
        stats.scanned,
        stats.rewritten,
        stats.relocated,
        stats.removed,
        changed.cells.len()
    );
    if stats.passed_through > 0 {
        eprintln!("Warning: {} formulas could not be read and were left as is", stats.passed_through);
    }

    let record = WorkbookRecord::from(&workbook);

    if verify_undo {
        let mut undone = workbook.clone();
        undone
            .apply_mutation(&pair.inverse)
            .context("Failed to apply the inverse mutation")?;
        if WorkbookRecord::from(&undone) != original {
            bail!("Undo of {} did not restore the input", edit);
        }
        eprintln!("Undo verified");
    }

    let json = serde_json::to_string_pretty(&record).context("Failed to serialize workbook")?;
    if let Some(path) = output {
        std::fs::write(path, json.as_bytes())
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        eprintln!("Wrote '{}'", path.display());
    } else {
        let mut stdout = io::stdout();
        stdout
            .write_all(json.as_bytes())
            .and_then(|_| stdout.write_all(b"\n"))
            .context("Failed to write to stdout")?;
    }

    Ok(())
}

fn list_refs(formula: &str) -> Result<()> {
    let tokens = tokenize(formula).with_context(|| format!("Failed to scan '{}'", formula))?;
    for token in tokens {
        let shown = match token.valid() {
            Some(reference) => reference.normalized().to_string(),
            None => CellError::Ref.to_string(),
        };
        println!("{}..{}\t{}\t{}", token.span.start, token.span.end, &formula[token.span.clone()], shown);
    }
    Ok(())
}
