//! Spreadsheet import: one election table per valid workbook sheet

use crate::database::metrics::{create_metrics_table, ImportStage, MetricsCollector};
use crate::database::schema::{self, CellValue};
use crate::database::{party_from_column, DatabaseError, Result, VotesDatabase};
use calamine::{open_workbook_auto, DataType, Reader};
use colored::*;
use lazy_static::lazy_static;
use regex::Regex;
use sha1::{Digest, Sha1};
use std::path::Path;
use tracing::{info, warn};

/// Earliest election year with complete vote data.
pub const MIN_ELECTION_YEAR: u32 = 1955;

/// Sheet row holding party names above each `Votes` header.
const PARTY_ROW: usize = 2;
/// Sheet row holding the column headers.
const HEADER_ROW: usize = 3;
/// First sheet row of constituency data.
const FIRST_DATA_ROW: usize = 4;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub min_year: u32,
    /// Re-import sheets whose table already exists.
    pub force: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            min_year: MIN_ELECTION_YEAR,
            force: false,
        }
    }
}

#[derive(Debug)]
pub struct ImportSummary {
    pub workbook: String,
    pub workbook_sha1: String,
    pub elections_imported: Vec<String>,
    pub sheets_skipped: Vec<String>,
    pub total_constituencies: u64,
    pub total_duration_ms: u64,
}

/// Columns and rows of one cleaned sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSheet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

pub struct ElectionImporter {
    db: VotesDatabase,
    metrics: MetricsCollector,
    options: ImportOptions,
}

/// Whether a sheet name denotes an election worth importing.
///
/// Years before `min_year` lack vote data; the two 1974 elections are
/// labelled `1974F` and `1974O`.
pub fn valid_sheet(sheet_name: &str, min_year: u32) -> bool {
    lazy_static! {
        static ref YEAR_RX: Regex = Regex::new(r"^\d{4}$").unwrap();
        static ref SPLIT_YEAR_RX: Regex = Regex::new(r"^1974[FO]$").unwrap();
    }

    if YEAR_RX.is_match(sheet_name) {
        return sheet_name
            .parse::<u32>()
            .map_or(false, |year| year >= min_year);
    }
    SPLIT_YEAR_RX.is_match(sheet_name)
}

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.trim().to_string(),
        DataType::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &DataType, is_vote_column: bool) -> CellValue {
    match cell {
        DataType::Empty => CellValue::Empty,
        DataType::Int(i) => CellValue::Number(*i as f64),
        DataType::Float(f) => CellValue::Number(*f),
        DataType::String(s) if is_vote_column => s
            .trim()
            .parse::<f64>()
            .map_or(CellValue::Empty, CellValue::Number),
        DataType::String(s) => CellValue::Text(s.trim().to_string()),
        _ if is_vote_column => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}

/// Clean one sheet into named columns and constituency rows.
///
/// Columns with no content below the title row are dropped. A `Votes` header
/// becomes `Votes-<party>` using the party row above it; `Vote share` takes
/// the party of the column before it. The first header is always `id`, and
/// rows without an id are dropped.
pub fn process_sheet(rows: &[Vec<DataType>]) -> Result<ProcessedSheet> {
    if rows.len() <= HEADER_ROW {
        return Err(DatabaseError::Import(format!(
            "sheet has {} rows, expected headers on row {}",
            rows.len(),
            HEADER_ROW + 1
        )));
    }

    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let cell = |row: usize, column: usize| rows[row].get(column).unwrap_or(&DataType::Empty);

    let kept: Vec<usize> = (0..width)
        .filter(|&column| (1..rows.len()).any(|row| !cell(row, column).is_empty()))
        .collect();

    let mut columns = Vec::with_capacity(kept.len());
    for (position, &column) in kept.iter().enumerate() {
        let header = cell_text(cell(HEADER_ROW, column));
        let name = if position == 0 {
            "id".to_string()
        } else if header == "Votes" {
            format!("Votes-{}", cell_text(cell(PARTY_ROW, column)))
        } else if header == "Vote share" {
            format!("Vote share-{}", cell_text(cell(PARTY_ROW, kept[position - 1])))
        } else if header.is_empty() {
            format!("column_{}", column)
        } else {
            header
        };

        if columns.contains(&name) {
            return Err(DatabaseError::Import(format!("duplicate column {}", name)));
        }
        columns.push(name);
    }

    let vote_columns: Vec<bool> = columns
        .iter()
        .map(|c| party_from_column(c).is_some())
        .collect();

    let data = rows
        .iter()
        .skip(FIRST_DATA_ROW)
        .filter(|row| {
            kept.first()
                .and_then(|&id| row.get(id))
                .map_or(false, |id| !id.is_empty())
        })
        .map(|row| {
            kept.iter()
                .zip(&vote_columns)
                .map(|(&column, &is_vote)| {
                    cell_value(row.get(column).unwrap_or(&DataType::Empty), is_vote)
                })
                .collect::<Vec<CellValue>>()
        })
        .collect();

    Ok(ProcessedSheet {
        columns,
        rows: data,
    })
}

fn workbook_sha1(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha1::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

impl ElectionImporter {
    pub fn new(db: VotesDatabase, options: ImportOptions) -> Self {
        let metrics = MetricsCollector::new(db.pool().clone());
        Self {
            db,
            metrics,
            options,
        }
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Import every valid sheet of the workbook at `path`.
    pub async fn import_workbook(&mut self, path: &Path) -> Result<ImportSummary> {
        let workbook_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        println!("🚀 Importing elections from {}", workbook_name.bright_cyan());

        create_metrics_table(self.db.pool()).await?;
        self.metrics.start_stage("total");

        self.metrics.start_stage("open");
        let workbook_sha1 = workbook_sha1(path)?;
        let mut workbook = open_workbook_auto(path)?;
        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        self.metrics
            .end_stage(
                "open",
                &workbook_name,
                None,
                ImportStage::WorkbookOpen,
                None,
            )
            .await?;

        let mut elections_imported = Vec::new();
        let mut sheets_skipped = Vec::new();
        let mut total_constituencies = 0u64;

        for sheet_name in sheet_names {
            if !valid_sheet(&sheet_name, self.options.min_year) {
                info!(sheet = %sheet_name, "skipping sheet that is not an election");
                sheets_skipped.push(sheet_name);
                continue;
            }

            if !self.options.force {
                let mut conn = self.db.pool().acquire().await?;
                if schema::table_exists(&mut conn, &sheet_name).await? {
                    println!(
                        "  ⏭️  {} already imported, skipping",
                        sheet_name.bright_yellow()
                    );
                    sheets_skipped.push(sheet_name);
                    continue;
                }
            }

            let range = match workbook.worksheet_range(&sheet_name) {
                Some(Ok(range)) => range,
                Some(Err(e)) => {
                    warn!(sheet = %sheet_name, error = %e, "failed to read sheet");
                    eprintln!("  ❌ Failed to read sheet {}: {}", sheet_name, e);
                    sheets_skipped.push(sheet_name);
                    continue;
                }
                None => {
                    sheets_skipped.push(sheet_name);
                    continue;
                }
            };
            let rows: Vec<Vec<DataType>> = range.rows().map(|r| r.to_vec()).collect();

            match self.import_sheet(&workbook_name, &sheet_name, &rows).await {
                Ok(constituencies) => {
                    println!(
                        "  ✅ Imported {} with {} constituencies",
                        sheet_name.bright_green(),
                        constituencies.to_string().bright_yellow()
                    );
                    total_constituencies += constituencies;
                    elections_imported.push(sheet_name);
                }
                Err(DatabaseError::Import(message)) | Err(DatabaseError::Integrity(message)) => {
                    warn!(sheet = %sheet_name, %message, "sheet not imported");
                    eprintln!("  ❌ Skipping sheet {}: {}", sheet_name, message);
                    sheets_skipped.push(sheet_name);
                }
                Err(e) => return Err(e),
            }
        }

        let total = self
            .metrics
            .end_stage(
                "total",
                &workbook_name,
                None,
                ImportStage::Complete,
                Some(total_constituencies),
            )
            .await?;

        let summary = ImportSummary {
            workbook: workbook_name,
            workbook_sha1,
            elections_imported,
            sheets_skipped,
            total_constituencies,
            total_duration_ms: total.duration_ms,
        };

        self.print_import_summary(&summary);
        Ok(summary)
    }

    /// Clean, write and verify one sheet; returns its constituency count.
    async fn import_sheet(
        &mut self,
        workbook: &str,
        sheet_name: &str,
        rows: &[Vec<DataType>],
    ) -> Result<u64> {
        let key = format!("sheet_{}", sheet_name);

        self.metrics.start_stage(&format!("{}_process", key));
        let sheet = process_sheet(rows)?;
        self.metrics
            .end_stage(
                &format!("{}_process", key),
                workbook,
                Some(sheet_name),
                ImportStage::SheetProcessing,
                Some(sheet.rows.len() as u64),
            )
            .await?;

        self.metrics.start_stage(&format!("{}_insert", key));
        let constituencies = self.write_sheet(sheet_name, &sheet).await?;
        self.metrics
            .end_stage(
                &format!("{}_insert", key),
                workbook,
                Some(sheet_name),
                ImportStage::DatabaseInsertion,
                Some(constituencies),
            )
            .await?;

        Ok(constituencies)
    }

    /// Replace the election table inside one transaction, verifying it before commit.
    async fn write_sheet(&self, election: &str, sheet: &ProcessedSheet) -> Result<u64> {
        let mut tx = self.db.pool().begin().await?;

        schema::create_election_table(&mut tx, election, &sheet.columns).await?;
        for row in &sheet.rows {
            schema::insert_constituency(&mut tx, election, &sheet.columns, row).await?;
        }
        schema::verify_election_table(&mut tx, election).await?;

        tx.commit().await?;
        Ok(sheet.rows.len() as u64)
    }

    fn print_import_summary(&self, summary: &ImportSummary) {
        println!("\n{}", "🎉 Import Complete!".bright_green().bold());
        println!("{}", "=".repeat(50).bright_green());
        println!(
            "{}: {} ({})",
            "Workbook".bright_white().bold(),
            summary.workbook.bright_cyan(),
            summary.workbook_sha1
        );
        println!(
            "{}: {}",
            "Elections Imported".bright_white().bold(),
            summary.elections_imported.len().to_string().bright_yellow()
        );
        println!(
            "{}: {}",
            "Sheets Skipped".bright_white().bold(),
            summary.sheets_skipped.len().to_string().bright_yellow()
        );
        println!(
            "{}: {}",
            "Total Constituencies".bright_white().bold(),
            summary.total_constituencies.to_string().bright_yellow()
        );
        println!(
            "{}: {} ms",
            "Total Duration".bright_white().bold(),
            summary.total_duration_ms.to_string().bright_yellow()
        );
        println!();
    }
}
