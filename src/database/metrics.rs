//! Timing of import stages, stored alongside the elections

use chrono::{DateTime, Utc};
use colored::*;
use instant::Instant;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;

/// Internal table; the leading underscore keeps it out of the election list.
pub const METRICS_TABLE: &str = "_import_metrics";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportMetrics {
    pub workbook: String,
    pub sheet: Option<String>,
    pub stage: ImportStage,
    pub duration_ms: u64,
    pub constituencies: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportStage {
    WorkbookOpen,
    SheetProcessing,
    DatabaseInsertion,
    Validation,
    Complete,
}

impl std::fmt::Display for ImportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportStage::WorkbookOpen => write!(f, "workbook_open"),
            ImportStage::SheetProcessing => write!(f, "sheet_processing"),
            ImportStage::DatabaseInsertion => write!(f, "database_insertion"),
            ImportStage::Validation => write!(f, "validation"),
            ImportStage::Complete => write!(f, "complete"),
        }
    }
}

impl ImportStage {
    fn parse(stage: &str) -> ImportStage {
        match stage {
            "workbook_open" => ImportStage::WorkbookOpen,
            "sheet_processing" => ImportStage::SheetProcessing,
            "database_insertion" => ImportStage::DatabaseInsertion,
            "validation" => ImportStage::Validation,
            _ => ImportStage::Complete,
        }
    }
}

pub struct MetricsCollector {
    pool: SqlitePool,
    stage_timers: HashMap<String, Instant>,
}

impl MetricsCollector {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            stage_timers: HashMap::new(),
        }
    }

    /// Start timing a stage
    pub fn start_stage(&mut self, stage_key: &str) {
        self.stage_timers
            .insert(stage_key.to_string(), Instant::now());
    }

    /// End timing a stage and record metrics
    pub async fn end_stage(
        &mut self,
        stage_key: &str,
        workbook: &str,
        sheet: Option<&str>,
        stage: ImportStage,
        constituencies: Option<u64>,
    ) -> crate::database::Result<ImportMetrics> {
        let duration = self
            .stage_timers
            .remove(stage_key)
            .map(|start| start.elapsed().as_millis() as u64)
            .unwrap_or(0);

        let metrics = ImportMetrics {
            workbook: workbook.to_string(),
            sheet: sheet.map(|s| s.to_string()),
            stage,
            duration_ms: duration,
            constituencies,
            timestamp: Utc::now(),
        };

        self.store_metrics(&metrics).await?;

        Ok(metrics)
    }

    async fn store_metrics(&self, metrics: &ImportMetrics) -> crate::database::Result<()> {
        let stage_str = metrics.stage.to_string();
        let duration_ms = metrics.duration_ms as i64;
        let constituencies = metrics.constituencies.map(|c| c as i64);

        sqlx::query(&format!(
            r#"
            INSERT INTO {}
            (workbook, sheet, stage, duration_ms, constituencies, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            METRICS_TABLE
        ))
        .bind(&metrics.workbook)
        .bind(&metrics.sheet)
        .bind(stage_str)
        .bind(duration_ms)
        .bind(constituencies)
        .bind(metrics.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get recorded metrics for one workbook, newest first
    pub async fn get_workbook_metrics(
        &self,
        workbook: &str,
    ) -> crate::database::Result<Vec<ImportMetrics>> {
        let rows: Vec<(String, Option<String>, String, i64, Option<i64>, DateTime<Utc>)> =
            sqlx::query_as(&format!(
                r#"
                SELECT workbook, sheet, stage, duration_ms, constituencies, created_at
                FROM {}
                WHERE workbook = ?
                ORDER BY created_at DESC, id DESC
                "#,
                METRICS_TABLE
            ))
            .bind(workbook)
            .fetch_all(&self.pool)
            .await?;

        let metrics = rows
            .into_iter()
            .map(
                |(workbook, sheet, stage, duration_ms, constituencies, timestamp)| ImportMetrics {
                    workbook,
                    sheet,
                    stage: ImportStage::parse(&stage),
                    duration_ms: duration_ms as u64,
                    constituencies: constituencies.map(|c| c as u64),
                    timestamp,
                },
            )
            .collect();

        Ok(metrics)
    }

    /// Print performance summary
    pub fn print_summary(&self, metrics: &[ImportMetrics]) {
        println!("\n{}", "📊 Import Performance Summary".bright_cyan().bold());
        println!("{}", "=".repeat(50).bright_cyan());

        let mut total_duration = 0u64;
        let mut total_constituencies = 0u64;

        for metric in metrics {
            total_duration += metric.duration_ms;
            if metric.stage == ImportStage::DatabaseInsertion {
                total_constituencies += metric.constituencies.unwrap_or(0);
            }

            let stage_color = match metric.stage {
                ImportStage::WorkbookOpen => "yellow",
                ImportStage::SheetProcessing => "blue",
                ImportStage::DatabaseInsertion => "green",
                ImportStage::Validation => "magenta",
                ImportStage::Complete => "bright_green",
            };

            println!(
                "{}{}: {} ms{}",
                format!("{:?}", metric.stage).color(stage_color),
                metric
                    .sheet
                    .as_deref()
                    .map(|s| format!(" [{}]", s))
                    .unwrap_or_default(),
                metric.duration_ms.to_string().bright_white(),
                if let Some(constituencies) = metric.constituencies {
                    format!(" ({} constituencies)", constituencies.to_string().bright_yellow())
                } else {
                    String::new()
                }
            );
        }

        println!("{}", "-".repeat(50).bright_cyan());
        println!(
            "{}: {} ms",
            "Total Duration".bright_white().bold(),
            total_duration.to_string().bright_green().bold()
        );
        if total_constituencies > 0 {
            println!(
                "{}: {}",
                "Total Constituencies".bright_white().bold(),
                total_constituencies.to_string().bright_green().bold()
            );
        }

        println!();
    }
}

/// Create the metrics table
pub async fn create_metrics_table(pool: &SqlitePool) -> crate::database::Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id INTEGER PRIMARY KEY,
            workbook TEXT NOT NULL,
            sheet TEXT,
            stage TEXT NOT NULL,
            duration_ms INTEGER NOT NULL,
            constituencies INTEGER,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        METRICS_TABLE
    ))
    .execute(pool)
    .await?;

    Ok(())
}
