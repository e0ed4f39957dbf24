use super::CommandResult;
use seat_compare::database::ingestion::{ElectionImporter, ImportOptions};
use seat_compare::database::VotesDatabase;
use std::path::Path;

pub async fn import(database_path: &Path, workbook: &Path, options: ImportOptions) -> CommandResult<()> {
    if !workbook.exists() {
        return Err(format!("Workbook does not exist: {}", workbook.display()).into());
    }

    let db = VotesDatabase::open(database_path, true).await?;
    let mut importer = ElectionImporter::new(db, options);
    let summary = importer.import_workbook(workbook).await?;

    let metrics = importer
        .metrics()
        .get_workbook_metrics(&summary.workbook)
        .await?;
    importer.metrics().print_summary(&metrics);

    Ok(())
}
