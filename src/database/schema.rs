//! Election table definitions and schema helpers

use crate::database::{party_from_column, quote_identifier, DatabaseError, Result, REGION_COLUMN};
use sqlx::sqlite::SqliteConnection;

/// One cell of a constituency row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

pub async fn table_exists(conn: &mut SqliteConnection, table: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(&mut *conn)
            .await?;

    Ok(count > 0)
}

/// Column names of `table`, in declaration order.
pub async fn column_names(conn: &mut SqliteConnection, table: &str) -> Result<Vec<String>> {
    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
        .bind(table)
        .fetch_all(&mut *conn)
        .await?;

    Ok(names)
}

/// Create (or replace) the table for one election.
///
/// Vote columns are declared `REAL`; every other column takes whatever its
/// cells hold.
pub async fn create_election_table(
    conn: &mut SqliteConnection,
    election: &str,
    columns: &[String],
) -> Result<()> {
    if columns.is_empty() {
        return Err(DatabaseError::Integrity(format!(
            "Election {} has no columns",
            election
        )));
    }

    sqlx::query(&format!("DROP TABLE IF EXISTS {}", quote_identifier(election)))
        .execute(&mut *conn)
        .await?;

    let definitions = columns
        .iter()
        .map(|column| {
            if party_from_column(column).is_some() {
                format!("{} REAL", quote_identifier(column))
            } else {
                quote_identifier(column)
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    sqlx::query(&format!(
        "CREATE TABLE {} ({})",
        quote_identifier(election),
        definitions
    ))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Insert one constituency row; `values` line up with `columns`.
pub async fn insert_constituency(
    conn: &mut SqliteConnection,
    election: &str,
    columns: &[String],
    values: &[CellValue],
) -> Result<()> {
    if values.len() != columns.len() {
        return Err(DatabaseError::Integrity(format!(
            "Row has {} values for {} columns in {}",
            values.len(),
            columns.len(),
            election
        )));
    }

    let column_list = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(election),
        column_list,
        placeholders
    );

    let mut query = sqlx::query(&sql);
    for value in values {
        query = match value {
            CellValue::Empty => query.bind(None::<f64>),
            CellValue::Number(n) => query.bind(*n),
            CellValue::Text(t) => query.bind(t.clone()),
        };
    }
    query.execute(&mut *conn).await?;

    Ok(())
}

/// Verify that `election` can be read as vote data
pub async fn verify_election_table(conn: &mut SqliteConnection, election: &str) -> Result<()> {
    if !table_exists(conn, election).await? {
        return Err(DatabaseError::NotFound(election.to_string()));
    }

    let columns = column_names(conn, election).await?;

    if !columns.iter().any(|c| c == REGION_COLUMN) {
        return Err(DatabaseError::Integrity(format!(
            "Missing column {} in {}",
            REGION_COLUMN, election
        )));
    }

    if !columns.iter().any(|c| party_from_column(c).is_some()) {
        return Err(DatabaseError::Integrity(format!(
            "No vote columns in {}",
            election
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testing::{add_election, test_database};

    #[tokio::test]
    async fn test_verify_accepts_election_table() {
        let test = test_database().await;
        add_election(
            &test.db,
            "2019",
            &["id", "Country/Region", "Votes-A"],
            vec![vec![
                CellValue::Text("E1".to_string()),
                CellValue::Text("England".to_string()),
                CellValue::Number(5.0),
            ]],
        )
        .await;

        let mut conn = test.db.pool().acquire().await.unwrap();
        verify_election_table(&mut conn, "2019").await.unwrap();
    }

    #[tokio::test]
    async fn test_verify_rejects_missing_region() {
        let test = test_database().await;
        add_election(&test.db, "2019", &["id", "Votes-A"], Vec::new()).await;

        let mut conn = test.db.pool().acquire().await.unwrap();
        let err = verify_election_table(&mut conn, "2019").await.unwrap_err();
        assert!(matches!(err, DatabaseError::Integrity(_)));
    }

    #[tokio::test]
    async fn test_create_replaces_existing_table() {
        let test = test_database().await;
        add_election(&test.db, "2019", &["Country/Region", "Votes-A"], Vec::new()).await;
        add_election(&test.db, "2019", &["Country/Region", "Votes-B"], Vec::new()).await;

        let mut conn = test.db.pool().acquire().await.unwrap();
        let columns = column_names(&mut conn, "2019").await.unwrap();
        assert_eq!(columns, vec!["Country/Region", "Votes-B"]);
    }

    #[tokio::test]
    async fn test_insert_rejects_short_rows() {
        let test = test_database().await;
        let columns = vec!["Country/Region".to_string(), "Votes-A".to_string()];
        let mut conn = test.db.pool().acquire().await.unwrap();
        create_election_table(&mut conn, "2019", &columns)
            .await
            .unwrap();

        let err = insert_constituency(&mut conn, "2019", &columns, &[CellValue::Empty])
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Integrity(_)));
    }
}
