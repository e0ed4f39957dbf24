pub mod ingestion;
pub mod metrics;
pub mod schema;

use crate::data::VoteDataSource;
use crate::model::{VoteData, OTHER_PARTY};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tracing::debug;

/// Column holding each constituency's region label.
pub const REGION_COLUMN: &str = "Country/Region";
/// Prefix of the per-party vote columns; the party name follows it.
pub const VOTES_PREFIX: &str = "Votes-";

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Unknown election: {0}")]
    NotFound(String),
    #[error("Data integrity error: {0}")]
    Integrity(String),
    #[error("Import error: {0}")]
    Import(String),
    #[error("Spreadsheet error: {0}")]
    Calamine(#[from] calamine::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// SQLite store with one table per election.
///
/// Each table has a [`REGION_COLUMN`] and one `Votes-<party>` column per party.
/// Every query checks a connection out of the pool and returns it when done.
#[derive(Clone)]
pub struct VotesDatabase {
    pool: SqlitePool,
}

impl VotesDatabase {
    /// Open the database file at `path`, creating it when `create` is set.
    pub async fn open(path: &Path, create: bool) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create);
        let pool = SqlitePool::connect_with(options).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_election(&self, conn: &mut SqliteConnection, election: &str) -> Result<()> {
        if schema::table_exists(conn, election).await? {
            Ok(())
        } else {
            Err(DatabaseError::NotFound(election.to_string()))
        }
    }
}

/// Quote `name` for use as an SQL identifier.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Party named by a vote column, or `None` for any other column.
pub fn party_from_column(column: &str) -> Option<String> {
    column
        .strip_prefix(VOTES_PREFIX)
        .map(|party| party.trim().to_string())
}

/// Internal bookkeeping tables are not elections.
fn is_election_table(name: &str) -> bool {
    !name.starts_with("sqlite_") && !name.starts_with('_')
}

impl VoteDataSource for VotesDatabase {
    async fn list_elections(&self) -> Result<Vec<String>> {
        let mut conn = self.pool.acquire().await?;
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(&mut *conn)
                .await?;

        Ok(names.into_iter().filter(|n| is_election_table(n)).collect())
    }

    async fn list_regions(&self, election: &str) -> Result<Vec<String>> {
        let mut conn = self.pool.acquire().await?;
        self.ensure_election(&mut conn, election).await?;

        let query = format!(
            "SELECT DISTINCT {} FROM {}",
            quote_identifier(REGION_COLUMN),
            quote_identifier(election)
        );
        let regions: Vec<Option<String>> = sqlx::query_scalar(&query)
            .fetch_all(&mut *conn)
            .await?;

        Ok(regions.into_iter().flatten().collect())
    }

    async fn get_vote_data(
        &self,
        election: &str,
        region: Option<&str>,
        ignore_other: bool,
    ) -> Result<VoteData> {
        let mut conn = self.pool.acquire().await?;
        self.ensure_election(&mut conn, election).await?;

        let mut columns: Vec<(String, String)> = schema::column_names(&mut conn, election)
            .await?
            .into_iter()
            .filter_map(|column| party_from_column(&column).map(|party| (column, party)))
            .collect();
        if ignore_other {
            columns.retain(|(_, party)| party != OTHER_PARTY);
        }

        let filter = match region {
            Some(_) => format!(" WHERE {} = ?", quote_identifier(REGION_COLUMN)),
            None => String::new(),
        };

        if columns.is_empty() {
            // No party columns left, but the constituency count still matters.
            let query = format!("SELECT COUNT(*) FROM {}{}", quote_identifier(election), filter);
            let mut count_query = sqlx::query_scalar::<_, i64>(&query);
            if let Some(region) = region {
                count_query = count_query.bind(region);
            }
            let count = count_query.fetch_one(&mut *conn).await?;
            if count == 0 {
                return Ok(VoteData::empty());
            }
            return Ok(VoteData::new(Vec::new(), vec![Vec::new(); count as usize]));
        }

        let select_list = columns
            .iter()
            .map(|(column, _)| format!("CAST({0} AS REAL)", quote_identifier(column)))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT {} FROM {}{}",
            select_list,
            quote_identifier(election),
            filter
        );
        debug!(election, ?region, ignore_other, "fetching vote data");

        let mut select = sqlx::query(&query);
        if let Some(region) = region {
            select = select.bind(region);
        }
        let rows = select.fetch_all(&mut *conn).await?;
        if rows.is_empty() {
            return Ok(VoteData::empty());
        }

        let mut votes = Vec::with_capacity(rows.len());
        for row in rows {
            let mut constituency = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                let value: Option<f64> = row.try_get(index)?;
                constituency.push(value.filter(|v| !v.is_nan()).unwrap_or(0.0));
            }
            votes.push(constituency);
        }

        let parties = columns.into_iter().map(|(_, party)| party).collect();
        Ok(VoteData::new(parties, votes))
    }
}


#[cfg(test)]
mod tests {
    use super::schema::CellValue::{self, Empty, Number, Text};
    use super::testing::{add_election, test_database};
    use super::*;

    fn row(region: &str, votes: &[Option<f64>]) -> Vec<CellValue> {
        let mut cells = vec![Text(region.to_string())];
        cells.extend(votes.iter().map(|v| v.map_or(Empty, Number)));
        cells
    }

    async fn seeded() -> testing::TestDatabase {
        let test = test_database().await;
        add_election(
            &test.db,
            "2019",
            &["Country/Region", "Votes-PartyA", "Votes-PartyB", "Votes-Other"],
            vec![
                row("Region1", &[Some(10.0), Some(20.0), Some(50.0)]),
                row("Region2", &[Some(30.0), None, Some(70.0)]),
            ],
        )
        .await;
        add_election(
            &test.db,
            "2017",
            &["Country/Region", "Votes-PartyA", "Votes-PartyB"],
            vec![row("Region1", &[Some(1.0), Some(2.0)])],
        )
        .await;
        test
    }

    #[tokio::test]
    async fn test_list_elections_in_storage_order() {
        let test = seeded().await;
        let elections = test.db.list_elections().await.unwrap();
        assert_eq!(elections, vec!["2019".to_string(), "2017".to_string()]);
    }

    #[tokio::test]
    async fn test_list_regions() {
        let test = seeded().await;
        let regions = test.db.list_regions("2019").await.unwrap();
        assert_eq!(regions, vec!["Region1".to_string(), "Region2".to_string()]);
    }

    #[tokio::test]
    async fn test_list_regions_unknown_election() {
        let test = seeded().await;
        let err = test.db.list_regions("1066").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(name) if name == "1066"));
    }

    #[tokio::test]
    async fn test_get_vote_data_no_params() {
        let test = seeded().await;
        let data = test.db.get_vote_data("2019", None, false).await.unwrap();
        assert_eq!(data.parties, vec!["PartyA", "PartyB", "Other"]);
        assert_eq!(
            data.votes,
            vec![vec![10.0, 20.0, 50.0], vec![30.0, 0.0, 70.0]]
        );
    }

    #[tokio::test]
    async fn test_get_vote_data_by_region() {
        let test = seeded().await;
        let data = test
            .db
            .get_vote_data("2019", Some("Region1"), false)
            .await
            .unwrap();
        assert_eq!(data.votes, vec![vec![10.0, 20.0, 50.0]]);
    }

    #[tokio::test]
    async fn test_get_vote_data_missing_region_is_empty() {
        let test = seeded().await;
        let data = test
            .db
            .get_vote_data("2019", Some("Does not exist"), false)
            .await
            .unwrap();
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn test_get_vote_data_ignore_other() {
        let test = seeded().await;
        let data = test.db.get_vote_data("2019", None, true).await.unwrap();
        assert_eq!(data.parties, vec!["PartyA", "PartyB"]);
        assert_eq!(data.votes, vec![vec![10.0, 20.0], vec![30.0, 0.0]]);
    }

    #[tokio::test]
    async fn test_get_vote_data_ignore_other_when_absent() {
        let test = seeded().await;
        let with = test.db.get_vote_data("2017", None, true).await.unwrap();
        let without = test.db.get_vote_data("2017", None, false).await.unwrap();
        assert_eq!(with, without);
    }

    #[tokio::test]
    async fn test_get_vote_data_unknown_election() {
        let test = seeded().await;
        let err = test.db.get_vote_data("1066", None, false).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_null_region_is_not_listed_or_allocated_by_region() {
        use crate::elections::{PrMethod, ProportionalRepresentation, SeatAllocator};

        let test = test_database().await;
        add_election(
            &test.db,
            "2019",
            &["Country/Region", "Votes-PartyA", "Votes-PartyB"],
            vec![
                row("Region1", &[Some(10.0), Some(20.0)]),
                row("Region1", &[Some(30.0), Some(5.0)]),
                vec![Empty, Number(100.0), Number(1.0)],
            ],
        )
        .await;

        let regions = test.db.list_regions("2019").await.unwrap();
        assert_eq!(regions, vec!["Region1".to_string()]);

        let by_region = ProportionalRepresentation::new(PrMethod::ByRegion, true)
            .allocate(&test.db, "2019")
            .await
            .unwrap();
        assert_eq!(by_region.total_seats(), 2);

        let whole = ProportionalRepresentation::new(PrMethod::EntireElectorate, true)
            .allocate(&test.db, "2019")
            .await
            .unwrap();
        assert_eq!(whole.total_seats(), 3);
    }

    #[test]
    fn test_party_from_column() {
        assert_eq!(party_from_column("Votes- Lab "), Some("Lab".to_string()));
        assert_eq!(party_from_column("Vote share-Lab"), None);
    }
}
