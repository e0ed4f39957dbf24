//! Side-by-side outcome of one election under two voting systems.

use crate::data::VoteDataSource;
use crate::elections::{Election, Result, SeatAllocator};
use crate::model::{Coalition, SeatResult};
use crate::session::readable_election_name;
use itertools::Itertools;
use serde::Serialize;

/// Seats each party gains moving from `from` to `to`.
///
/// Covers every party in either result; parties with no change are left out.
/// Largest swings first, in either direction.
pub fn seat_differences(from: &SeatResult, to: &SeatResult) -> Vec<(String, i64)> {
    let mut differences: Vec<(String, i64)> = from
        .parties()
        .chain(to.parties())
        .unique()
        .map(|party| {
            let before = i64::from(from.get(party).unwrap_or(0));
            let after = i64::from(to.get(party).unwrap_or(0));
            (party.to_string(), after - before)
        })
        .filter(|(_, difference)| *difference != 0)
        .collect();
    differences.sort_by_key(|(_, difference)| std::cmp::Reverse(difference.abs()));
    differences
}

/// Computed outcome of one election under one voting system.
#[derive(Debug, Serialize)]
pub struct ElectionReport {
    pub election: String,
    #[serde(rename = "electionName")]
    pub election_name: String,
    #[serde(rename = "electionType")]
    pub election_type: String,
    #[serde(rename = "maximumCoalitionSize")]
    pub maximum_coalition_size: usize,
    #[serde(rename = "totalSeats")]
    pub total_seats: u32,
    pub results: SeatResult,
    pub coalitions: Vec<Coalition>,
    #[serde(rename = "outrightWinner")]
    pub outright_winner: Option<String>,
}

impl ElectionReport {
    /// Snapshot an election whose results and coalitions have been calculated.
    pub fn from_election<S, A>(election: &Election<'_, S, A>) -> Result<Self>
    where
        S: VoteDataSource,
        A: SeatAllocator,
    {
        let results = election.results()?;
        Ok(Self {
            election: election.election_name().to_string(),
            election_name: readable_election_name(election.election_name()),
            election_type: election.election_type().to_string(),
            maximum_coalition_size: election.maximum_coalition_size(),
            total_seats: results.total_seats(),
            results: results.clone(),
            coalitions: election.coalitions()?.to_vec(),
            outright_winner: election.outright_winner()?.map(str::to_string),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ComparisonReport {
    pub first: ElectionReport,
    pub second: ElectionReport,
    /// Seat change per party going from `first` to `second`.
    pub differences: Vec<(String, i64)>,
}

impl ComparisonReport {
    pub fn new(first: ElectionReport, second: ElectionReport) -> Self {
        let differences = seat_differences(&first.results, &second.results);
        Self {
            first,
            second,
            differences,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing::StaticVoteData;
    use crate::elections::{FirstPastThePost, PrMethod, ProportionalRepresentation};

    fn seats(pairs: &[(&str, u32)]) -> SeatResult {
        pairs.iter().map(|(p, s)| (p.to_string(), *s)).collect()
    }

    #[test]
    fn test_differences_cover_both_sides() {
        let fptp = seats(&[("A", 10), ("B", 5), ("C", 1)]);
        let pr = seats(&[("A", 7), ("B", 5), ("D", 2), ("C", 2)]);

        let differences = seat_differences(&fptp, &pr);

        assert_eq!(
            differences,
            vec![
                ("A".to_string(), -3),
                ("D".to_string(), 2),
                ("C".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_identical_results_have_no_differences() {
        let result = seats(&[("A", 3), ("B", 2)]);
        assert!(seat_differences(&result, &result).is_empty());
    }

    #[tokio::test]
    async fn test_report_requires_calculation() {
        let source = StaticVoteData::whole("1974F", &["A"], vec![vec![1.0]]);
        let election = Election::new("1974F", &source, FirstPastThePost, 3);
        assert!(ElectionReport::from_election(&election).is_err());
    }

    #[tokio::test]
    async fn test_comparison_report() {
        let source = StaticVoteData::whole(
            "1974F",
            &["A", "B", "Other"],
            vec![
                vec![60.0, 40.0, 5.0],
                vec![55.0, 45.0, 5.0],
                vec![52.0, 48.0, 5.0],
            ],
        );
        let mut fptp = Election::new("1974F", &source, FirstPastThePost, 3);
        let mut pr = Election::new(
            "1974F",
            &source,
            ProportionalRepresentation::new(PrMethod::EntireElectorate, true),
            3,
        );
        fptp.calculate_all().await.unwrap();
        pr.calculate_all().await.unwrap();

        let report = ComparisonReport::new(
            ElectionReport::from_election(&fptp).unwrap(),
            ElectionReport::from_election(&pr).unwrap(),
        );

        assert_eq!(report.first.election_name, "1974 February");
        assert_eq!(report.first.outright_winner.as_deref(), Some("A"));
        assert_eq!(report.second.total_seats, 3);
        assert_eq!(
            report.differences,
            vec![("A".to_string(), -1), ("B".to_string(), 1)]
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["first"]["electionType"], "First Past The Post");
        assert_eq!(json["first"]["results"]["A"], 3);
    }
}
