use super::SeatAllocator;
use crate::data::VoteDataSource;
use crate::database::Result;
use crate::model::{SeatResult, VoteData};
use tracing::debug;

/// One seat per constituency to the party with the most votes there.
///
/// Every party tied on the highest vote in a constituency is credited with
/// that seat, so ties inflate the seat total. A constituency where every
/// party has zero votes credits all of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPastThePost;

impl SeatAllocator for FirstPastThePost {
    fn election_type(&self) -> &'static str {
        "First Past The Post"
    }

    async fn allocate<S: VoteDataSource>(&self, source: &S, election: &str) -> Result<SeatResult> {
        let data = source.get_vote_data(election, None, false).await?;
        debug!(
            election,
            constituencies = data.num_constituencies(),
            "allocating seats by plurality"
        );
        Ok(plurality_seats(&data))
    }
}

/// Seats per party in column order, zero-seat parties included.
pub fn plurality_seats(data: &VoteData) -> SeatResult {
    let mut seats = vec![0u32; data.parties.len()];

    for row in 0..data.num_constituencies() {
        let winning_votes = (0..data.parties.len())
            .map(|column| data.vote(row, column))
            .fold(0.0, f64::max);

        for (column, party_seats) in seats.iter_mut().enumerate() {
            if data.vote(row, column) == winning_votes {
                *party_seats += 1;
            }
        }
    }

    data.parties.iter().cloned().zip(seats).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing::StaticVoteData;

    fn data(parties: &[&str], votes: Vec<Vec<f64>>) -> VoteData {
        VoteData::new(parties.iter().map(|p| p.to_string()).collect(), votes)
    }

    #[test]
    fn test_plurality_winner_per_constituency() {
        let result = plurality_seats(&data(
            &["A", "B", "C"],
            vec![
                vec![10.0, 5.0, 1.0],
                vec![2.0, 8.0, 3.0],
                vec![7.0, 1.0, 0.0],
            ],
        ));
        assert_eq!(result.get("A"), Some(2));
        assert_eq!(result.get("B"), Some(1));
        assert_eq!(result.get("C"), Some(0));
        assert_eq!(result.total_seats(), 3);
    }

    #[test]
    fn test_tied_leaders_each_get_a_seat() {
        let result = plurality_seats(&data(
            &["A", "B", "C"],
            vec![vec![10.0, 10.0, 1.0], vec![1.0, 2.0, 3.0]],
        ));
        assert_eq!(result.get("A"), Some(1));
        assert_eq!(result.get("B"), Some(1));
        assert_eq!(result.get("C"), Some(1));
        assert!(result.total_seats() > 2);
    }

    #[test]
    fn test_all_zero_row_credits_every_party() {
        let result = plurality_seats(&data(&["A", "B"], vec![vec![0.0, 0.0]]));
        assert_eq!(result.get("A"), Some(1));
        assert_eq!(result.get("B"), Some(1));
    }

    #[test]
    fn test_empty_matrix_has_no_seats() {
        let result = plurality_seats(&VoteData::empty());
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_allocate_counts_other() {
        let source = StaticVoteData::whole(
            "2019",
            &["A", "Other"],
            vec![vec![1.0, 5.0], vec![4.0, 2.0]],
        );
        let result = FirstPastThePost.allocate(&source, "2019").await.unwrap();
        assert_eq!(result.get("Other"), Some(1));
        assert_eq!(result.get("A"), Some(1));
    }
}
