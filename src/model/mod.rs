//! Core data types shared by the vote store and the seat allocators.
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::cmp::Reverse;

/// Party name of the aggregate "miscellaneous/other" vote column.
pub const OTHER_PARTY: &str = "Other";

/// A coalition is an ordered list of distinct party names.
pub type Coalition = Vec<String>;

/// Party names and the per-constituency vote matrix for one query.
///
/// `votes[row][column]` holds the votes for `parties[column]` in one
/// constituency. Missing entries are read as zero votes.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct VoteData {
    pub parties: Vec<String>,
    pub votes: Vec<Vec<f64>>,
}

impl VoteData {
    pub fn new(parties: Vec<String>, votes: Vec<Vec<f64>>) -> Self {
        Self { parties, votes }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn num_constituencies(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parties.is_empty() && self.votes.is_empty()
    }

    /// Vote in `row` for the party at `column`, zero when absent or not a number.
    pub fn vote(&self, row: usize, column: usize) -> f64 {
        self.votes
            .get(row)
            .and_then(|r| r.get(column))
            .copied()
            .filter(|v| !v.is_nan())
            .unwrap_or(0.0)
    }

    /// Sum of each party's column across all constituencies.
    pub fn party_totals(&self) -> Vec<f64> {
        (0..self.parties.len())
            .map(|column| {
                (0..self.votes.len())
                    .map(|row| self.vote(row, column))
                    .sum()
            })
            .collect()
    }

    /// Drop the column for `party` if there is one.
    pub fn without_party(mut self, party: &str) -> Self {
        if let Some(column) = self.parties.iter().position(|p| p == party) {
            self.parties.remove(column);
            for row in &mut self.votes {
                if column < row.len() {
                    row.remove(column);
                }
            }
        }
        self
    }
}

/// Seats won per party, in a meaningful order.
///
/// Allocators produce results in vote-column order; [`SeatResult::sorted`]
/// applies the canonical presentation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatResult {
    seats: Vec<(String, u32)>,
}

impl SeatResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical order: descending by seats, with "Other" always last.
    /// Parties with equal seats keep their current relative order.
    pub fn sorted(mut self) -> Self {
        self.seats.sort_by_key(|(party, seats)| {
            let key = if party == OTHER_PARTY {
                -1
            } else {
                i64::from(*seats)
            };
            Reverse(key)
        });
        self
    }

    /// Set `party` to `seats`, appending it when not yet present.
    pub fn insert(&mut self, party: impl Into<String>, seats: u32) {
        let party = party.into();
        match self.seats.iter_mut().find(|(p, _)| *p == party) {
            Some(entry) => entry.1 = seats,
            None => self.seats.push((party, seats)),
        }
    }

    pub fn get(&self, party: &str) -> Option<u32> {
        self.seats
            .iter()
            .find(|(p, _)| p == party)
            .map(|(_, seats)| *seats)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.seats.iter().map(|(party, seats)| (party.as_str(), *seats))
    }

    pub fn parties(&self) -> impl Iterator<Item = &str> + '_ {
        self.seats.iter().map(|(party, _)| party.as_str())
    }

    pub fn total_seats(&self) -> u32 {
        self.seats.iter().map(|(_, seats)| seats).sum()
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Add two tallies, keeping only parties whose summed seats are positive.
    ///
    /// Parties from `self` come first in their existing order, followed by
    /// parties seen only in `other`.
    pub fn merge_positive(&self, other: &SeatResult) -> SeatResult {
        let mut merged = SeatResult::new();
        for (party, seats) in self.iter() {
            let total = seats + other.get(party).unwrap_or(0);
            if total > 0 {
                merged.seats.push((party.to_string(), total));
            }
        }
        for (party, seats) in other.iter() {
            if self.get(party).is_none() && seats > 0 {
                merged.seats.push((party.to_string(), seats));
            }
        }
        merged
    }
}

impl FromIterator<(String, u32)> for SeatResult {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        let mut result = SeatResult::new();
        for (party, seats) in iter {
            result.insert(party, seats);
        }
        result
    }
}

impl Serialize for SeatResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.seats.len()))?;
        for (party, seats) in &self.seats {
            map.serialize_entry(party, seats)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seats(pairs: &[(&str, u32)]) -> SeatResult {
        pairs.iter().map(|(p, s)| (p.to_string(), *s)).collect()
    }

    #[test]
    fn test_sort_places_other_last() {
        let sorted = seats(&[("p1", 2), ("p2", 1), ("p3", 4), ("Other", 7)]).sorted();
        let order: Vec<&str> = sorted.parties().collect();
        assert_eq!(order, vec!["p3", "p1", "p2", "Other"]);
    }

    #[test]
    fn test_sort_keeps_tied_parties_in_input_order() {
        let sorted = seats(&[("b", 1), ("a", 3), ("c", 1), ("d", 3)]).sorted();
        let order: Vec<&str> = sorted.parties().collect();
        assert_eq!(order, vec!["a", "d", "b", "c"]);
    }

    #[test]
    fn test_merge_positive_drops_zero_totals() {
        let first = seats(&[("A", 6), ("B", 0), ("C", 0)]);
        let second = seats(&[("B", 1), ("C", 1), ("D", 1)]);

        let merged = SeatResult::new().merge_positive(&first).merge_positive(&second);

        let expected = seats(&[("A", 6), ("B", 1), ("C", 1), ("D", 1)]);
        assert_eq!(merged, expected);
    }

    #[test]
    fn test_without_party_is_noop_when_absent() {
        let data = VoteData::new(
            vec!["A".to_string(), "B".to_string()],
            vec![vec![10.0, 20.0]],
        );
        assert_eq!(data.clone().without_party(OTHER_PARTY), data);

        let trimmed = data.without_party("A");
        assert_eq!(trimmed.parties, vec!["B".to_string()]);
        assert_eq!(trimmed.votes, vec![vec![20.0]]);
    }

    #[test]
    fn test_party_totals_treat_missing_as_zero() {
        let data = VoteData::new(
            vec!["A".to_string(), "B".to_string()],
            vec![vec![1.0, f64::NAN], vec![2.0]],
        );
        assert_eq!(data.party_totals(), vec![3.0, 0.0]);
    }

    #[test]
    fn test_serializes_in_seat_order() {
        let json = serde_json::to_string(&seats(&[("b", 2), ("a", 1)])).unwrap();
        assert_eq!(json, r#"{"b":2,"a":1}"#);
    }
}
