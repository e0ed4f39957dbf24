use crate::model::{Coalition, SeatResult};

/// Seats needed to govern: `ceil((total_seats + 1) / 2)`.
pub fn majority_threshold(total_seats: u32) -> u32 {
    (total_seats + 2) / 2
}

/// Depth-first search for governing coalitions of bounded size.
///
/// Parties are explored in descending seat order. A selection that reaches
/// the majority is emitted and not extended further, so no emitted coalition
/// has a majority-holding prefix. Results from different branches are not
/// deduplicated against each other.
#[derive(Debug, Clone, Copy)]
pub struct CoalitionFinder {
    maximum_coalition_size: usize,
}

impl CoalitionFinder {
    pub fn new(maximum_coalition_size: usize) -> Self {
        Self {
            maximum_coalition_size,
        }
    }

    pub fn maximum_coalition_size(&self) -> usize {
        self.maximum_coalition_size
    }

    /// All coalitions in discovery order; empty when none can reach a majority.
    pub fn find(&self, results: &SeatResult) -> Vec<Coalition> {
        let mut parties: Vec<(&str, u32)> = results.iter().collect();
        parties.sort_by(|a, b| b.1.cmp(&a.1));

        let threshold = majority_threshold(results.total_seats());
        let mut selection = Vec::with_capacity(self.maximum_coalition_size);
        let mut coalitions = Vec::new();
        self.search(&parties, threshold, &mut selection, 0, &mut coalitions);
        coalitions
    }

    fn search<'a>(
        &self,
        remaining: &[(&'a str, u32)],
        threshold: u32,
        selection: &mut Vec<&'a str>,
        selected_seats: u32,
        coalitions: &mut Vec<Coalition>,
    ) {
        if selected_seats >= threshold {
            coalitions.push(selection.iter().map(|p| p.to_string()).collect());
            return;
        }

        if selection.len() + 1 > self.maximum_coalition_size {
            return;
        }

        for (index, &(party, seats)) in remaining.iter().enumerate() {
            selection.push(party);
            self.search(
                &remaining[index + 1..],
                threshold,
                selection,
                selected_seats + seats,
                coalitions,
            );
            selection.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seats(pairs: &[(&str, u32)]) -> SeatResult {
        pairs.iter().map(|(p, s)| (p.to_string(), *s)).collect()
    }

    fn coalitions(expected: &[&[&str]]) -> Vec<Coalition> {
        expected
            .iter()
            .map(|c| c.iter().map(|p| p.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_majority_threshold() {
        assert_eq!(majority_threshold(9), 5);
        assert_eq!(majority_threshold(8), 5);
        assert_eq!(majority_threshold(650), 326);
        assert_eq!(majority_threshold(0), 1);
    }

    #[test]
    fn test_typical_election() {
        let results = seats(&[("party1", 1), ("party2", 1), ("party3", 3), ("party4", 4)]);
        let found = CoalitionFinder::new(3).find(&results);
        assert_eq!(
            found,
            coalitions(&[
                &["party4", "party3"],
                &["party4", "party1"],
                &["party4", "party2"],
                &["party3", "party1", "party2"],
            ])
        );
    }

    #[test]
    fn test_single_winner() {
        let results = seats(&[("party1", 10), ("party2", 1), ("party3", 1), ("party4", 1)]);
        let found = CoalitionFinder::new(3).find(&results);
        assert_eq!(found, coalitions(&[&["party1"]]));
    }

    #[test]
    fn test_no_viable_coalition() {
        let results: SeatResult = (1..=7).map(|i| (format!("party{}", i), 1)).collect();
        assert!(CoalitionFinder::new(3).find(&results).is_empty());
    }

    #[test]
    fn test_larger_cap_reaches_majority() {
        let results: SeatResult = (1..=7).map(|i| (format!("party{}", i), 1)).collect();
        let found = CoalitionFinder::new(4).find(&results);
        // Every 4-of-7 combination, 35 in all, first in lexical order.
        assert_eq!(found.len(), 35);
        assert_eq!(found[0], vec!["party1", "party2", "party3", "party4"]);
    }

    #[test]
    fn test_branches_stop_at_majority_or_cap() {
        // Threshold 6: A+D stalls at 5 with nothing left to add after D.
        let results = seats(&[("A", 4), ("B", 3), ("C", 2), ("D", 1)]);

        let found = CoalitionFinder::new(3).find(&results);
        assert_eq!(
            found,
            coalitions(&[&["A", "B"], &["A", "C"], &["B", "C", "D"]])
        );

        let capped = CoalitionFinder::new(2).find(&results);
        assert_eq!(capped, coalitions(&[&["A", "B"], &["A", "C"]]));
    }

    #[test]
    fn test_empty_results() {
        assert!(CoalitionFinder::new(3).find(&SeatResult::new()).is_empty());
    }
}
