//! Which election is being looked at, and how it is analysed.

use crate::elections::{PrMethod, DEFAULT_MAXIMUM_COALITION_SIZE};
use serde::{Deserialize, Serialize};

/// Display form of an election table name.
///
/// The two 1974 elections are stored as `1974F` and `1974O`.
pub fn readable_election_name(election: &str) -> String {
    match election {
        "1974F" => "1974 February".to_string(),
        "1974O" => "1974 October".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub pr_method: PrMethod,
    /// Drop the "Other" column before PR allocation.
    pub ignore_other: bool,
    pub maximum_coalition_size: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            pr_method: PrMethod::ByRegion,
            ignore_other: true,
            maximum_coalition_size: DEFAULT_MAXIMUM_COALITION_SIZE,
        }
    }
}

/// The list of elections and a cursor into it.
#[derive(Debug, Clone)]
pub struct Session {
    elections: Vec<String>,
    current: usize,
}

impl Session {
    /// Start at the most recent (last listed) election. `None` when there are no elections.
    pub fn new(elections: Vec<String>) -> Option<Self> {
        let current = elections.len().checked_sub(1)?;
        Some(Self { elections, current })
    }

    /// Move to `election`, returning false when it is not listed.
    pub fn select(&mut self, election: &str) -> bool {
        match self.elections.iter().position(|e| e == election) {
            Some(index) => {
                self.current = index;
                true
            }
            None => false,
        }
    }

    /// Step `offset` elections forward or back, stopping at either end.
    pub fn navigate(&mut self, offset: i64) {
        let last = self.elections.len() as i64 - 1;
        self.current = (self.current as i64).saturating_add(offset).clamp(0, last) as usize;
    }

    pub fn current(&self) -> &str {
        &self.elections[self.current]
    }

    pub fn elections(&self) -> &[String] {
        &self.elections
    }

    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.elections.len()
    }
}
