//! Seat allocation under competing voting systems, and the coalitions each
//! outcome allows.
//!
//! An [`Election`] pairs one named election with one [`SeatAllocator`]. Its
//! results and coalitions are computed explicitly, once, and read back through
//! accessors that fail until the matching computation has run.

pub mod coalitions;
pub mod fptp;
pub mod pr;

pub use coalitions::{majority_threshold, CoalitionFinder};
pub use fptp::FirstPastThePost;
pub use pr::{PrMethod, ProportionalRepresentation};

use crate::data::VoteDataSource;
use crate::database::DatabaseError;
use crate::model::{Coalition, SeatResult};
use tracing::debug;

/// Default cap on the number of parties in a coalition.
pub const DEFAULT_MAXIMUM_COALITION_SIZE: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum ElectionError {
    #[error("Vote data unavailable: {0}")]
    DataUnavailable(#[from] DatabaseError),
    #[error("{0} not calculated. Call calculate_results first.")]
    NotCalculated(&'static str),
}

pub type Result<T> = std::result::Result<T, ElectionError>;

/// A voting system: turns an election's votes into seats.
#[allow(async_fn_in_trait)]
pub trait SeatAllocator {
    /// Human-readable name of the voting system.
    fn election_type(&self) -> &'static str;

    /// Seats per party, in vote-column order.
    async fn allocate<S: VoteDataSource>(
        &self,
        source: &S,
        election: &str,
    ) -> crate::database::Result<SeatResult>;
}

pub struct Election<'a, S, A> {
    election_name: String,
    source: &'a S,
    allocator: A,
    maximum_coalition_size: usize,
    results: Option<SeatResult>,
    coalitions: Option<Vec<Coalition>>,
}

impl<'a, S: VoteDataSource, A: SeatAllocator> Election<'a, S, A> {
    /// Configure an election; nothing is fetched until [`Election::calculate_results`].
    pub fn new(
        election_name: impl Into<String>,
        source: &'a S,
        allocator: A,
        maximum_coalition_size: usize,
    ) -> Self {
        Self {
            election_name: election_name.into(),
            source,
            allocator,
            maximum_coalition_size,
            results: None,
            coalitions: None,
        }
    }

    pub fn election_name(&self) -> &str {
        &self.election_name
    }

    pub fn election_type(&self) -> &'static str {
        self.allocator.election_type()
    }

    pub fn maximum_coalition_size(&self) -> usize {
        self.maximum_coalition_size
    }

    /// Seats per party in canonical order.
    pub fn results(&self) -> Result<&SeatResult> {
        self.results
            .as_ref()
            .ok_or(ElectionError::NotCalculated("Results"))
    }

    /// Coalitions able to govern; possibly empty, or a single outright winner.
    pub fn coalitions(&self) -> Result<&[Coalition]> {
        self.coalitions
            .as_deref()
            .ok_or(ElectionError::NotCalculated("Coalitions"))
    }

    /// The sole party of the only coalition, when there is exactly one.
    pub fn outright_winner(&self) -> Result<Option<&str>> {
        let coalitions = self.coalitions()?;
        Ok(match coalitions {
            [only] if only.len() == 1 => Some(only[0].as_str()),
            _ => None,
        })
    }

    /// Fetch votes and allocate seats. Does nothing once results exist.
    pub async fn calculate_results(&mut self) -> Result<()> {
        if self.results.is_some() {
            return Ok(());
        }

        let results = self
            .allocator
            .allocate(self.source, &self.election_name)
            .await?
            .sorted();
        debug!(
            election = %self.election_name,
            election_type = self.election_type(),
            total_seats = results.total_seats(),
            "results calculated"
        );
        self.results = Some(results);
        Ok(())
    }

    /// Search the calculated results for governing coalitions.
    pub fn calculate_coalitions(&mut self) -> Result<()> {
        let results = self.results()?;
        let coalitions = CoalitionFinder::new(self.maximum_coalition_size).find(results);
        debug!(
            election = %self.election_name,
            found = coalitions.len(),
            "coalitions calculated"
        );
        self.coalitions = Some(coalitions);
        Ok(())
    }

    pub async fn calculate_all(&mut self) -> Result<()> {
        self.calculate_results().await?;
        self.calculate_coalitions()
    }
}
