//! Proportional representation by the D'Hondt highest-averages method.
//!
//! Seats are handed out one at a time to the party with the greatest
//! `votes / (seats_won + 1)`. See <https://en.wikipedia.org/wiki/D%27Hondt_method>.

use super::SeatAllocator;
use crate::data::VoteDataSource;
use crate::database::Result;
use crate::model::{SeatResult, VoteData};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::debug;

/// How the electorate is divided before applying D'Hondt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum PrMethod {
    /// Allocate each region's seats separately and sum them.
    #[default]
    ByRegion,
    /// Allocate every seat from the national vote totals.
    EntireElectorate,
}

impl std::fmt::Display for PrMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrMethod::ByRegion => write!(f, "By Region"),
            PrMethod::EntireElectorate => write!(f, "Entire Electorate"),
        }
    }
}

/// D'Hondt allocation with one seat per constituency.
#[derive(Debug, Clone, Copy)]
pub struct ProportionalRepresentation {
    pub method: PrMethod,
    /// Leave the "Other" column out of every vote query.
    pub ignore_other: bool,
}

impl Default for ProportionalRepresentation {
    fn default() -> Self {
        Self {
            method: PrMethod::ByRegion,
            ignore_other: true,
        }
    }
}

impl ProportionalRepresentation {
    pub fn new(method: PrMethod, ignore_other: bool) -> Self {
        Self {
            method,
            ignore_other,
        }
    }
}

impl SeatAllocator for ProportionalRepresentation {
    fn election_type(&self) -> &'static str {
        "Proportional Representation"
    }

    async fn allocate<S: VoteDataSource>(&self, source: &S, election: &str) -> Result<SeatResult> {
        match self.method {
            PrMethod::EntireElectorate => {
                let data = source
                    .get_vote_data(election, None, self.ignore_other)
                    .await?;
                Ok(proportional_seats(&data))
            }
            PrMethod::ByRegion => {
                let regions = source.list_regions(election).await?;
                let mut total = SeatResult::new();
                for region in &regions {
                    let data = source
                        .get_vote_data(election, Some(region), self.ignore_other)
                        .await?;
                    debug!(
                        election,
                        region = %region,
                        seats = data.num_constituencies(),
                        "allocating region"
                    );
                    total = total.merge_positive(&proportional_seats(&data));
                }
                Ok(total)
            }
        }
    }
}

/// D'Hondt over `data`'s party totals, one seat per constituency row.
pub fn proportional_seats(data: &VoteData) -> SeatResult {
    dhondt_seats(&data.parties, &data.party_totals(), data.num_constituencies())
}

#[derive(Debug, Clone, Copy)]
struct Quotient {
    value: f64,
    party: usize,
}

// Highest quotient first; equal quotients go to the earlier party.
impl Ord for Quotient {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| other.party.cmp(&self.party))
    }
}

impl PartialOrd for Quotient {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Quotient {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Quotient {}

/// Award `total_seats` among `parties` by D'Hondt.
///
/// Returns every party in input order, including those without seats.
pub fn dhondt_seats(parties: &[String], totals: &[f64], total_seats: usize) -> SeatResult {
    let mut obtained = vec![0u32; parties.len()];
    let mut heap: BinaryHeap<Quotient> = totals
        .iter()
        .take(parties.len())
        .enumerate()
        .map(|(party, &value)| Quotient { value, party })
        .collect();

    for _ in 0..total_seats {
        let best = match heap.pop() {
            Some(best) => best,
            None => break,
        };
        obtained[best.party] += 1;
        heap.push(Quotient {
            value: totals[best.party] / f64::from(obtained[best.party] + 1),
            party: best.party,
        });
    }

    parties.iter().cloned().zip(obtained).collect()
}
