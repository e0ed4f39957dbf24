//! Access to per-constituency vote counts.
//!
//! [`VoteDataSource`] is the seam between the seat allocators and whatever
//! holds the votes. [`crate::database::VotesDatabase`] is the SQLite-backed
//! implementation; tests use canned in-memory sources.

use crate::database::Result;
use crate::model::VoteData;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

#[allow(async_fn_in_trait)]
pub trait VoteDataSource {
    /// All usable elections, in storage order.
    async fn list_elections(&self) -> Result<Vec<String>>;

    /// Distinct region labels recorded for `election`.
    ///
    /// Fails with [`crate::database::DatabaseError::NotFound`] for an unknown election.
    async fn list_regions(&self, election: &str) -> Result<Vec<String>>;

    /// Every party's vote column and one row per matching constituency.
    ///
    /// With `region`, only constituencies tagged with exactly that region are
    /// returned; no match yields [`VoteData::empty`]. With `ignore_other`, the
    /// "Other" column is dropped when present.
    async fn get_vote_data(
        &self,
        election: &str,
        region: Option<&str>,
        ignore_other: bool,
    ) -> Result<VoteData>;
}

impl<T: VoteDataSource> VoteDataSource for &T {
    async fn list_elections(&self) -> Result<Vec<String>> {
        (**self).list_elections().await
    }

    async fn list_regions(&self, election: &str) -> Result<Vec<String>> {
        (**self).list_regions(election).await
    }

    async fn get_vote_data(
        &self,
        election: &str,
        region: Option<&str>,
        ignore_other: bool,
    ) -> Result<VoteData> {
        (**self).get_vote_data(election, region, ignore_other).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VoteQuery {
    election: String,
    region: Option<String>,
    ignore_other: bool,
}

/// Memoizes reads from another [`VoteDataSource`].
///
/// Only successful reads are cached. Entries live until [`CachedVoteData::invalidate`]
/// or [`CachedVoteData::invalidate_election`] is called.
pub struct CachedVoteData<S> {
    inner: S,
    elections: Mutex<Option<Vec<String>>>,
    regions: Mutex<HashMap<String, Vec<String>>>,
    votes: Mutex<HashMap<VoteQuery, VoteData>>,
}

impl<S: VoteDataSource> CachedVoteData<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            elections: Mutex::new(None),
            regions: Mutex::new(HashMap::new()),
            votes: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Forget everything.
    pub fn invalidate(&self) {
        *self.elections.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.regions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.votes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Forget cached reads of one election, and the election list.
    pub fn invalidate_election(&self, election: &str) {
        *self.elections.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.regions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(election);
        self.votes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|query, _| query.election != election);
    }
}

impl<S: VoteDataSource> VoteDataSource for CachedVoteData<S> {
    async fn list_elections(&self) -> Result<Vec<String>> {
        if let Some(cached) = self
            .elections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Ok(cached);
        }

        let elections = self.inner.list_elections().await?;
        *self.elections.lock().unwrap_or_else(PoisonError::into_inner) = Some(elections.clone());
        Ok(elections)
    }

    async fn list_regions(&self, election: &str) -> Result<Vec<String>> {
        if let Some(cached) = self
            .regions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(election)
        {
            return Ok(cached.clone());
        }

        let regions = self.inner.list_regions(election).await?;
        self.regions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(election.to_string(), regions.clone());
        Ok(regions)
    }

    async fn get_vote_data(
        &self,
        election: &str,
        region: Option<&str>,
        ignore_other: bool,
    ) -> Result<VoteData> {
        let query = VoteQuery {
            election: election.to_string(),
            region: region.map(str::to_string),
            ignore_other,
        };
        if let Some(cached) = self
            .votes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&query)
        {
            debug!(election, ?region, ignore_other, "vote data cache hit");
            return Ok(cached.clone());
        }

        let data = self
            .inner
            .get_vote_data(election, region, ignore_other)
            .await?;
        self.votes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(query, data.clone());
        Ok(data)
    }
}
