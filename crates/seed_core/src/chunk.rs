//! Bounded-concurrency batch execution.
//!
//! Items are processed in consecutive groups of at most `chunk_size`. Every
//! operation of a group is in flight at once; the next group is only issued once
//! the whole previous group resolved. The first failure aborts the run.

use std::future::Future;
use std::num::NonZeroUsize;

use futures::future::try_join_all;

use crate::{SeedError, SeedResult};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChunkRunner {
    chunk_size: NonZeroUsize,
}

impl ChunkRunner {
    pub fn new(chunk_size: usize) -> SeedResult<Self> {
        let chunk_size = NonZeroUsize::new(chunk_size)
            .ok_or_else(|| SeedError::invalid("chunk size must be positive"))?;
        Ok(Self { chunk_size })
    }

    /// One item at a time.
    pub fn sequential() -> Self {
        Self {
            chunk_size: NonZeroUsize::MIN,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size.get()
    }

    /// Runs `op` over `items` and returns the results in input order.
    ///
    /// `op` itself is called synchronously, in item order, for each member of a
    /// group before the group is awaited; only the returned futures run
    /// concurrently. State mutated inside `op` therefore advances in a fixed order.
    pub async fn run<I, T, U, F, Fut>(&self, items: I, mut op: F) -> SeedResult<Vec<U>>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T) -> Fut,
        Fut: Future<Output = SeedResult<U>>,
    {
        let mut items = items.into_iter().peekable();
        let mut results = Vec::new();
        let mut group = 0usize;
        while items.peek().is_some() {
            let pending: Vec<Fut> = items
                .by_ref()
                .take(self.chunk_size.get())
                .map(&mut op)
                .collect();
            group += 1;
            log::debug!("chunk {group}: issuing {} operations", pending.len());
            results.extend(try_join_all(pending).await?);
        }
        Ok(results)
    }
}

impl Default for ChunkRunner {
    fn default() -> Self {
        Self::sequential()
    }
}
