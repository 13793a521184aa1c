use rand::distributions::WeightedIndex;
use rand::prelude::*;

use super::param_level::MutateParam;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("strategy registry contains no strategies")]
    Empty,

    #[error("strategy weights sum to zero")]
    ZeroTotalWeight,

    #[error("per_param and cross_over weights are both zero")]
    ZeroPathWeight,
}

/// Ordered set of per-parameter strategies with relative weights. The
/// draw normalizes by the actual weight sum, the nominal values are not
/// percentages.
pub struct StrategyRegistry {
    strategies: Vec<(u32, Box<dyn MutateParam>)>,
    distribution: WeightedIndex<u32>,
}

impl StrategyRegistry {
    pub fn new(strategies: Vec<(u32, Box<dyn MutateParam>)>) -> Result<Self, RegistryError> {
        if strategies.is_empty() {
            return Err(RegistryError::Empty);
        }

        let distribution = WeightedIndex::new(strategies.iter().map(|(weight, _)| *weight))
            .map_err(|_| RegistryError::ZeroTotalWeight)?;

        Ok(StrategyRegistry {
            strategies,
            distribution,
        })
    }

    pub fn pick(&self, rng: &mut dyn RngCore) -> &dyn MutateParam {
        self.strategies[self.distribution.sample(rng)].1.as_ref()
    }
}
