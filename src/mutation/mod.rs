pub mod choice;
pub mod cross_over;
pub mod param_level;

use std::rc::Rc;

pub use choice::{RegistryError, StrategyRegistry};

use rand::{Rng, RngCore};

use crate::configuration::MutationOptions;
use crate::log::log;
use crate::node::{Node, ParamGroup};
use crate::payloads::PayloadCollection;

use self::cross_over::{cross_over, CrossOver, MutateNode};
use self::param_level::{
    AddRandomText, AddSyntaxToken, AddXssPayload, AlterType, MutateParam, Skip,
};

pub fn build_engine(
    config: &MutationOptions,
    xss_payloads: PayloadCollection,
    syntax_tokens: PayloadCollection,
) -> Result<MutationEngine, RegistryError> {
    if config.per_param + config.cross_over == 0 {
        return Err(RegistryError::ZeroPathWeight);
    }

    let weights = &config.strategies;

    let per_param = StrategyRegistry::new(vec![
        (weights.skip, Box::new(Skip) as Box<dyn MutateParam>),
        (weights.alter_type, Box::new(AlterType)),
        (weights.random_text, Box::new(AddRandomText)),
        (
            weights.syntax_token,
            Box::new(AddSyntaxToken {
                tokens: syntax_tokens,
            }),
        ),
        (
            weights.xss_payload,
            Box::new(AddXssPayload {
                payloads: xss_payloads,
            }),
        ),
    ])?;

    let whole_node: Vec<Box<dyn MutateNode>> = vec![Box::new(CrossOver)];

    Ok(MutationEngine {
        per_param,
        whole_node,
        per_param_weight: config.per_param,
        whole_node_weight: config.cross_over,
    })
}

/// Produces one mutated request per call. Holds only configuration, no
/// node state survives between calls.
pub struct MutationEngine {
    per_param: StrategyRegistry,
    whole_node: Vec<Box<dyn MutateNode>>,
    per_param_weight: u32,
    whole_node_weight: u32,
}

impl MutationEngine {
    /// Build a new node from `source` with its parameters altered, either
    /// one strategy per parameter or a whole-node cross-over against the
    /// corpus. The source and the corpus are never modified.
    pub fn mutate(&self, rng: &mut dyn RngCore, source: &Rc<Node>, corpus: &[Rc<Node>]) -> Node {
        let mut node = Node::derived_from(source);

        if source.size == 0 {
            // per-parameter strategies are undefined without parameters
            cross_over(source, corpus, &mut node);
        } else if rng.gen_ratio(
            self.per_param_weight,
            self.per_param_weight + self.whole_node_weight,
        ) {
            self.per_param_mutate(rng, source, &mut node);
        } else {
            let index = rng.gen_range(0..self.whole_node.len());
            let mutation = &self.whole_node[index];

            log!("whole-node mutation {} on {}", mutation.id(), source.url);

            mutation.apply(rng, source, corpus, &mut node);
        }

        node.recalculate_size();
        node
    }

    /// Iterates the immutable source group while writing into the node's
    /// own copy, so entries renamed mid-iteration cannot invalidate the
    /// walk.
    fn per_param_mutate(&self, rng: &mut dyn RngCore, source: &Node, node: &mut Node) {
        for group in ParamGroup::ALL {
            *node.params.group_mut(group) = source.params.group(group).clone();

            for (name, values) in source.params.group(group).iter() {
                let strategy = self.per_param.pick(rng);
                let (new_name, new_values) = strategy.apply(rng, name, values);

                log!(
                    "strategy {} on {:?} param {name} -> {new_name}",
                    strategy.id(),
                    group
                );

                if new_name != name {
                    // drop the stale key so a rename leaves no duplicate
                    node.params.group_mut(group).remove(name);
                }

                node.params.group_mut(group).insert(new_name, new_values);
            }
        }
    }
}
