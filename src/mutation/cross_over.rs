use std::rc::Rc;

use rand::RngCore;

use crate::log::log;
use crate::node::{HttpMethod, Node, ParamGroup};

/// A whole-node mutation: fills in `target`'s parameters from the source
/// and the corpus. Cross-over is the only registered one for now.
pub trait MutateNode {
    fn id(&self) -> &'static str;

    fn apply(&self, rng: &mut dyn RngCore, source: &Node, corpus: &[Rc<Node>], target: &mut Node);
}

/// Scan the corpus for a donor whose `group` parameters will be merged
/// into the target.
///
/// The scan has two rules with deliberately different exit behavior,
/// preserved exactly because corpus order changes the outcome: the first
/// candidate with strictly more parameters than the current donor and a
/// different url wins immediately; otherwise the last candidate with at
/// least ceil(self/2) parameters wins.
pub fn select_favourable_donor<'c>(
    corpus: &'c [Rc<Node>],
    target: &Node,
    group: ParamGroup,
) -> Option<&'c Node> {
    if corpus.is_empty() {
        return None;
    }

    let self_count = target.params.group(group).len();
    let threshold = (self_count + 1) / 2;

    let mut donor: &Node = &corpus[0];

    for candidate in corpus {
        let count = candidate.params.group(group).len();

        if count > donor.params.group(group).len() && candidate.url != target.url {
            donor = candidate;
            break;
        } else if count >= threshold {
            donor = candidate;
        }
    }

    Some(donor)
}

/// Insert or overwrite every donor entry; entries only the target has are
/// kept as they are.
pub fn merge_params(target: &mut Node, donor: &Node, group: ParamGroup) {
    for (name, values) in donor.params.group(group).iter() {
        target
            .params
            .group_mut(group)
            .insert(name.to_string(), values.to_vec());
    }
}

/// Recombine the source's parameters with donor parameters from the
/// corpus, independently per group. The target keeps its own url and
/// method, only parameters get mixed in.
pub fn cross_over(source: &Node, corpus: &[Rc<Node>], target: &mut Node) {
    target.params = source.params.clone();

    for group in ParamGroup::ALL {
        // GET requests carry no body parameters
        if target.method == HttpMethod::Get && group == ParamGroup::Body {
            continue;
        }

        let Some(donor) = select_favourable_donor(corpus, target, group) else {
            continue;
        };

        log!("cross_over: merging {:?} params from {}", group, donor.url);

        merge_params(target, donor, group);
    }
}

pub struct CrossOver;

impl MutateNode for CrossOver {
    fn id(&self) -> &'static str {
        "cross_over"
    }

    fn apply(
        &self,
        _rng: &mut dyn RngCore,
        source: &Node,
        corpus: &[Rc<Node>],
        target: &mut Node,
    ) {
        cross_over(source, corpus, target);
    }
}
