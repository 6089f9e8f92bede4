//! Serializable view of a model for external renderers.

use serde::{Deserialize, Serialize};

use super::bayes_net::BayesNet;
use super::dynamic::DynamicBayesNet;
use crate::error::Result;
use dbn_math::categorical;

/// A window slot: `slice` counts from the oldest slice of the window, so
/// the present slice is `markov_lag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRef {
    pub slice: usize,
    pub node: usize,
}

/// One parent combination and the full child distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CptRow {
    /// Parent value codes in the order of [`NodeExport::parents`].
    pub parents: Vec<u32>,
    pub probabilities: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExport {
    pub name: String,
    pub parents: Vec<SlotRef>,
    /// Empty when the network has no parameters yet.
    pub cpt: Vec<CptRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkExport {
    pub markov_lag: usize,
    pub nodes: Vec<NodeExport>,
    pub topological_order: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbnExport {
    pub markov_lag: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<NetworkExport>,
    pub transitions: Vec<NetworkExport>,
}

impl BayesNet {
    pub fn export(&self) -> NetworkExport {
        let n = self.num_nodes().max(1);
        let nodes = (0..self.num_nodes())
            .map(|node| {
                let parents = self
                    .parents(node)
                    .iter()
                    .map(|&slot| SlotRef {
                        slice: slot / n,
                        node: slot % n,
                    })
                    .collect();

                let mut cpt = Vec::new();
                if !self.cpt(node).is_empty() {
                    let mut config = self.local_configuration(node);
                    loop {
                        if let Some(row) = self.cpt(node).get(&config.key()) {
                            cpt.push(CptRow {
                                parents: config.parent_values(),
                                probabilities: categorical::complete(row),
                            });
                        }
                        if !config.next_parents() {
                            break;
                        }
                    }
                }

                NodeExport {
                    name: self.attributes()[node].name().to_string(),
                    parents,
                    cpt,
                }
            })
            .collect();

        NetworkExport {
            markov_lag: self.markov_lag(),
            nodes,
            topological_order: self.topological_order().to_vec(),
        }
    }
}

impl DynamicBayesNet {
    pub fn export(&self) -> DbnExport {
        DbnExport {
            markov_lag: self.markov_lag(),
            initial: self.initial().map(BayesNet::export),
            transitions: self.transitions().iter().map(BayesNet::export).collect(),
        }
    }

    /// Pretty-printed JSON of [`export`](Self::export).
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }
}
