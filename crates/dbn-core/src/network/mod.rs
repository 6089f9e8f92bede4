//! Network models: structure, CPTs and sampling.

pub mod bayes_net;
pub mod dynamic;
pub mod export;

pub use bayes_net::{BayesNet, Cpt, StructureComparison};
pub use dynamic::{DynamicBayesNet, EmSummary};
pub use export::{CptRow, DbnExport, NetworkExport, NodeExport, SlotRef};
