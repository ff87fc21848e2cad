//! Global transitive clustering of AUTO-DUP decision edges, with consistency
//! gates that catch the contradictions a pairwise decision can't see.
//!
//! [`union_find::UnionFind`] computes connected components over AUTO-DUP
//! edges. [`consistency::check_cluster_consistency`] flags hard conflicts
//! (conflicting DOI/PMID, an internal AUTO_KEEP, special-record risk) and
//! soft conflicts (year spread, title-key divergence, weak-edge bridging).
//! [`cluster_builder::build_clusters`] ties both together, splitting
//! conflicted components deterministically by identifier.

pub mod cluster_builder;
pub mod consistency;
pub mod error;
pub mod models;
pub mod union_find;

pub use cluster_builder::build_clusters;
pub use consistency::{check_cluster_consistency, split_cluster_by_id};
pub use error::ClusteringError;
pub use models::{
    Cluster, ClusterConsistency, ClusterStatus, ClusterSupport, ClusteringConfig, ConflictType,
    Edge, compute_cluster_id, STRONG_REASON_CODES,
};
pub use union_find::UnionFind;
