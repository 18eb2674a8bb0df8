/*
 * Graphmatch Core - Graph model and matching contracts
 *
 * Layout:
 * - shared/     : Records, document ids, Node/Edge/Graph models
 * - policy      : Pluggable node equality + edge factory
 * - adapter     : Line records → graphs
 * - matching/   : Matching strategy contract + inexact backtracking matcher
 * - serializer  : Match → output line
 */

pub mod adapter;
pub mod errors;
pub mod matching;
pub mod policy;
pub mod serializer;
pub mod shared;

pub use adapter::{Fragment, GraphAssembler, LineAdapter};
pub use errors::{GraphError, Result};
pub use matching::{InexactMatching, MatchError, MatchResult, MatchingPolicy};
pub use policy::{ContainmentPolicy, ElementPolicy, TagPolicy};
pub use serializer::{output_record, serialize_match};
pub use shared::models::{Edge, Graph, Node, NodeTag};
pub use shared::{DocumentId, Record};
