//! Tool embeddings
//!
//! Vectors for tool names come from a precomputed snapshot shipped with the
//! host and are backfilled on demand through an [`EmbeddingService`]. The
//! [`ToolEmbeddingsComputer`] ranks available tools against a query vector.

mod computer;
mod error;
mod mock;
mod ranker;
mod snapshot;
mod store;
mod traits;

pub use computer::ToolEmbeddingsComputer;
pub use error::{EmbeddingError, EmbeddingResult};
pub use mock::{MockEmbeddingMode, MockEmbeddingService};
pub use ranker::{cosine_distance, cosine_similarity, DistanceFn, Ranker, SimilarityRanker};
pub use snapshot::{FileEmbeddingSnapshot, SnapshotFile, StaticEmbeddingSnapshot};
pub use store::EmbeddingStore;
pub use traits::{Embedding, EmbeddingKind, EmbeddingService, EmbeddingSnapshotSource};
