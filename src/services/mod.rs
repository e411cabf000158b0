pub mod enrich;
pub mod gapfill;
pub mod normalize;
pub mod pool;
pub mod profile;
pub mod recommender;
pub mod scoring;

pub use enrich::{Enricher, EnrichmentOutcome};
pub use gapfill::GapFiller;
pub use pool::PoolAssembler;
pub use profile::build_taste_profile;
pub use recommender::{RecommendationOutcome, RecommendationService};
pub use scoring::{rank_candidates, score_candidate, RankOptions};
