mod pipeline;
mod score;

pub use pipeline::{FilterOptions, FilterPipeline};
pub use score::{contains, score};
