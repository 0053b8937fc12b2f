mod analysis;
mod cluster;
mod config;
mod error;
mod feature;
mod ingest;
mod normalize;
mod record;
mod report;
mod segment;
mod smooth;
mod utils;

pub use analysis::*;
pub use cluster::*;
pub use config::*;
pub use error::*;
pub use feature::*;
pub use ingest::*;
pub use normalize::*;
pub use record::*;
pub use report::*;
pub use segment::*;
pub use smooth::*;
pub use utils::*;
