//! Flattening of directory trees into sunburst chart rows.

mod depth_limit;
mod flatten;

pub use depth_limit::DepthLimit;
pub use flatten::{FlatChart, SunburstTrace};
