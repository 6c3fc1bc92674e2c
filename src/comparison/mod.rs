//! Layer comparison: two directory trees become two color-annotated charts,
//! and a node selected in one chart can be resolved in the other.

mod color;
mod compare;
mod lookup;
mod summary;

pub use color::Color;
pub use compare::{ComparisonNode, compare};
pub use lookup::{ChartTree, find_corresponding, path_from_root};
pub use summary::render_summary;
