//! Directory size trees: the data model shared by the sunburst flattener and
//! the layer comparison, plus the ways to obtain one (JSON documents produced
//! by the image analyzer, or a scan of a local directory).

mod document;
mod scan;
mod tree;

pub use document::{DocumentError, LayerSelectionError, LayerSizes, TreeDocument};
pub use scan::{ScanError, scan_directory};
pub use tree::{DirectoryNode, InsertFileError};
