mod async_conversion;
mod best_effort_path_ext;
mod byte_size_ext;

pub use async_conversion::{AsyncTryFrom, AsyncTryInto};
pub use best_effort_path_ext::BestEffortPathExt;
pub use byte_size_ext::{ByteSizeExt, SizeFormatError};
