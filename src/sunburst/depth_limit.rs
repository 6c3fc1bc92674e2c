/// How many directory levels below the root a traversal descends into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthLimit {
    #[default]
    Unlimited,
    Levels(usize),
}

impl DepthLimit {
    /// Whether a directory at `depth` (the root being 0) must not contribute children
    pub fn is_exceeded_at(&self, depth: usize) -> bool {
        match self {
            DepthLimit::Unlimited => false,
            DepthLimit::Levels(max) => depth > *max,
        }
    }
}

/// Zero and negative values mean no limit
impl From<i64> for DepthLimit {
    fn from(value: i64) -> Self {
        match usize::try_from(value) {
            Ok(0) | Err(_) => DepthLimit::Unlimited,
            Ok(levels) => DepthLimit::Levels(levels),
        }
    }
}
