/// Outcome of a single parser attempt.
///
/// `Hit(0)` is a successful empty match and is distinct from `Miss`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Match {
    Hit(usize),
    Miss,
}

impl Match {
    pub fn empty() -> Self {
        Match::Hit(0)
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Match::Hit(_))
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, Match::Miss)
    }

    /// Length of a hit, `None` for a miss.
    pub fn len(&self) -> Option<usize> {
        match self {
            Match::Hit(len) => Some(*len),
            Match::Miss => None,
        }
    }

    /// Hit covering the input between two scanner positions.
    pub(crate) fn between(start: usize, end: usize) -> Self {
        Match::Hit(end - start)
    }
}
