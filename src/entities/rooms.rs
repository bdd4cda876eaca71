use std::fmt::{Display, Formatter};

/// Fan-out key for a conversation pair.
///
/// Derived from the unordered user id pair, never persisted: both
/// participants' connections join the same room no matter which side
/// initiated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RoomKey(String);

impl RoomKey {
    pub fn for_pair(user_a: i64, user_b: i64) -> Self {
        let (lo, hi) = if user_a <= user_b {
            (user_a, user_b)
        } else {
            (user_b, user_a)
        };
        Self(format!("{lo}:{hi}"))
    }
}

impl Display for RoomKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
