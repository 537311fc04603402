use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Millisecond timestamp on a session-local timebase.
///
/// The engine never reads wall-clock time on its own; callers pass `Millis`
/// in, which keeps debouncing deterministic and replayable in tests.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    pub fn saturating_add(self, other: Millis) -> Millis {
        Millis(self.0.saturating_add(other.0))
    }

    pub fn since(self, earlier: Millis) -> Millis {
        Millis(self.0.saturating_sub(earlier.0))
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl From<Duration> for Millis {
    fn from(d: Duration) -> Self {
        Millis(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::Millis;
    use std::time::Duration;

    #[test]
    fn arithmetic_saturates() {
        assert_eq!(Millis(u64::MAX).saturating_add(Millis(1)), Millis(u64::MAX));
        assert_eq!(Millis(5).since(Millis(9)), Millis::ZERO);
        assert_eq!(Millis(9).since(Millis(5)), Millis(4));
    }

    #[test]
    fn converts_from_duration() {
        assert_eq!(Millis::from(Duration::from_millis(1500)), Millis(1500));
        assert_eq!(Millis(250).as_duration(), Duration::from_millis(250));
    }
}
