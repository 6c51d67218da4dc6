use charon_network::minutes::Minutes;
use serde::{Deserialize, Serialize};

/// Closed service window `[earliest, latest]` in minutes since midnight.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    earliest: Minutes,
    latest: Minutes,
}

impl TimeWindow {
    pub fn new(earliest: Minutes, latest: Minutes) -> Self {
        TimeWindow { earliest, latest }
    }

    /// The full scheduling horizon, used for depot stops.
    pub fn horizon() -> Self {
        TimeWindow {
            earliest: Minutes::ZERO,
            latest: Minutes::DAY,
        }
    }

    pub fn earliest(&self) -> Minutes {
        self.earliest
    }

    pub fn latest(&self) -> Minutes {
        self.latest
    }

    pub fn contains(&self, instant: Minutes) -> bool {
        self.earliest <= instant && instant <= self.latest
    }

    pub fn is_ordered(&self) -> bool {
        self.earliest <= self.latest
    }

    /// Earliest admissible instant not before `arrival`, or `None` when the
    /// window has already closed.
    pub fn clamp_earliest(&self, arrival: Minutes) -> Option<Minutes> {
        let instant = arrival.max(self.earliest);
        if instant <= self.latest { Some(instant) } else { None }
    }
}

#[derive(Default)]
pub struct TimeWindowBuilder {
    earliest: Option<Minutes>,
    latest: Option<Minutes>,
}

impl TimeWindowBuilder {
    pub fn with_earliest(mut self, earliest: Minutes) -> Self {
        self.earliest = Some(earliest);
        self
    }

    pub fn with_latest(mut self, latest: Minutes) -> Self {
        self.latest = Some(latest);
        self
    }

    pub fn build(self) -> TimeWindow {
        TimeWindow {
            earliest: self.earliest.unwrap_or(Minutes::ZERO),
            latest: self.latest.unwrap_or(Minutes::DAY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let window = TimeWindowBuilder::default()
            .with_earliest(Minutes::new(10.0))
            .with_latest(Minutes::new(30.0))
            .build();

        assert_eq!(window.earliest(), Minutes::new(10.0));
        assert_eq!(window.latest(), Minutes::new(30.0));
        assert!(window.contains(Minutes::new(10.0)));
        assert!(!window.contains(Minutes::new(31.0)));
    }

    #[test]
    fn test_clamp_earliest() {
        let window = TimeWindow::new(Minutes::new(10.0), Minutes::new(20.0));

        assert_eq!(window.clamp_earliest(Minutes::new(5.0)), Some(Minutes::new(10.0)));
        assert_eq!(window.clamp_earliest(Minutes::new(15.0)), Some(Minutes::new(15.0)));
        assert_eq!(window.clamp_earliest(Minutes::new(25.0)), None);
    }
}
