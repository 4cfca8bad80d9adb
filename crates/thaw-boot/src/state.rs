use std::fmt;

/// Extraction state for a single boot.
///
/// Only `NotExtracted` and `Extracted` survive a reboot, and only through
/// the marker file: see [`BootState::observe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootState {
    NotExtracted,
    Extracting,
    Extracted,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootEvent {
    /// Boot found the marker absent and starts writing entries.
    Start,
    /// Every entry and then the marker were written.
    Completed,
    /// Any error while extracting or writing the marker.
    Errored,
    /// The user deleted the marker; seen on the next boot.
    MarkerRemoved,
}

impl BootState {
    /// The state a boot starts in, derived solely from the marker.
    pub fn observe(marker_present: bool) -> Self {
        if marker_present {
            Self::Extracted
        } else {
            Self::NotExtracted
        }
    }

    /// Apply `event`, or `None` if the transition is not allowed.
    pub fn next(self, event: BootEvent) -> Option<Self> {
        use BootEvent::*;
        use BootState::*;

        match (self, event) {
            (NotExtracted, Start) => Some(Extracting),
            (Extracting, Completed) => Some(Extracted),
            (Extracting, Errored) => Some(Failed),
            (Extracted, MarkerRemoved) => Some(NotExtracted),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Extracted | Self::Failed)
    }
}

impl fmt::Display for BootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotExtracted => "not-extracted",
            Self::Extracting => "extracting",
            Self::Extracted => "extracted",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_follows_marker() {
        assert_eq!(BootState::observe(false), BootState::NotExtracted);
        assert_eq!(BootState::observe(true), BootState::Extracted);
    }

    #[test]
    fn happy_path() {
        let state = BootState::NotExtracted
            .next(BootEvent::Start)
            .and_then(|s| s.next(BootEvent::Completed));
        assert_eq!(state, Some(BootState::Extracted));
    }

    #[test]
    fn failure_path() {
        let state = BootState::NotExtracted
            .next(BootEvent::Start)
            .and_then(|s| s.next(BootEvent::Errored));
        assert_eq!(state, Some(BootState::Failed));
        assert!(state.unwrap().is_terminal());
    }

    #[test]
    fn marker_removal_rearms() {
        assert_eq!(
            BootState::Extracted.next(BootEvent::MarkerRemoved),
            Some(BootState::NotExtracted)
        );
    }

    #[test]
    fn invalid_transitions() {
        assert_eq!(BootState::Extracted.next(BootEvent::Start), None);
        assert_eq!(BootState::NotExtracted.next(BootEvent::Completed), None);
        assert_eq!(BootState::Failed.next(BootEvent::Completed), None);
        assert_eq!(BootState::Extracting.next(BootEvent::MarkerRemoved), None);
        assert!(!BootState::Extracting.is_terminal());
    }
}
