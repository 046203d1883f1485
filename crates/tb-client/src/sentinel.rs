//! Visibility edge detector for the marker placed after the last rendered
//! ticket.

/// Fires once per hidden→visible transition of the sentinel, and only while
/// enabled. Disabling forgets the last observation, so a sentinel that is
/// still on screen when loading finishes counts as newly visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sentinel {
    was_visible: bool,
}

impl Sentinel {
    pub fn observe(&mut self, visible: bool, enabled: bool) -> bool {
        if !enabled {
            self.was_visible = false;
            return false;
        }
        let fire = visible && !self.was_visible;
        self.was_visible = visible;
        fire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_per_transition() {
        let mut sentinel = Sentinel::default();
        assert!(sentinel.observe(true, true));
        assert!(!sentinel.observe(true, true));
        assert!(!sentinel.observe(false, true));
        assert!(sentinel.observe(true, true));
    }

    #[test]
    fn test_disabled_never_fires_and_rearms() {
        let mut sentinel = Sentinel::default();
        assert!(!sentinel.observe(true, false));
        assert!(sentinel.observe(true, true));
        // a fetch started, then finished with the marker still on screen
        assert!(!sentinel.observe(true, false));
        assert!(sentinel.observe(true, true));
    }
}
