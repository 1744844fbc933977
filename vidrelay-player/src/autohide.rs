//! Auto-hiding of the transport controls.
//!
//! Every pointer movement starts a new generation. The caller schedules the
//! returned [`HideTicket`] and hands it back when it fires; a ticket from an
//! older generation is ignored, so rescheduling never needs cancellation.

use std::time::Duration;

/// A pending hide request for one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HideTicket {
    generation: u64,
    delay: Duration,
}

impl HideTicket {
    /// How long after issue the ticket should fire.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleeps for the ticket's delay and returns it, ready to fire.
    pub async fn wait(self) -> Self {
        tokio::time::sleep(self.delay).await;
        self
    }
}

/// Visibility of the controls plus the current generation.
#[derive(Debug, Clone)]
pub struct HideTimer {
    delay: Duration,
    generation: u64,
    visible: bool,
}

impl HideTimer {
    /// Controls start visible.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            visible: true,
        }
    }

    /// Whether controls are shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Pointer moved: show controls and, while playing, arm a hide.
    pub fn activity(&mut self, playing: bool) -> Option<HideTicket> {
        self.generation += 1;
        self.visible = true;
        playing.then_some(HideTicket {
            generation: self.generation,
            delay: self.delay,
        })
    }

    /// Show controls and invalidate any armed ticket.
    pub fn force_visible(&mut self) {
        self.generation += 1;
        self.visible = true;
    }

    /// A scheduled ticket fired. Hides only if no activity happened since it
    /// was issued and playback is still running. Returns whether it hid.
    pub fn fire(&mut self, ticket: HideTicket, playing: bool) -> bool {
        if ticket.generation != self.generation || !playing {
            return false;
        }
        self.visible = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hides_after_inactivity_while_playing() {
        let mut timer = HideTimer::new(Duration::from_secs(2));
        let ticket = timer.activity(true).unwrap();
        assert_eq!(ticket.delay(), Duration::from_secs(2));

        assert!(timer.fire(ticket, true));
        assert!(!timer.is_visible());
    }

    #[test]
    fn test_stale_ticket_does_not_hide() {
        let mut timer = HideTimer::new(Duration::from_secs(2));
        let stale = timer.activity(true).unwrap();
        let fresh = timer.activity(true).unwrap();

        assert!(!timer.fire(stale, true));
        assert!(timer.is_visible());
        assert!(timer.fire(fresh, true));
    }

    #[test]
    fn test_no_ticket_while_paused() {
        let mut timer = HideTimer::new(Duration::from_secs(2));
        assert!(timer.activity(false).is_none());
        assert!(timer.is_visible());
    }

    #[test]
    fn test_force_visible_invalidates_ticket() {
        let mut timer = HideTimer::new(Duration::from_secs(2));
        let ticket = timer.activity(true).unwrap();
        timer.force_visible();

        assert!(!timer.fire(ticket, true));
        assert!(timer.is_visible());
    }

    #[tokio::test]
    async fn test_ticket_wait_returns_same_ticket() {
        let mut timer = HideTimer::new(Duration::from_millis(5));
        let ticket = timer.activity(true).unwrap();
        let fired = ticket.wait().await;
        assert!(timer.fire(fired, true));
    }
}
