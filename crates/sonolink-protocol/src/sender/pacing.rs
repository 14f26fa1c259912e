//! Adaptive send pacing and notification credits.
//!
//! [`PacingState`] holds the additive-increase/additive-decrease
//! inter-chunk delay and the in-flight credit counter. The send loop
//! sleeps `recommended_delay()` between chunks and between retries when
//! blocked; credits bound how many notifications sit in the link stack.

use super::constants::{
    BACKOFF_INCREMENT_MS, CONGESTION_THRESHOLD, INITIAL_DELAY_MS, MAX_DELAY_MS, MAX_IN_FLIGHT,
    MIN_DELAY_MS, SPEEDUP_DECREMENT_MS, SUCCESS_THRESHOLD,
};

#[derive(Debug, Clone)]
pub struct PacingState {
    delay_ms: u16,
    consecutive_failures: u16,
    consecutive_successes: u16,
    credits: u8,
}

impl PacingState {
    pub fn new() -> Self {
        Self {
            delay_ms: INITIAL_DELAY_MS,
            consecutive_failures: 0,
            consecutive_successes: 0,
            credits: MAX_IN_FLIGHT,
        }
    }

    /// Whether a notification slot is free in the link stack.
    pub fn has_credit(&self) -> bool {
        self.credits > 0
    }

    pub fn credits(&self) -> u8 {
        self.credits
    }

    /// Current recommended inter-chunk delay in milliseconds.
    pub fn recommended_delay(&self) -> u16 {
        self.delay_ms
    }

    /// Record a congested send. Returns `true` when the delay was backed
    /// off (congestion has persisted past the threshold).
    pub fn on_congested(&mut self) -> bool {
        self.consecutive_failures += 1;
        self.consecutive_successes = 0;
        if self.consecutive_failures >= CONGESTION_THRESHOLD {
            let from = self.delay_ms;
            self.delay_ms = (self.delay_ms + BACKOFF_INCREMENT_MS).min(MAX_DELAY_MS);
            tracing::debug!(
                from,
                to = self.delay_ms,
                failures = self.consecutive_failures,
                "pacing: backed off"
            );
            true
        } else {
            false
        }
    }

    /// Record a successful send: consumes a credit, may speed up.
    pub fn on_success(&mut self) {
        debug_assert!(self.credits > 0, "send succeeded without a credit");
        self.credits = self.credits.saturating_sub(1);
        self.consecutive_failures = 0;
        self.consecutive_successes += 1;
        if self.consecutive_successes >= SUCCESS_THRESHOLD && self.delay_ms > MIN_DELAY_MS {
            self.delay_ms = (self.delay_ms - SPEEDUP_DECREMENT_MS).max(MIN_DELAY_MS);
            self.consecutive_successes = 0;
            tracing::trace!(delay_ms = self.delay_ms, "pacing: sped up");
        }
    }

    /// Record a transmit-complete signal: a notification slot freed up.
    pub fn on_transmit_complete(&mut self) {
        if self.credits < MAX_IN_FLIGHT {
            self.credits += 1;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for PacingState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let pacing = PacingState::new();
        assert_eq!(pacing.recommended_delay(), INITIAL_DELAY_MS);
        assert_eq!(pacing.credits(), MAX_IN_FLIGHT);
        assert!(pacing.has_credit());
    }

    #[test]
    fn backoff_after_threshold_only() {
        let mut pacing = PacingState::new();
        assert!(!pacing.on_congested());
        assert!(!pacing.on_congested());
        assert_eq!(pacing.recommended_delay(), INITIAL_DELAY_MS);
        assert!(pacing.on_congested());
        assert_eq!(
            pacing.recommended_delay(),
            INITIAL_DELAY_MS + BACKOFF_INCREMENT_MS
        );
    }

    #[test]
    fn backoff_saturates_at_max() {
        let mut pacing = PacingState::new();
        for _ in 0..100 {
            pacing.on_congested();
        }
        assert_eq!(pacing.recommended_delay(), MAX_DELAY_MS);
    }

    #[test]
    fn success_resets_failure_streak() {
        let mut pacing = PacingState::new();
        pacing.on_congested();
        pacing.on_congested();
        pacing.on_success();
        // Streak restarted: two more congestions stay below the threshold.
        assert!(!pacing.on_congested());
        assert!(!pacing.on_congested());
        assert_eq!(pacing.recommended_delay(), INITIAL_DELAY_MS);
    }

    #[test]
    fn speedup_after_sustained_success() {
        let mut pacing = PacingState::new();
        for _ in 0..CONGESTION_THRESHOLD {
            pacing.on_congested();
        }
        let backed_off = pacing.recommended_delay();
        assert!(backed_off > MIN_DELAY_MS);

        for _ in 0..SUCCESS_THRESHOLD {
            pacing.on_transmit_complete();
            pacing.on_success();
        }
        assert_eq!(pacing.recommended_delay(), backed_off - SPEEDUP_DECREMENT_MS);
    }

    #[test]
    fn speedup_stops_at_min() {
        let mut pacing = PacingState::new();
        for _ in 0..(SUCCESS_THRESHOLD * 4) {
            pacing.on_transmit_complete();
            pacing.on_success();
        }
        assert_eq!(pacing.recommended_delay(), MIN_DELAY_MS);
    }

    #[test]
    fn credits_consumed_and_restored() {
        let mut pacing = PacingState::new();
        pacing.on_success();
        pacing.on_success();
        assert!(!pacing.has_credit());
        pacing.on_transmit_complete();
        assert_eq!(pacing.credits(), 1);
        // Extra completions never push credits past the cap.
        pacing.on_transmit_complete();
        pacing.on_transmit_complete();
        assert_eq!(pacing.credits(), MAX_IN_FLIGHT);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone, Copy)]
        enum Event {
            Congested,
            Success,
            TransmitComplete,
        }

        fn event_strategy() -> impl Strategy<Value = Event> {
            prop_oneof![
                Just(Event::Congested),
                Just(Event::Success),
                Just(Event::TransmitComplete),
            ]
        }

        proptest! {
            #[test]
            fn delay_stays_in_bounds(
                events in proptest::collection::vec(event_strategy(), 0..200),
            ) {
                let mut pacing = PacingState::new();
                for event in events {
                    match event {
                        Event::Congested => { pacing.on_congested(); }
                        Event::Success if pacing.has_credit() => pacing.on_success(),
                        Event::Success => {}
                        Event::TransmitComplete => pacing.on_transmit_complete(),
                    }
                    prop_assert!(pacing.recommended_delay() >= MIN_DELAY_MS);
                    prop_assert!(pacing.recommended_delay() <= MAX_DELAY_MS);
                }
            }

            #[test]
            fn credits_stay_in_bounds(
                events in proptest::collection::vec(event_strategy(), 0..200),
            ) {
                let mut pacing = PacingState::new();
                for event in events {
                    match event {
                        Event::Congested => { pacing.on_congested(); }
                        Event::Success if pacing.has_credit() => pacing.on_success(),
                        Event::Success => {}
                        Event::TransmitComplete => pacing.on_transmit_complete(),
                    }
                    prop_assert!(pacing.credits() <= MAX_IN_FLIGHT);
                }
            }
        }
    }
}
