//! Sleep timer countdown state
//!
//! Pure state: the recurring one-second tick is driven from outside
//! (see the engine), which calls [`SleepTimer::tick`] with the generation
//! it was started for.

/// Outcome of one countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick belongs to a disarmed or replaced timer
    Ignored,

    /// Still counting down
    Running { remaining_seconds: u32 },

    /// Reached zero and disarmed itself
    Expired,
}

/// User-armed countdown that pauses playback on expiry
///
/// Invariant: `remaining_seconds()` is `None` whenever the timer is not
/// active.
#[derive(Debug, Clone, Default)]
pub struct SleepTimer {
    remaining_seconds: Option<u32>,

    /// Bumped on every arm, so ticks of an older countdown can be told apart
    generation: u64,
}

impl SleepTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer
    ///
    /// Returns the generation the countdown must tick with
    pub fn arm(&mut self, seconds: u32) -> u64 {
        self.generation += 1;
        self.remaining_seconds = Some(seconds);
        self.generation
    }

    /// Disarm the timer
    ///
    /// Returns `true` if it was active
    pub fn cancel(&mut self) -> bool {
        self.remaining_seconds.take().is_some()
    }

    /// Advance the countdown by one second
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        if generation != self.generation {
            return TickOutcome::Ignored;
        }

        match self.remaining_seconds {
            None => TickOutcome::Ignored,
            Some(remaining) if remaining <= 1 => {
                self.remaining_seconds = None;
                TickOutcome::Expired
            }
            Some(remaining) => {
                self.remaining_seconds = Some(remaining - 1);
                TickOutcome::Running {
                    remaining_seconds: remaining - 1,
                }
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.remaining_seconds.is_some()
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        self.remaining_seconds
    }

    /// Generation of the currently armed countdown, if any
    pub fn active_generation(&self) -> Option<u64> {
        self.remaining_seconds.map(|_| self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_by_default() {
        let timer = SleepTimer::new();
        assert!(!timer.is_active());
        assert_eq!(timer.remaining_seconds(), None);
        assert_eq!(timer.active_generation(), None);
    }

    #[test]
    fn counts_down_and_expires() {
        let mut timer = SleepTimer::new();
        let generation = timer.arm(3);

        assert_eq!(
            timer.tick(generation),
            TickOutcome::Running {
                remaining_seconds: 2
            }
        );
        assert_eq!(
            timer.tick(generation),
            TickOutcome::Running {
                remaining_seconds: 1
            }
        );
        assert_eq!(timer.tick(generation), TickOutcome::Expired);

        assert!(!timer.is_active());
        assert_eq!(timer.remaining_seconds(), None);
        assert_eq!(timer.tick(generation), TickOutcome::Ignored);
    }

    #[test]
    fn rearming_invalidates_old_ticks() {
        let mut timer = SleepTimer::new();
        let old = timer.arm(60);
        let new = timer.arm(120);

        assert_ne!(old, new);
        assert_eq!(timer.tick(old), TickOutcome::Ignored);
        assert_eq!(timer.remaining_seconds(), Some(120));
    }

    #[test]
    fn cancel_disarms() {
        let mut timer = SleepTimer::new();
        let generation = timer.arm(60);

        assert!(timer.cancel());
        assert!(!timer.cancel());
        assert_eq!(timer.remaining_seconds(), None);
        assert_eq!(timer.tick(generation), TickOutcome::Ignored);
    }
}
