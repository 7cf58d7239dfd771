//! Stepped gain fades
//!
//! A fade is a fixed number of evenly spaced steps from the gain a lane
//! held when the fade was scheduled toward a target. The transport's
//! scheduler fires the steps; this type only does the interpolation.
//! Scheduling a new fade on a lane cancels the previous ramp outright
//! (last-scheduled-wins), so a ramp never has to merge targets.

use crate::types::{Gain, MAX_GAIN};

/// An in-flight stepped transition toward a target gain
#[derive(Debug, Clone, PartialEq)]
pub struct FadeRamp {
    from: Gain,
    target: Gain,
    steps: u32,
    completed: u32,
}

impl FadeRamp {
    /// Start a ramp from the gain captured at schedule time
    ///
    /// `steps` below 1 is treated as a single step (an immediate jump to
    /// the target on the first fire).
    pub fn new(from: Gain, target: Gain, steps: u32) -> Self {
        Self {
            from,
            target,
            steps: steps.max(1),
            completed: 0,
        }
    }

    /// Gain of the next step, advancing the ramp
    ///
    /// Linearly interpolates from the captured start toward the target
    /// and clamps to the engine's gain range. The final step lands
    /// exactly on the target, never on an interpolated neighbor of it.
    pub fn advance(&mut self) -> Gain {
        if self.completed < self.steps {
            self.completed += 1;
        }
        if self.completed >= self.steps {
            return self.target.clamp(0.0, MAX_GAIN);
        }
        let t = self.completed as f32 / self.steps as f32;
        (self.from + (self.target - self.from) * t).clamp(0.0, MAX_GAIN)
    }

    /// Whether every step has fired
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.completed >= self.steps
    }

    /// The gain this ramp settles at
    #[inline]
    pub fn target(&self) -> Gain {
        self.target
    }

    /// Steps remaining to fire
    #[inline]
    pub fn remaining(&self) -> u32 {
        self.steps - self.completed
    }
}
