//! Coordinate ascent ("twiddle") over the three PID gains.
//!
//! [`Twiddle`] is a small value type: every call to [`Twiddle::step`] takes
//! the current state, the current gains and the error accumulated over the
//! last batch, and returns the next state together with the gains to apply.
//! Exactly one gain changes per step.

use crate::controller::Gains;

/// Step sizes a fresh tuner starts from, indexed like [`Param`].
pub const INITIAL_STEP_SIZES: [f64; 3] = [0.01, 0.0001, 0.01];

/// Step size multiplier after an accepted perturbation.
pub const REWARD: f64 = 1.1;

/// Step size multiplier after both directions failed to improve.
pub const PENALTY: f64 = 0.9;

/// The sub-step within tuning one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stage {
    /// Nudge the selected gain up without comparing anything.
    Pre,
    /// The gain was raised; judge the batch against the best error.
    Increase,
    /// The gain was lowered; judge the batch against the best error.
    Decrease,
}

/// The gain currently being tuned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Param {
    /// Proportional gain.
    Kp,
    /// Integral gain.
    Ki,
    /// Derivative gain.
    Kd,
}

impl Param {
    /// Position of the parameter in `(Kp, Ki, Kd)`.
    pub const fn index(self) -> usize {
        match self {
            Param::Kp => 0,
            Param::Ki => 1,
            Param::Kd => 2,
        }
    }

    /// The parameter tuned after this one, wrapping from `Kd` to `Kp`.
    pub const fn next(self) -> Self {
        match self {
            Param::Kp => Param::Ki,
            Param::Ki => Param::Kd,
            Param::Kd => Param::Kp,
        }
    }
}

/// State of the coordinate ascent search.
///
/// # Examples
///
/// ```
/// use twiddle_pid::{Gains, Param, Stage, Twiddle};
///
/// let twiddle = Twiddle::new();
/// let (twiddle, gains) = twiddle.step(Gains::new(0.2, 0.004, 3.0), 4.0);
///
/// assert_eq!(twiddle.stage(), Stage::Increase);
/// assert_eq!(twiddle.param(), Param::Kp);
/// assert_eq!(twiddle.best_error(), Some(4.0));
/// assert_eq!(gains.kp, 0.2 + 0.01);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Twiddle {
    stage: Stage,
    param: Param,
    step_sizes: [f64; 3],
    // `None` until the first batch completes.
    best_error: Option<f64>,
}

impl Default for Twiddle {
    fn default() -> Self {
        Self::new()
    }
}

impl Twiddle {
    /// A search that has not seen any batch yet.
    pub const fn new() -> Self {
        Self {
            stage: Stage::Pre,
            param: Param::Kp,
            step_sizes: INITIAL_STEP_SIZES,
            best_error: None,
        }
    }

    /// Current stage.
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Parameter being tuned.
    pub const fn param(&self) -> Param {
        self.param
    }

    /// Step sizes for `(Kp, Ki, Kd)`.
    pub const fn step_sizes(&self) -> [f64; 3] {
        self.step_sizes
    }

    /// Lowest batch error seen so far.
    pub const fn best_error(&self) -> Option<f64> {
        self.best_error
    }

    /// Run one coordinate ascent step.
    ///
    /// The first batch ever seen becomes the reference error. Only the gain
    /// selected by [`Twiddle::param`] and its step size are modified.
    #[must_use]
    pub fn step(mut self, mut gains: Gains, batch_error: f64) -> (Self, Gains) {
        let best_error = *self.best_error.get_or_insert(batch_error);

        match self.stage {
            Stage::Pre => self.on_pre(&mut gains),
            Stage::Increase => self.on_increase(&mut gains, batch_error, best_error),
            Stage::Decrease => self.on_decrease(&mut gains, batch_error, best_error),
        }

        (self, gains)
    }

    fn on_pre(&mut self, gains: &mut Gains) {
        let step = self.step_size();
        gains.set(self.param, gains.get(self.param) + step);
        self.stage = Stage::Increase;

        log::debug!("twiddle: nudging {:?} up by {}", self.param, step);
    }

    fn on_increase(&mut self, gains: &mut Gains, batch_error: f64, best_error: f64) {
        if batch_error < best_error {
            self.accept(batch_error);
            return;
        }

        let step = self.step_size();
        gains.set(self.param, gains.get(self.param) - 2.0 * step);
        self.stage = Stage::Decrease;

        log::debug!(
            "twiddle: raising {:?} gave {} (best {}), trying the other direction",
            self.param,
            batch_error,
            best_error
        );
    }

    fn on_decrease(&mut self, gains: &mut Gains, batch_error: f64, best_error: f64) {
        if batch_error < best_error {
            self.accept(batch_error);
            return;
        }

        let step = self.step_size();
        gains.set(self.param, gains.get(self.param) + step);
        self.step_sizes[self.param.index()] = step * PENALTY;

        log::debug!(
            "twiddle: no improvement on {:?} (best {}), step shrunk to {}",
            self.param,
            best_error,
            step * PENALTY
        );
        self.advance();
    }

    fn accept(&mut self, batch_error: f64) {
        let step = self.step_size() * REWARD;
        self.best_error = Some(batch_error);
        self.step_sizes[self.param.index()] = step;

        log::debug!(
            "twiddle: kept {:?}, new best error {}, step grown to {}",
            self.param,
            batch_error,
            step
        );
        self.advance();
    }

    fn advance(&mut self) {
        self.param = self.param.next();
        self.stage = Stage::Pre;
    }

    fn step_size(&self) -> f64 {
        self.step_sizes[self.param.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    fn increased() -> (Twiddle, Gains) {
        Twiddle::new().step(Gains::new(0.2, 0.004, 3.0), 4.0)
    }

    #[test]
    fn first_batch_sets_reference() {
        let (twiddle, gains) = increased();
        assert_eq!(twiddle.best_error(), Some(4.0));
        assert_eq!(twiddle.stage(), Stage::Increase);
        assert_eq!(twiddle.param(), Param::Kp);
        assert_close(gains.kp, 0.21);
        assert_eq!(gains.ki, 0.004);
        assert_eq!(gains.kd, 3.0);
    }

    #[test]
    fn increase_accepted() {
        let (twiddle, gains) = increased();
        let (twiddle, gains) = twiddle.step(gains, 2.0);

        assert_eq!(twiddle.best_error(), Some(2.0));
        assert_eq!(twiddle.stage(), Stage::Pre);
        assert_eq!(twiddle.param(), Param::Ki);
        assert_close(twiddle.step_sizes()[0], 0.011);
        assert_close(gains.kp, 0.21);
    }

    #[test]
    fn increase_rejected_on_tie() {
        let (twiddle, gains) = increased();
        let (twiddle, gains) = twiddle.step(gains, 4.0);

        assert_eq!(twiddle.best_error(), Some(4.0));
        assert_eq!(twiddle.stage(), Stage::Decrease);
        assert_eq!(twiddle.param(), Param::Kp);
        assert_eq!(twiddle.step_sizes(), INITIAL_STEP_SIZES);
        assert_close(gains.kp, 0.19);
    }

    #[test]
    fn decrease_accepted() {
        let (twiddle, gains) = increased();
        let (twiddle, gains) = twiddle.step(gains, 5.0);
        let (twiddle, gains) = twiddle.step(gains, 3.0);

        assert_eq!(twiddle.best_error(), Some(3.0));
        assert_eq!(twiddle.stage(), Stage::Pre);
        assert_eq!(twiddle.param(), Param::Ki);
        assert_close(twiddle.step_sizes()[0], 0.011);
        assert_close(gains.kp, 0.19);
    }

    #[test]
    fn decrease_rejected_restores_gain() {
        let (twiddle, gains) = increased();
        let (twiddle, gains) = twiddle.step(gains, 5.0);
        let (twiddle, gains) = twiddle.step(gains, 6.0);

        assert_eq!(twiddle.best_error(), Some(4.0));
        assert_eq!(twiddle.stage(), Stage::Pre);
        assert_eq!(twiddle.param(), Param::Ki);
        assert_close(twiddle.step_sizes()[0], 0.009);
        assert_close(gains.kp, 0.2);
    }

    #[test]
    fn only_selected_gain_changes() {
        let mut twiddle = Twiddle::new();
        let mut gains = Gains::new(1.0, 1.0, 1.0);
        for _ in 0..3 {
            let (next, next_gains) = twiddle.step(gains, 1.0);
            assert_eq!(next_gains.ki, 1.0);
            assert_eq!(next_gains.kd, 1.0);
            twiddle = next;
            gains = next_gains;
        }
        // Kp went up, down, then back.
        assert_close(gains.kp, 1.0);

        let (twiddle, after) = twiddle.step(gains, 1.0);
        assert_eq!(twiddle.param(), Param::Ki);
        assert_eq!(after.kp, gains.kp);
        assert_eq!(after.kd, gains.kd);
        assert_close(after.ki, 1.0001);
    }

    #[test]
    fn param_cycles() {
        let mut param = Param::Kp;
        for _ in 0..3 {
            param = param.next();
        }
        assert_eq!(param, Param::Kp);
        assert_eq!(Param::Ki.index(), 1);
        assert_eq!(Param::Kd.next(), Param::Kp);
    }

    #[test]
    fn step_sizes_stay_positive() {
        let mut twiddle = Twiddle::new();
        let mut gains = Gains::new(0.2, 0.004, 3.0);
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..5_000 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let batch_error = (seed >> 11) as f64 / (1u64 << 53) as f64 * 100.0;
            let (next, next_gains) = twiddle.step(gains, batch_error);
            twiddle = next;
            gains = next_gains;
            assert!(twiddle.step_sizes().iter().all(|&step| step > 0.0));
        }
    }
}
