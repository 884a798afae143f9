//! Online gain tuning wrapped around a [`Controller`].

use crate::controller::{Controller, Gains};
use crate::twiddle::{Param, Stage, Twiddle};

/// Number of valid samples per batch when none is configured.
pub const DEFAULT_BATCH_SIZE: usize = 400;

/// A PID controller that tunes its own gains while it runs.
///
/// Every valid sample adds `|cte|` to the current batch. Once the batch is
/// full the search takes one coordinate ascent step, re-initialises the
/// controller with the resulting gains and starts the next batch.
///
/// # Examples
///
/// ```
/// use twiddle_pid::Tuner;
///
/// let mut tuner = Tuner::new(true);
/// tuner.configure(0.2, 0.004, 3.0, 4);
///
/// for _ in 0..3 {
///     assert!(!tuner.observe(1.0, true));
/// }
/// assert!(tuner.observe(1.0, true));
/// assert_eq!(tuner.best_error(), Some(4.0));
///
/// let steer = tuner.controller().total_error();
/// # let _ = steer;
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tuner {
    controller: Controller,
    twiddle: Twiddle,
    enabled: bool,
    batch_size: usize,
    samples: usize,
    batch_error: f64,
}

impl Tuner {
    /// Create a tuner with zeroed gains.
    ///
    /// With `enabled` set to `false` the tuner never touches the gains and
    /// behaves like a plain fixed-gain controller.
    pub const fn new(enabled: bool) -> Self {
        Self {
            controller: Controller::new(0.0, 0.0, 0.0),
            twiddle: Twiddle::new(),
            enabled,
            batch_size: DEFAULT_BATCH_SIZE,
            samples: 0,
            batch_error: 0.0,
        }
    }

    /// Install the starting gains and the batch size, restarting the search.
    ///
    /// A `batch_size` of zero is treated as one.
    pub fn configure(&mut self, kp: f64, ki: f64, kd: f64, batch_size: usize) {
        self.twiddle = Twiddle::new();
        self.batch_size = batch_size.max(1);
        self.init(kp, ki, kd);
    }

    /// Replace the gains, reset the controller and start a new batch.
    pub fn init(&mut self, kp: f64, ki: f64, kd: f64) {
        self.controller.init(kp, ki, kd);
        self.samples = 0;
        self.batch_error = 0.0;
    }

    /// Feed one cross-track error sample.
    ///
    /// The controller always sees `cte`. Invalid samples and a disabled
    /// tuner stop there. Returns `true` when this sample completed a batch
    /// and the gains were changed.
    pub fn observe(&mut self, cte: f64, valid: bool) -> bool {
        self.controller.update_error(cte);

        if !self.enabled || !valid {
            return false;
        }

        self.samples += 1;
        self.batch_error += libm::fabs(cte);
        if self.samples < self.batch_size {
            return false;
        }

        log::trace!(
            "batch of {} samples complete, error {}",
            self.samples,
            self.batch_error
        );

        self.tune();
        // A step that moved on to the next gain also nudges it right away,
        // so the coming batch measures that nudge.
        if self.twiddle.stage() == Stage::Pre {
            self.tune();
        }
        true
    }

    fn tune(&mut self) {
        let (twiddle, gains) = self.twiddle.step(self.controller.gains(), self.batch_error);
        self.twiddle = twiddle;
        self.init(gains.kp, gains.ki, gains.kd);
    }

    /// The wrapped controller.
    pub const fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Snapshot of the current gains.
    pub const fn gains(&self) -> Gains {
        self.controller.gains()
    }

    /// Whether batches ever lead to tuning steps.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Valid samples needed to complete a batch.
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Valid samples collected in the current batch.
    pub const fn samples(&self) -> usize {
        self.samples
    }

    /// Sum of `|cte|` over the current batch.
    pub const fn batch_error(&self) -> f64 {
        self.batch_error
    }

    /// Current search stage.
    pub const fn stage(&self) -> Stage {
        self.twiddle.stage()
    }

    /// Gain being tuned.
    pub const fn param(&self) -> Param {
        self.twiddle.param()
    }

    /// Step sizes for `(Kp, Ki, Kd)`.
    pub const fn step_sizes(&self) -> [f64; 3] {
        self.twiddle.step_sizes()
    }

    /// Lowest batch error so far, `None` before the first batch completes.
    pub const fn best_error(&self) -> Option<f64> {
        self.twiddle.best_error()
    }
}

impl Default for Tuner {
    fn default() -> Self {
        Self::new(true)
    }
}
