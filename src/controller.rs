//! Fixed-gain PID controller driven by a cross-track error.

use core::fmt;

use crate::twiddle::Param;

/// The three PID coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Gains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
}

impl Gains {
    /// Create a new set of gains.
    ///
    /// # Examples
    ///
    /// ```
    /// use twiddle_pid::{Gains, Param};
    ///
    /// let gains = Gains::new(0.2, 0.004, 3.0);
    /// assert_eq!(gains.get(Param::Kd), 3.0);
    /// ```
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    /// Read the gain selected by `param`.
    pub const fn get(&self, param: Param) -> f64 {
        match param {
            Param::Kp => self.kp,
            Param::Ki => self.ki,
            Param::Kd => self.kd,
        }
    }

    /// Overwrite the gain selected by `param`.
    pub fn set(&mut self, param: Param, value: f64) {
        match param {
            Param::Kp => self.kp = value,
            Param::Ki => self.ki = value,
            Param::Kd => self.kd = value,
        }
    }
}

impl fmt::Display for Gains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P: {}, I: {}, D: {}", self.kp, self.ki, self.kd)
    }
}

/// Proportional, integral and derivative error terms.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorTerms {
    /// Most recent cross-track error.
    pub p: f64,
    /// Sum of every cross-track error since the last `init`.
    pub i: f64,
    /// Difference between the two most recent cross-track errors.
    pub d: f64,
}

/// PID controller
///
/// Unlike a setpoint based controller, this one is fed the error directly
/// (usually a cross-track error) and produces a correction that opposes it.
///
/// # Examples
///
/// ```
/// use twiddle_pid::Controller;
///
/// let mut controller = Controller::new(0.5, 0.0, 0.0);
/// controller.update_error(2.0);
/// assert_eq!(controller.total_error(), -1.0);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Controller {
    gains: Gains,
    errors: ErrorTerms,
}

impl Controller {
    /// Create a new instance of `Controller` with zeroed error terms.
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            gains: Gains::new(kp, ki, kd),
            errors: ErrorTerms { p: 0.0, i: 0.0, d: 0.0 },
        }
    }

    /// Replace all three gains and reset the error terms.
    ///
    /// # Examples
    ///
    /// ```
    /// use twiddle_pid::{Controller, ErrorTerms};
    ///
    /// let mut controller = Controller::new(1.0, 1.0, 1.0);
    /// controller.update_error(3.0);
    /// controller.init(0.1, 0.01, 1.0);
    /// assert_eq!(controller.errors(), ErrorTerms::default());
    /// assert_eq!(controller.gains().kd, 1.0);
    /// ```
    pub fn init(&mut self, kp: f64, ki: f64, kd: f64) {
        self.gains = Gains::new(kp, ki, kd);
        self.errors = ErrorTerms::default();
        log::info!("PID controller with parameters: {}", self.gains);
    }

    /// Push the latest cross-track error into the controller.
    pub fn update_error(&mut self, cte: f64) {
        self.errors.d = cte - self.errors.p;
        self.errors.p = cte;
        self.errors.i += cte;
    }

    /// The corrective signal for the current error terms.
    ///
    /// Computed as `-Kp * p - Kd * d - Ki * i`.
    #[must_use = "A PID controller does nothing if the correction is not applied"]
    pub fn total_error(&self) -> f64 {
        let Gains { kp, ki, kd } = self.gains;
        -kp * self.errors.p - kd * self.errors.d - ki * self.errors.i
    }

    /// Current gains.
    pub const fn gains(&self) -> Gains {
        self.gains
    }

    /// Current error terms.
    pub const fn errors(&self) -> ErrorTerms {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_correction() {
        let mut controller = Controller::new(0.2, 0.004, 3.0);
        controller.update_error(1.0);
        controller.update_error(0.5);

        // p = 0.5, d = -0.5, i = 1.5
        let expected = -0.2 * 0.5 - 3.0 * -0.5 - 0.004 * 1.5;
        assert_eq!(controller.total_error(), expected);
    }

    #[test]
    fn no_correction() {
        let mut controller = Controller::new(0.0, 0.0, 0.0);
        controller.update_error(60.0);
        assert_eq!(controller.total_error(), 0.0);
    }

    #[test]
    fn closed_form_output() {
        let (kp, ki, kd) = (0.3, 0.01, 2.5);
        let mut controller = Controller::new(kp, ki, kd);
        let ctes = [0.4, -1.2, 2.0, 0.0, -0.7, 3.3];

        let mut previous = 0.0;
        let mut sum = 0.0;
        for &cte in ctes.iter() {
            controller.update_error(cte);
            sum += cte;
            let expected = -kp * cte - kd * (cte - previous) - ki * sum;
            assert!((controller.total_error() - expected).abs() < 1e-12);
            previous = cte;
        }
    }

    #[test]
    fn init_resets_error_terms() {
        let mut controller = Controller::new(1.0, 1.0, 1.0);
        for cte in [5.0, -3.0, 8.0] {
            controller.update_error(cte);
        }
        controller.init(1.0, 1.0, 1.0);
        assert_eq!(controller.errors(), ErrorTerms::default());
        assert_eq!(controller.total_error(), 0.0);

        controller.init(1.0, 1.0, 1.0);
        assert_eq!(controller.errors(), ErrorTerms::default());
    }

    #[test]
    fn derivative_starts_from_zero() {
        let mut controller = Controller::new(0.0, 0.0, 1.0);
        controller.update_error(2.0);
        assert_eq!(controller.errors().d, 2.0);
        assert_eq!(controller.total_error(), -2.0);
    }

    #[test]
    fn gains_by_param() {
        let mut gains = Gains::new(1.0, 2.0, 3.0);
        gains.set(Param::Ki, 0.5);
        assert_eq!(gains.get(Param::Kp), 1.0);
        assert_eq!(gains.get(Param::Ki), 0.5);
        assert_eq!(gains.get(Param::Kd), 3.0);
    }

    #[test]
    #[cfg(feature = "std")]
    fn display_status() {
        let gains = Gains::new(0.2, 0.004, 3.0);
        assert_eq!(gains.to_string(), "P: 0.2, I: 0.004, D: 3");
    }
}
