//! A PID controller that tunes its own gains while the loop runs.
//!
//! # Introduction
//!
//! The controller is fed a scalar tracking error (for a vehicle following a
//! path, the cross-track error or "cte") and returns a correction opposing
//! it: `-Kp * p - Kd * d - Ki * i`.
//!
//! # Loop Tuning
//!
//! Picking `Kp`, `Ki` and `Kd` by hand is tedious. A [`Tuner`] wraps a
//! [`Controller`] and runs "twiddle", a coordinate ascent search: it sums
//! `|cte|` over a batch of samples, then raises or lowers one gain at a time
//! and keeps the change only if the next batch was better. Step sizes grow by
//! 10% after a kept change and shrink by 10% when neither direction helped.
//!
//! [Read more on loop tuning](https://en.wikipedia.org/wiki/PID_controller#Loop_tuning).
//!
//! Every call is bounded, synchronous and allocation free, so a tuner can be
//! driven straight from a fixed period control loop. A tuner is not meant to
//! be shared between threads; one loop owns it.
//!
//! # No-std support
//!
//! `#[no_std]` support can be enabled by disabling the default crate-level
//! features. This removes the TOML [`TunerConfig`] loader; the controller and
//! the tuner are unaffected.
//!
//! # Examples
//!
//! ```no_run
//! use twiddle_pid::Tuner;
//!
//! let mut tuner = Tuner::new(true);
//! tuner.configure(0.2, 0.004, 3.0, 400);
//!
//! loop {
//!     let (cte, settled) = measure();
//!     if tuner.observe(cte, settled) {
//!         println!("{}", tuner.gains());
//!     }
//!     apply_correction(tuner.controller().total_error());
//! }
//! # fn measure() -> (f64, bool) { todo!() }
//! # fn apply_correction(_: f64) { todo!() }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, future_incompatible, unreachable_pub, rust_2018_idioms)]

mod controller;
mod tuner;
mod twiddle;

#[cfg(feature = "config")]
mod config;

pub use controller::{Controller, ErrorTerms, Gains};
pub use tuner::{Tuner, DEFAULT_BATCH_SIZE};
pub use twiddle::{Param, Stage, Twiddle, INITIAL_STEP_SIZES, PENALTY, REWARD};

#[cfg(feature = "config")]
pub use config::{ConfigError, TunerConfig};
