//! Vintage transistor-ladder filter emulations.
//!
//! Four interchangeable models of the classic four-stage resonant ladder
//! low-pass, each with its own nonlinearity and integration scheme:
//!
//! * [`rk`]: saturating ladder integrated with classical Runge-Kutta 4.
//! * [`huovilainen`]: per-stage tanh ladder, 2x internal oversampling,
//!   half-sample phase compensation.
//! * [`krajeski`]: compromise-pole ladder with fitted frequency and
//!   resonance corrections.
//! * [`improved`]: circuit-derived trapezoidal ladder after D'Angelo and
//!   Valimaki.
//!
//! Every model exposes the same two operations: derive a per-voice
//! coefficient set at control rate, and advance a four-lane voice batch by
//! one sample at audio rate. The host picks a backend once per voice via
//! [`LadderModel`] and invokes it uniformly thereafter.

pub mod huovilainen;
pub mod improved;
pub mod krajeski;
pub mod rk;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quad::{QuadLadderState, LANES, MAX_COEFF};
use crate::tuning::{Tuning, MIDI_0_FREQ};

/// Internal (possibly oversampled) processing rate and its reciprocal,
/// handed down by the host engine instead of read from globals.
#[derive(Clone, Copy, Debug)]
pub struct ProcessRate {
    pub samplerate: f64,
    pub inv: f64,
}

impl ProcessRate {
    #[inline]
    pub fn new(samplerate: f64) -> Self {
        let samplerate = samplerate.max(1.0);
        Self {
            samplerate,
            inv: 1.0 / samplerate,
        }
    }
}

/// One voice's scalar coefficient set, produced at control rate and
/// broadcast into a batch lane by the host's smoothing logic.
///
/// Slot meanings are model-specific; each model module exports named slot
/// indices. Unused trailing slots stay zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LadderCoefficients {
    pub c: [f32; MAX_COEFF],
}

/// Converts a cutoff pitch into a frequency the integration step can take.
///
/// `pitch` is in semitones with 0 at A440 (the host's convention; the +69
/// offset re-anchors it to MIDI note numbers for the tuning conversion).
/// The result is clamped to `[5 Hz, 0.3 * samplerate]` so the models stay
/// stable at extreme parameter settings; out-of-range pitches are never
/// rejected, only clamped.
#[inline]
pub fn clamped_frequency(pitch: f32, rate: ProcessRate, tuning: &dyn Tuning) -> f32 {
    let freq = tuning.note_to_pitch(pitch + 69.0) * MIDI_0_FREQ;
    freq.max(5.0).min((rate.samplerate * 0.3) as f32)
}

/// Filter backend selector, chosen once per voice by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LadderModel {
    /// Runge-Kutta integration of the saturating ladder ODEs.
    RungeKutta,
    /// Huovilainen's physically informed tanh ladder.
    Huovilainen,
    /// Krajeski's compromise-pole ladder.
    Krajeski,
    /// D'Angelo and Valimaki's improved circuit model.
    Improved,
}

impl LadderModel {
    pub const ALL: [LadderModel; 4] = [
        LadderModel::RungeKutta,
        LadderModel::Huovilainen,
        LadderModel::Krajeski,
        LadderModel::Improved,
    ];

    /// Derives one voice's coefficient set from cutoff pitch and resonance.
    ///
    /// Pure: identical `(pitch, resonance)` under the same rate and tuning
    /// always yields an identical coefficient block.
    #[inline]
    pub fn coefficients(
        self,
        pitch: f32,
        resonance: f32,
        rate: ProcessRate,
        tuning: &dyn Tuning,
    ) -> LadderCoefficients {
        match self {
            LadderModel::RungeKutta => rk::coefficients(pitch, resonance, rate, tuning),
            LadderModel::Huovilainen => huovilainen::coefficients(pitch, resonance, rate, tuning),
            LadderModel::Krajeski => krajeski::coefficients(pitch, resonance, rate, tuning),
            LadderModel::Improved => improved::coefficients(pitch, resonance, rate, tuning),
        }
    }

    /// Advances every active lane of a voice batch by one sample.
    ///
    /// Inactive lanes are skipped: registers untouched, output slot 0.
    #[inline]
    pub fn process_quad(
        self,
        state: &mut QuadLadderState,
        input: [f32; LANES],
        rate: ProcessRate,
    ) -> [f32; LANES] {
        match self {
            LadderModel::RungeKutta => rk::process_quad(state, input, rate),
            LadderModel::Huovilainen => huovilainen::process_quad(state, input, rate),
            LadderModel::Krajeski => krajeski::process_quad(state, input, rate),
            LadderModel::Improved => improved::process_quad(state, input, rate),
        }
    }

    /// Stable name used for persistence and display.
    pub fn name(self) -> &'static str {
        match self {
            LadderModel::RungeKutta => "runge-kutta",
            LadderModel::Huovilainen => "huovilainen",
            LadderModel::Krajeski => "krajeski",
            LadderModel::Improved => "improved",
        }
    }
}

impl fmt::Display for LadderModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a persisted model name is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown ladder model `{0}`")]
pub struct ParseLadderModelError(String);

impl FromStr for LadderModel {
    type Err = ParseLadderModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LadderModel::ALL
            .into_iter()
            .find(|model| model.name() == s)
            .ok_or_else(|| ParseLadderModelError(s.to_string()))
    }
}
