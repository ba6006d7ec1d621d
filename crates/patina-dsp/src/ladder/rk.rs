//! Runge-Kutta ladder model.
//!
//! Imitates the resonant ladder by numerical integration of a differential
//! equation system approximating the circuit dynamics:
//!
//! ```text
//! y1' = k (S(x - r y4) - S(y1))
//! y2' = k (S(y1) - S(y2))
//! y3' = k (S(y2) - S(y3))
//! y4' = k (S(y3) - S(y4))
//! ```
//!
//! `k` tracks the cutoff, `r` the feedback amount, and `S` is the cubic
//! saturator from [`crate::saturator`]. One classical RK4 step per sample
//! with the sample period as the step size; stage state is integrated in
//! double precision.

use crate::ladder::{clamped_frequency, LadderCoefficients, ProcessRate};
use crate::quad::{QuadLadderState, LANES};
use crate::saturator::cubic_clip;
use crate::tuning::Tuning;

/// Coefficient slot: cutoff in angular frequency.
pub const C_CUTOFF: usize = 0;
/// Coefficient slot: feedback amount.
pub const C_RESO: usize = 1;
/// Coefficient slot: saturation rail.
pub const C_SAT: usize = 2;
/// Coefficient slot: reciprocal of the saturation rail.
pub const C_SAT_INV: usize = 3;

/// Registers used per lane: the four ladder stage outputs.
pub const N_REG: usize = 4;

pub fn coefficients(
    pitch: f32,
    resonance: f32,
    rate: ProcessRate,
    tuning: &dyn Tuning,
) -> LadderCoefficients {
    let freq = clamped_frequency(pitch, rate, tuning);
    let mut out = LadderCoefficients::default();
    out.c[C_CUTOFF] = freq * 2.0 * std::f32::consts::PI;
    // nominal range 0-10, but everything above ~6 is just self-oscillation
    out.c[C_RESO] = resonance * 6.0;
    out.c[C_SAT] = 3.0;
    out.c[C_SAT_INV] = 1.0 / 3.0;
    out
}

fn derivatives(
    input: f64,
    state: &[f64; N_REG],
    cutoff: f64,
    resonance: f64,
    sat: f64,
    sat_inv: f64,
) -> [f64; N_REG] {
    let sat0 = cubic_clip(state[0], sat, sat_inv);
    let sat1 = cubic_clip(state[1], sat, sat_inv);
    let sat2 = cubic_clip(state[2], sat, sat_inv);

    [
        cutoff * (cubic_clip(input - resonance * state[3], sat, sat_inv) - sat0),
        cutoff * (sat0 - sat1),
        cutoff * (sat1 - sat2),
        cutoff * (sat2 - cubic_clip(state[3], sat, sat_inv)),
    ]
}

fn runge_kutta_step(
    input: f64,
    state: &mut [f64; N_REG],
    cutoff: f64,
    resonance: f64,
    sat: f64,
    sat_inv: f64,
    step: f64,
) {
    let k1 = derivatives(input, state, cutoff, resonance, sat, sat_inv);

    let mut mid = [0.0; N_REG];
    for i in 0..N_REG {
        mid[i] = state[i] + 0.5 * step * k1[i];
    }
    let k2 = derivatives(input, &mid, cutoff, resonance, sat, sat_inv);

    for i in 0..N_REG {
        mid[i] = state[i] + 0.5 * step * k2[i];
    }
    let k3 = derivatives(input, &mid, cutoff, resonance, sat, sat_inv);

    for i in 0..N_REG {
        mid[i] = state[i] + step * k3[i];
    }
    let k4 = derivatives(input, &mid, cutoff, resonance, sat, sat_inv);

    for i in 0..N_REG {
        state[i] += (1.0 / 6.0) * step * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
}

pub fn process_quad(
    state: &mut QuadLadderState,
    input: [f32; LANES],
    rate: ProcessRate,
) -> [f32; LANES] {
    let mut out = [0.0f32; LANES];
    for lane in 0..LANES {
        if !state.active[lane] {
            continue;
        }

        let cutoff = f64::from(state.coeff[C_CUTOFF][lane]);
        let resonance = f64::from(state.coeff[C_RESO][lane]);
        let sat = f64::from(state.coeff[C_SAT][lane]);
        let sat_inv = f64::from(state.coeff[C_SAT_INV][lane]);

        let mut y = [0.0f64; N_REG];
        for i in 0..N_REG {
            y[i] = f64::from(state.reg[i][lane]);
        }

        runge_kutta_step(
            f64::from(input[lane]),
            &mut y,
            cutoff,
            resonance,
            sat,
            sat_inv,
            rate.inv,
        );
        out[lane] = y[N_REG - 1] as f32;

        for i in 0..N_REG {
            state.reg[i][lane] = y[i] as f32;
        }
    }
    out
}
