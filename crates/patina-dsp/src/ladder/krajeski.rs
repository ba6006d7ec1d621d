//! Krajeski ladder model.
//!
//! Stilson's ladder with 'compromise' poles at z = -0.3, plus fitted
//! polynomial corrections for the cutoff and resonance responses, a
//! smoothly saturating tanh on the input stage, and audio-rate friendly
//! coefficient updates. Cheaper than the physical models, with a sound of
//! its own.

use crate::ladder::{clamped_frequency, LadderCoefficients, ProcessRate};
use crate::quad::{QuadLadderState, LANES};
use crate::tuning::Tuning;

/// Coefficient slot: cutoff in Hz.
pub const C_CUTOFF: usize = 0;
/// Coefficient slot: resonance, pre-scaled by 1.3.
pub const C_RESO: usize = 1;
/// Coefficient slot: normalized angular cutoff.
pub const C_WC: usize = 2;
/// Coefficient slot: fitted frequency-response correction in `wc`.
pub const C_G: usize = 3;
/// Coefficient slot: fitted resonance-response correction in `wc`.
pub const C_G_RES: usize = 4;
/// Coefficient slot: feedback compensation of the dry input.
pub const C_G_COMP: usize = 5;
/// Coefficient slot: input drive.
pub const C_DRIVE: usize = 6;

/// Register offset of the five stage values (slot 0 is the saturated
/// input stage).
pub const R_STATE: usize = 0;
/// Register offset of the five one-sample delay taps. The fifth tap is
/// packed but never touched by the step, as in the reference model.
pub const R_DELAY: usize = 5;
/// Registers used per lane.
pub const N_REG: usize = 10;

pub fn coefficients(
    pitch: f32,
    resonance: f32,
    rate: ProcessRate,
    tuning: &dyn Tuning,
) -> LadderCoefficients {
    let cutoff = clamped_frequency(pitch, rate, tuning);
    let resonance = resonance * 1.3;
    let wc = 2.0 * std::f64::consts::PI * f64::from(cutoff) * rate.inv;

    let g = 0.9892 * wc - 0.4342 * wc.powi(2) + 0.1381 * wc.powi(3) - 0.0202 * wc.powi(4);
    let g_res =
        f64::from(resonance) * (1.0029 + 0.0526 * wc - 0.926 * wc.powi(2) + 0.0218 * wc.powi(3));

    let mut out = LadderCoefficients::default();
    out.c[C_CUTOFF] = cutoff;
    out.c[C_RESO] = resonance;
    out.c[C_WC] = wc as f32;
    out.c[C_G] = g as f32;
    out.c[C_G_RES] = g_res as f32;
    out.c[C_G_COMP] = 1.0;
    out.c[C_DRIVE] = 1.0;
    out
}

fn step(
    input: f64,
    g: f64,
    g_res: f64,
    g_comp: f64,
    drive: f64,
    state: &mut [f64; 5],
    delay: &mut [f64; 5],
) -> f64 {
    state[0] = (drive * (input - 4.0 * g_res * (state[4] - g_comp * input))).tanh();

    for i in 0..4 {
        state[i + 1] =
            g * (0.3 / 1.3 * state[i] + 1.0 / 1.3 * delay[i] - state[i + 1]) + state[i + 1];
        delay[i] = state[i];
    }

    state[4]
}

pub fn process_quad(
    state: &mut QuadLadderState,
    input: [f32; LANES],
    _rate: ProcessRate,
) -> [f32; LANES] {
    let mut out = [0.0f32; LANES];
    for lane in 0..LANES {
        if !state.active[lane] {
            continue;
        }

        let g = f64::from(state.coeff[C_G][lane]);
        let g_res = f64::from(state.coeff[C_G_RES][lane]);
        let g_comp = f64::from(state.coeff[C_G_COMP][lane]);
        let drive = f64::from(state.coeff[C_DRIVE][lane]);

        let mut stages = [0.0f64; 5];
        let mut delay = [0.0f64; 5];
        for i in 0..5 {
            stages[i] = f64::from(state.reg[R_STATE + i][lane]);
            delay[i] = f64::from(state.reg[R_DELAY + i][lane]);
        }

        out[lane] = step(
            f64::from(input[lane]),
            g,
            g_res,
            g_comp,
            drive,
            &mut stages,
            &mut delay,
        ) as f32;

        for i in 0..5 {
            state.reg[R_STATE + i][lane] = stages[i] as f32;
            state.reg[R_DELAY + i][lane] = delay[i] as f32;
        }
    }
    out
}
