//! Huovilainen ladder model.
//!
//! Physically informed model that places a tanh nonlinearity inside each
//! of the four one-pole sections, after the smoothly saturating
//! base-emitter response of the ladder transistors. Resonances above 1
//! push the filter into self-oscillation. The update runs twice per
//! external sample (2x internal oversampling) and the output takes a
//! half-sample delay for phase compensation, so five tanh evaluations per
//! internal pass make this the most expensive of the four backends.

use crate::ladder::{clamped_frequency, LadderCoefficients, ProcessRate};
use crate::quad::{QuadLadderState, LANES};
use crate::tuning::Tuning;

/// Coefficient slot: cutoff in Hz.
pub const C_CUTOFF: usize = 0;
/// Coefficient slot: resonance, clamped to `[0, 0.994]`.
pub const C_RESO: usize = 1;
/// Coefficient slot: transistor thermal voltage scale.
pub const C_THERMAL: usize = 2;
/// Coefficient slot: frequency- and resonance-corrected tuning gain.
pub const C_TUNE: usize = 3;
/// Coefficient slot: empirical resonance correction.
pub const C_ACR: usize = 4;
/// Coefficient slot: feedback gain, `4 * reso * acr`.
pub const C_RES_QUAD: usize = 5;

/// Register offset of the four stage outputs.
pub const R_STAGE: usize = 0;
/// Register offset of the cached tanh values for stages 0-2.
pub const R_STAGE_TANH: usize = 4;
/// Register offset of the six delay taps.
pub const R_DELAY: usize = 7;
/// Registers used per lane.
pub const N_REG: usize = 13;

pub fn coefficients(
    pitch: f32,
    resonance: f32,
    rate: ProcessRate,
    tuning: &dyn Tuning,
) -> LadderCoefficients {
    let cutoff = clamped_frequency(pitch, rate, tuning);
    let resonance = resonance.clamp(0.0, 0.994);

    let fc = f64::from(cutoff) * rate.inv;
    // the inner loop runs at twice the external rate
    let f = fc * 0.5;
    let fc2 = fc * fc;
    let fc3 = fc2 * fc;

    let fcr = 1.8730 * fc3 + 0.4955 * fc2 - 0.6490 * fc + 0.9988;
    let acr = -3.9364 * fc2 + 1.8409 * fc + 0.9968;
    let thermal = 0.000025;
    let tune = (1.0 - (-(2.0 * std::f64::consts::PI) * f * fcr).exp()) / thermal;

    let mut out = LadderCoefficients::default();
    out.c[C_CUTOFF] = cutoff;
    out.c[C_RESO] = resonance;
    out.c[C_THERMAL] = thermal as f32;
    out.c[C_TUNE] = tune as f32;
    out.c[C_ACR] = acr as f32;
    out.c[C_RES_QUAD] = (4.0 * f64::from(resonance) * acr) as f32;
    out
}

fn step(
    input: f64,
    res_quad: f64,
    thermal: f64,
    tune: f64,
    stage: &mut [f64; 4],
    stage_tanh: &mut [f64; 3],
    delay: &mut [f64; 6],
) -> f64 {
    for _ in 0..2 {
        let mut x = input - res_quad * delay[5];
        stage[0] = delay[0] + tune * ((x * thermal).tanh() - stage_tanh[0]);
        delay[0] = stage[0];
        for k in 1..4 {
            x = stage[k - 1];
            stage_tanh[k - 1] = (x * thermal).tanh();
            // stage 3 carries no tanh cache; its upper term is always
            // recomputed from the delayed value
            let upper = if k != 3 {
                stage_tanh[k]
            } else {
                (delay[k] * thermal).tanh()
            };
            stage[k] = delay[k] + tune * (stage_tanh[k - 1] - upper);
            delay[k] = stage[k];
        }
        // 0.5 sample delay for phase compensation
        delay[5] = (stage[3] + delay[4]) * 0.5;
        delay[4] = stage[3];
    }
    delay[5]
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

        let res_quad = f64::from(state.coeff[C_RES_QUAD][lane]);
        let thermal = f64::from(state.coeff[C_THERMAL][lane]);
        let tune = f64::from(state.coeff[C_TUNE][lane]);

        let mut stage = [0.0f64; 4];
        let mut stage_tanh = [0.0f64; 3];
        let mut delay = [0.0f64; 6];
        for i in 0..4 {
            stage[i] = f64::from(state.reg[R_STAGE + i][lane]);
        }
        for i in 0..3 {
            stage_tanh[i] = f64::from(state.reg[R_STAGE_TANH + i][lane]);
        }
        for i in 0..6 {
            delay[i] = f64::from(state.reg[R_DELAY + i][lane]);
        }

        out[lane] = step(
            f64::from(input[lane]),
            res_quad,
            thermal,
            tune,
            &mut stage,
            &mut stage_tanh,
            &mut delay,
        ) as f32;

        for i in 0..4 {
            state.reg[R_STAGE + i][lane] = stage[i] as f32;
        }
        for i in 0..3 {
            state.reg[R_STAGE_TANH + i][lane] = stage_tanh[i] as f32;
        }
        for i in 0..6 {
            state.reg[R_DELAY + i][lane] = delay[i] as f32;
        }
    }
    out
}
