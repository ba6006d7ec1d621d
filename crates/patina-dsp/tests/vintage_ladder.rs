use patina_dsp::ladder::{huovilainen, improved, krajeski, rk};
use patina_dsp::{
    clamped_frequency, EqualTemperament, LadderCoefficients, LadderModel, ProcessRate,
    QuadLadderState, MAX_REG,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const RATE_HZ: f64 = 96_000.0;

fn rate() -> ProcessRate {
    ProcessRate::new(RATE_HZ)
}

fn mono_state(model: LadderModel, pitch: f32, resonance: f32) -> QuadLadderState {
    let coeffs = model.coefficients(pitch, resonance, rate(), &EqualTemperament);
    let mut state = QuadLadderState::new();
    state.active[0] = true;
    state.set_coefficients(0, &coeffs);
    state
}

fn step_mono(model: LadderModel, state: &mut QuadLadderState, x: f32) -> f32 {
    model.process_quad(state, [x, 0.0, 0.0, 0.0], rate())[0]
}

fn lane_bits(state: &QuadLadderState, lane: usize) -> [u32; MAX_REG] {
    let mut bits = [0u32; MAX_REG];
    for (slot, reg) in bits.iter_mut().zip(state.reg.iter()) {
        *slot = reg[lane].to_bits();
    }
    bits
}

#[test]
fn clamped_frequency_stays_in_safe_band() {
    let low = clamped_frequency(-300.0, rate(), &EqualTemperament);
    let high = clamped_frequency(300.0, rate(), &EqualTemperament);
    assert_eq!(low, 5.0);
    assert_eq!(high, (RATE_HZ * 0.3) as f32);

    // pitch 0 targets A440
    let a4 = clamped_frequency(0.0, rate(), &EqualTemperament);
    assert!((a4 - 440.0).abs() < 1.0, "A440 came out as {a4}");
}

#[test]
fn single_lane_step_is_deterministic() {
    for model in LadderModel::ALL {
        let mut state = mono_state(model, 12.0, 0.5);
        for n in 0..100 {
            step_mono(model, &mut state, ((n as f32) * 0.11).sin());
        }

        let mut a = state;
        let mut b = state;
        let out_a = step_mono(model, &mut a, 0.37);
        let out_b = step_mono(model, &mut b, 0.37);

        assert_eq!(out_a.to_bits(), out_b.to_bits(), "{model} output diverged");
        assert_eq!(lane_bits(&a, 0), lane_bits(&b, 0), "{model} state diverged");
    }
}

#[test]
fn inactive_lanes_are_left_untouched() {
    let mut rng = StdRng::seed_from_u64(0x1ADD_E12);
    for model in LadderModel::ALL {
        let mut state = mono_state(model, 0.0, 0.4);

        // park a retired voice's junk in lane 1
        let junk = model.coefficients(30.0, 0.8, rate(), &EqualTemperament);
        state.set_coefficients(1, &junk);
        for reg in &mut state.reg {
            reg[1] = rng.gen_range(-0.5f32..0.5);
        }
        let before = lane_bits(&state, 1);

        for _ in 0..256 {
            let x = rng.gen_range(-1.0f32..1.0);
            let out = model.process_quad(&mut state, [x, x, x, x], rate());
            assert_eq!(out[1], 0.0, "{model} wrote output for an inactive lane");
        }

        assert_eq!(before, lane_bits(&state, 1), "{model} touched lane 1 registers");
    }
}

#[test]
fn coefficient_derivation_is_pure() {
    for model in LadderModel::ALL {
        for (pitch, reso) in [(-24.0, 0.0), (0.0, 0.5), (60.0, 0.994), (90.0, 2.0)] {
            let a = model.coefficients(pitch, reso, rate(), &EqualTemperament);
            let b = model.coefficients(pitch, reso, rate(), &EqualTemperament);
            assert_eq!(a, b, "{model} coefficients not reproducible");
        }
    }
}

#[test]
fn dc_input_converges_at_low_cutoff() {
    let input = 0.1f32;
    for model in LadderModel::ALL {
        let mut state = mono_state(model, -24.0, 0.0);
        let mut y = 0.0;
        for _ in 0..20_000 {
            y = step_mono(model, &mut state, input);
        }
        // the circuit-derived model inverts; the other three pass DC upright
        let expected = match model {
            LadderModel::Improved => -input,
            _ => input,
        };
        assert!(
            (y - expected).abs() < 5e-3,
            "{model} settled at {y}, expected {expected}"
        );
    }
}

fn rms_at_cutoff(model: LadderModel, resonance: f32) -> f32 {
    let freq = 440.0f64;
    let mut state = mono_state(model, 0.0, resonance);
    let mut phase = 0.0f64;
    let dphase = 2.0 * std::f64::consts::PI * freq / RATE_HZ;

    let mut sum = 0.0f64;
    let mut count = 0u32;
    for n in 0..14_400 {
        let x = (phase.sin() * 0.1) as f32;
        phase += dphase;
        let y = step_mono(model, &mut state, x);
        if n >= 4_800 {
            sum += f64::from(y) * f64::from(y);
            count += 1;
        }
    }
    (sum / f64::from(count)).sqrt() as f32
}

#[test]
fn resonance_raises_gain_at_cutoff() {
    for model in [
        LadderModel::RungeKutta,
        LadderModel::Krajeski,
        LadderModel::Improved,
    ] {
        let low = rms_at_cutoff(model, 0.0);
        let mid = rms_at_cutoff(model, 0.15);
        let high = rms_at_cutoff(model, 0.3);
        assert!(
            mid > low * 1.01 && high > mid * 1.01,
            "{model} gain not monotonic in resonance: {low} {mid} {high}"
        );
    }
}

#[test]
fn huovilainen_resonance_never_exceeds_ceiling() {
    for reso in [0.0, 0.5, 0.994, 1.2, 10.0] {
        let coeffs =
            LadderModel::Huovilainen.coefficients(0.0, reso, rate(), &EqualTemperament);
        let derived = coeffs.c[huovilainen::C_RESO];
        assert!(derived <= 0.994, "resonance {reso} derived as {derived}");
        assert_eq!(derived, reso.clamp(0.0, 0.994));
    }
}

// Scalar replicas of the documented per-sample formulas, used to pin the
// batch path's first impulse response sample.

fn rk_first_sample(c: &LadderCoefficients, input: f64, h: f64) -> f64 {
    let cutoff = f64::from(c.c[rk::C_CUTOFF]);
    let sat = f64::from(c.c[rk::C_SAT]);
    let sat_inv = f64::from(c.c[rk::C_SAT_INV]);
    let reso = f64::from(c.c[rk::C_RESO]);

    let clip = |x: f64| {
        let v = (x * sat_inv).clamp(-1.0, 1.0);
        sat * (v - v * v * v * (1.0 / 3.0))
    };
    let deriv = |s: &[f64; 4]| {
        let (c0, c1, c2) = (clip(s[0]), clip(s[1]), clip(s[2]));
        [
            cutoff * (clip(input - reso * s[3]) - c0),
            cutoff * (c0 - c1),
            cutoff * (c1 - c2),
            cutoff * (c2 - clip(s[3])),
        ]
    };

    let mut s = [0.0f64; 4];
    let k1 = deriv(&s);
    let mut t = [0.0f64; 4];
    for i in 0..4 {
        t[i] = s[i] + 0.5 * h * k1[i];
    }
    let k2 = deriv(&t);
    for i in 0..4 {
        t[i] = s[i] + 0.5 * h * k2[i];
    }
    let k3 = deriv(&t);
    for i in 0..4 {
        t[i] = s[i] + h * k3[i];
    }
    let k4 = deriv(&t);
    for i in 0..4 {
        s[i] += (1.0 / 6.0) * h * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
    s[3]
}

fn huovilainen_first_sample(c: &LadderCoefficients, input: f64) -> f64 {
    let res_quad = f64::from(c.c[huovilainen::C_RES_QUAD]);
    let thermal = f64::from(c.c[huovilainen::C_THERMAL]);
    let tune = f64::from(c.c[huovilainen::C_TUNE]);

    let mut stage = [0.0f64; 4];
    let mut stage_tanh = [0.0f64; 3];
    let mut delay = [0.0f64; 6];
    for _ in 0..2 {
        let x = input - res_quad * delay[5];
        stage[0] = delay[0] + tune * ((x * thermal).tanh() - stage_tanh[0]);
        delay[0] = stage[0];
        for k in 1..4 {
            stage_tanh[k - 1] = (stage[k - 1] * thermal).tanh();
            let upper = if k != 3 {
                stage_tanh[k]
            } else {
                (delay[k] * thermal).tanh()
            };
            stage[k] = delay[k] + tune * (stage_tanh[k - 1] - upper);
            delay[k] = stage[k];
        }
        delay[5] = (stage[3] + delay[4]) * 0.5;
        delay[4] = stage[3];
    }
    delay[5]
}

fn krajeski_first_sample(c: &LadderCoefficients, input: f64) -> f64 {
    // from zero state the ladder reduces to tanh(in) * (0.3 g / 1.3)^4
    let g = f64::from(c.c[krajeski::C_G]);
    input.tanh() * (0.3 * g / 1.3).powi(4)
}

fn improved_first_sample(c: &LadderCoefficients, input: f64, h: f64) -> f64 {
    let g = f64::from(c.c[improved::C_G]);
    let vt2 = 2.0 * 0.312;
    let dv0 = -g * (input / vt2).tanh();
    let tv0 = ((dv0 * 0.5 * h) / vt2).tanh();
    let tv1 = ((g * tv0 * 0.5 * h) / vt2).tanh();
    let tv2 = ((g * tv1 * 0.5 * h) / vt2).tanh();
    g * tv2 * 0.5 * h
}

#[test]
fn impulse_response_matches_documented_formulas_and_decays() {
    let pitch = 60.0;
    let h = rate().inv;

    for model in LadderModel::ALL {
        let coeffs = model.coefficients(pitch, 0.0, rate(), &EqualTemperament);
        let expected = match model {
            LadderModel::RungeKutta => rk_first_sample(&coeffs, 1.0, h),
            LadderModel::Huovilainen => huovilainen_first_sample(&coeffs, 1.0),
            LadderModel::Krajeski => krajeski_first_sample(&coeffs, 1.0),
            LadderModel::Improved => improved_first_sample(&coeffs, 1.0, h),
        };

        let mut state = mono_state(model, pitch, 0.0);
        let first = step_mono(model, &mut state, 1.0);
        assert!(
            (f64::from(first) - expected).abs() < 1e-6,
            "{model} first sample {first}, expected {expected}"
        );
        assert!(expected.abs() > 1e-4, "{model} impulse produced silence");

        let mut early_peak = first.abs();
        let mut late_peak = 0.0f32;
        let mut last = first;
        for n in 0..2_400 {
            last = step_mono(model, &mut state, 0.0);
            if n < 300 {
                early_peak = early_peak.max(last.abs());
            } else if n >= 2_100 {
                late_peak = late_peak.max(last.abs());
            }
        }
        assert!(
            late_peak < early_peak * 1e-3,
            "{model} impulse tail not decaying: early {early_peak}, late {late_peak}"
        );
        assert!(last.abs() < 1e-6, "{model} left residue {last}");
    }
}

#[test]
fn model_selector_round_trips() {
    for model in LadderModel::ALL {
        let name = model.to_string();
        assert_eq!(name.parse::<LadderModel>().unwrap(), model);

        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, format!("\"{name}\""));
        assert_eq!(serde_json::from_str::<LadderModel>(&json).unwrap(), model);
    }

    let err = "moog".parse::<LadderModel>().unwrap_err();
    assert!(err.to_string().contains("moog"));
}

#[test]
fn reset_lane_clears_registers() {
    let model = LadderModel::Huovilainen;
    let mut state = mono_state(model, 0.0, 0.9);
    for _ in 0..64 {
        step_mono(model, &mut state, 0.7);
    }
    assert!(state.reg.iter().any(|reg| reg[0] != 0.0));

    state.reset_lane(0);
    assert!(state.reg.iter().all(|reg| reg[0] == 0.0));
}
