// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Reference-State Field: Lagrangian and Equation of Motion
//!
//! The field is described locally by an amplitude A ≥ 0 and a phase θ.
//! In units of the reference vacuum energy density ρ_v:
//!
//!   K = ½ T_c² (Ȧ² + A² θ̇²)             kinetic term
//!   U = 1 + ½ m² (A − 1)²                 potential term
//!   ρ = ρ_v (K + U),   p = ρ_v (K − U)
//!
//! so a static field (Ȧ = θ̇ = 0) has p = −ρ exactly.
//!
//! The equation of motion is a damped oscillator in A with a centrifugal
//! coupling to the phase drift, damped by Hubble friction γ:
//!
//!   Ä = A θ̇² − (m/T_c)² (A − 1) − γ Ȧ
//!   θ̈ = −γ θ̇ − 2 Ȧ θ̇ / A
//!
//! [`ReferenceStateField::evolve`] uses the static γ = 3 H0.
//! [`ReferenceStateField::evolve_expanding`] carries the scale factor along
//! (da/dt = a H(a)) and uses γ = 3 H(a), under which A² θ̇ a³ is conserved.
//!
//! E = K + U is a Lyapunov function of these dynamics when γ > 0.
//!
//! Integrators:
//! - Forward Euler (conditionally stable)
//! - Semi-implicit symplectic Euler with implicit damping
//! - Classical RK4 (default)

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{PhysicalConstants, STEPS_PER_PERIOD};
use crate::error::{CosmologyError, Result};
use crate::state::FieldState;

/// Below this amplitude the phase-drift coupling 2Ȧθ̇/A is dropped.
const AMPLITUDE_FLOOR: f64 = 1e-12;

/// Kinetic/potential split of the field energy, in units of ρ_v.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyTerms {
    pub kinetic: f64,
    pub potential: f64,
}

impl EnergyTerms {
    pub fn total(&self) -> f64 {
        self.kinetic + self.potential
    }
}

/// Amplitude potential U(A) = 1 + ½ m² (A − 1)².
#[inline]
pub fn amplitude_potential(amplitude: f64, stiffness: f64) -> f64 {
    let x = amplitude - 1.0;
    1.0 + 0.5 * stiffness * stiffness * x * x
}

/// dU/dA = m² (A − 1)
#[inline]
pub fn amplitude_potential_derivative(amplitude: f64, stiffness: f64) -> f64 {
    stiffness * stiffness * (amplitude - 1.0)
}

/// Kinetic and potential terms of a state.
pub fn energy_terms(state: &FieldState, constants: &PhysicalConstants) -> Result<EnergyTerms> {
    state.check()?;
    let tc = constants.coherence_time;
    let a = state.amplitude;
    let kinetic = 0.5
        * tc
        * tc
        * (state.amplitude_rate * state.amplitude_rate
            + a * a * state.phase_rate * state.phase_rate);
    Ok(EnergyTerms {
        kinetic,
        potential: amplitude_potential(a, constants.field_stiffness),
    })
}

/// Energy density ρ (J/m³) and pressure p (Pa) from one kinetic/potential
/// split: ρ = ρ_v (K + U), p = ρ_v (K − U).
pub fn density_and_pressure(state: &FieldState, constants: &PhysicalConstants) -> Result<(f64, f64)> {
    let terms = energy_terms(state, constants)?;
    let rho_v = constants.vacuum_energy_density;
    Ok((
        rho_v * (terms.kinetic + terms.potential),
        rho_v * (terms.kinetic - terms.potential),
    ))
}

/// Field energy density ρ (J/m³).
pub fn energy_density(state: &FieldState, constants: &PhysicalConstants) -> Result<f64> {
    Ok(density_and_pressure(state, constants)?.0)
}

/// Field pressure p (Pa).
pub fn pressure(state: &FieldState, constants: &PhysicalConstants) -> Result<f64> {
    Ok(density_and_pressure(state, constants)?.1)
}

/// Equation-of-state parameter w = p/ρ, or a marker when ρ vanishes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EquationOfState {
    Defined(f64),
    /// Density is exactly zero; the ratio has no value.
    Undefined,
}

impl EquationOfState {
    pub fn from_ratio(pressure: f64, density: f64) -> Self {
        if density == 0.0 {
            Self::Undefined
        } else {
            Self::Defined(pressure / density)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Defined(w) => Some(*w),
            Self::Undefined => None,
        }
    }
}

/// Integration method for the field equation of motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegratorMethod {
    /// Forward Euler. Conditionally stable, needs dt ≪ T_c / m.
    Euler,
    /// Symplectic Euler with the Hubble friction treated implicitly.
    ///
    /// Rates are updated first from the current amplitude, then the
    /// amplitude and phase advance with the new rates.
    SemiImplicit,
    /// Classical fourth-order Runge–Kutta.
    Rk4,
}

impl Default for IntegratorMethod {
    fn default() -> Self {
        Self::Rk4
    }
}

/// Time derivative of (A, θ, Ȧ, θ̇, a).
#[derive(Debug, Clone, Copy)]
struct Derivative {
    amplitude: f64,
    phase: f64,
    amplitude_rate: f64,
    phase_rate: f64,
    scale_factor: f64,
}

/// Field state plus the scale factor it is evolved alongside.
#[derive(Debug, Clone, Copy)]
struct Point {
    field: FieldState,
    scale_factor: f64,
}

/// Right-hand side of the equation of motion.
///
/// With `expanding` unset the friction is the static 3 H0 and the scale
/// factor is held fixed; otherwise γ = 3 H(a) and da/dt = a H(a).
#[derive(Debug, Clone, Copy)]
struct Dynamics<'a> {
    constants: &'a PhysicalConstants,
    stiffness: f64,
    inv_tc_sq: f64,
    expanding: bool,
}

impl<'a> Dynamics<'a> {
    fn new(constants: &'a PhysicalConstants, expanding: bool) -> Self {
        let tc = constants.coherence_time;
        Self {
            constants,
            stiffness: constants.field_stiffness,
            inv_tc_sq: 1.0 / (tc * tc),
            expanding,
        }
    }

    fn friction(&self, scale_factor: f64) -> f64 {
        if self.expanding {
            3.0 * self.constants.hubble_parameter(scale_factor)
        } else {
            self.constants.hubble_friction()
        }
    }

    fn expansion_rate(&self, scale_factor: f64) -> f64 {
        if self.expanding {
            scale_factor * self.constants.hubble_parameter(scale_factor)
        } else {
            0.0
        }
    }

    /// Ä without friction: centrifugal term minus dU/dA / T_c².
    fn amplitude_force(&self, a: f64, theta_dot: f64) -> f64 {
        a * theta_dot * theta_dot - self.inv_tc_sq * amplitude_potential_derivative(a, self.stiffness)
    }

    fn phase_drift(&self, a: f64, a_dot: f64, theta_dot: f64) -> f64 {
        if a > AMPLITUDE_FLOOR {
            2.0 * a_dot * theta_dot / a
        } else {
            0.0
        }
    }

    fn derivative(&self, p: &Point) -> Derivative {
        let s = &p.field;
        let gamma = self.friction(p.scale_factor);
        Derivative {
            amplitude: s.amplitude_rate,
            phase: s.phase_rate,
            amplitude_rate: self.amplitude_force(s.amplitude, s.phase_rate) - gamma * s.amplitude_rate,
            phase_rate: -gamma * s.phase_rate
                - self.phase_drift(s.amplitude, s.amplitude_rate, s.phase_rate),
            scale_factor: self.expansion_rate(p.scale_factor),
        }
    }
}

fn advance(p: &Point, d: &Derivative, h: f64) -> Point {
    let s = &p.field;
    Point {
        field: FieldState {
            amplitude: s.amplitude + h * d.amplitude,
            phase: s.phase + h * d.phase,
            amplitude_rate: s.amplitude_rate + h * d.amplitude_rate,
            phase_rate: s.phase_rate + h * d.phase_rate,
        },
        scale_factor: p.scale_factor + h * d.scale_factor,
    }
}

/// The reference-state field with a chosen integrator.
///
/// Holds no mutable state: [`ReferenceStateField::evolve`] is a pure
/// function of its arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceStateField {
    pub method: IntegratorMethod,
}

impl ReferenceStateField {
    pub fn new(method: IntegratorMethod) -> Self {
        Self { method }
    }

    pub fn energy_density(&self, state: &FieldState, constants: &PhysicalConstants) -> Result<f64> {
        energy_density(state, constants)
    }

    pub fn pressure(&self, state: &FieldState, constants: &PhysicalConstants) -> Result<f64> {
        pressure(state, constants)
    }

    pub fn equation_of_state(
        &self,
        state: &FieldState,
        constants: &PhysicalConstants,
    ) -> Result<EquationOfState> {
        let (rho, p) = density_and_pressure(state, constants)?;
        Ok(EquationOfState::from_ratio(p, rho))
    }

    /// Advance the state by `dt` seconds with the static friction 3 H0.
    ///
    /// Fails with a domain error if the input is invalid, `dt` is not a
    /// positive finite number, or the step would drive the amplitude negative.
    pub fn evolve(
        &self,
        state: &FieldState,
        dt: f64,
        constants: &PhysicalConstants,
    ) -> Result<FieldState> {
        let start = Point {
            field: *state,
            scale_factor: 1.0,
        };
        Ok(self.step(start, dt, Dynamics::new(constants, false))?.field)
    }

    /// Advance the state and the scale factor together by `dt` seconds,
    /// with friction 3 H(a) and da/dt = a H(a).
    ///
    /// Under this friction A² θ̇ a³ is conserved, so a field started on the
    /// [`crate::DarkEnergyModel`] mapping stays on it.
    pub fn evolve_expanding(
        &self,
        state: &FieldState,
        scale_factor: f64,
        dt: f64,
        constants: &PhysicalConstants,
    ) -> Result<(FieldState, f64)> {
        if !scale_factor.is_finite() || scale_factor <= 0.0 {
            return Err(CosmologyError::domain("scale_factor", scale_factor));
        }
        let start = Point {
            field: *state,
            scale_factor,
        };
        let next = self.step(start, dt, Dynamics::new(constants, true))?;
        if !next.scale_factor.is_finite() || next.scale_factor <= 0.0 {
            return Err(CosmologyError::domain("scale_factor", next.scale_factor));
        }
        Ok((next.field, next.scale_factor))
    }

    fn step(&self, start: Point, dt: f64, dynamics: Dynamics<'_>) -> Result<Point> {
        start.field.check()?;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(CosmologyError::domain("dt", dt));
        }
        let next = match self.method {
            IntegratorMethod::Euler => step_euler(&start, dt, &dynamics),
            IntegratorMethod::SemiImplicit => step_semi_implicit(&start, dt, &dynamics),
            IntegratorMethod::Rk4 => step_rk4(&start, dt, &dynamics),
        };
        next.field.check()?;
        Ok(next)
    }
}

fn step_euler(p: &Point, dt: f64, d: &Dynamics<'_>) -> Point {
    advance(p, &d.derivative(p), dt)
}

fn step_semi_implicit(p: &Point, dt: f64, d: &Dynamics<'_>) -> Point {
    let s = &p.field;
    let a = s.amplitude;
    let damp = 1.0 / (1.0 + d.friction(p.scale_factor) * dt);

    // Rates first, explicit forces, implicit friction
    let amplitude_rate = (s.amplitude_rate + dt * d.amplitude_force(a, s.phase_rate)) * damp;
    let phase_rate = (s.phase_rate - dt * d.phase_drift(a, amplitude_rate, s.phase_rate)) * damp;

    Point {
        field: FieldState {
            amplitude: a + dt * amplitude_rate,
            phase: s.phase + dt * phase_rate,
            amplitude_rate,
            phase_rate,
        },
        scale_factor: p.scale_factor + dt * d.expansion_rate(p.scale_factor),
    }
}

fn step_rk4(p: &Point, dt: f64, d: &Dynamics<'_>) -> Point {
    let k1 = d.derivative(p);
    let k2 = d.derivative(&advance(p, &k1, 0.5 * dt));
    let k3 = d.derivative(&advance(p, &k2, 0.5 * dt));
    let k4 = d.derivative(&advance(p, &k3, dt));
    let weighted = |f: fn(&Derivative) -> f64| f(&k1) + 2.0 * f(&k2) + 2.0 * f(&k3) + f(&k4);
    let sixth = dt / 6.0;
    let s = &p.field;
    Point {
        field: FieldState {
            amplitude: s.amplitude + sixth * weighted(|k| k.amplitude),
            phase: s.phase + sixth * weighted(|k| k.phase),
            amplitude_rate: s.amplitude_rate + sixth * weighted(|k| k.amplitude_rate),
            phase_rate: s.phase_rate + sixth * weighted(|k| k.phase_rate),
        },
        scale_factor: p.scale_factor + sixth * weighted(|k| k.scale_factor),
    }
}

/// Largest step that still resolves the characteristic oscillation
/// period with [`STEPS_PER_PERIOD`] samples.
pub fn recommended_step_size(constants: &PhysicalConstants) -> f64 {
    constants.characteristic_period() / STEPS_PER_PERIOD
}

/// Adaptive timestep controller driven by the field energy.
///
/// Shrinks dt when E = K + U increases (the exact dynamics never raise it),
/// grows dt after a run of stable steps. dt is always clamped to
/// `[dt_base / 16, dt_max]`.
#[derive(Debug, Clone)]
pub struct AdaptiveTimestep {
    dt_current: f64,
    dt_min: f64,
    dt_max: f64,
    dt_base: f64,
    shrink_factor: f64,
    grow_factor: f64,
    stable_steps: u32,
    grow_after: u32,
    prev_energy: Option<f64>,
}

impl AdaptiveTimestep {
    /// `dt_max` is normally [`recommended_step_size`].
    pub fn new(dt_base: f64, dt_max: f64) -> Self {
        let dt_max = dt_max.max(dt_base / 16.0);
        Self {
            dt_current: dt_base.min(dt_max),
            dt_min: dt_base / 16.0,
            dt_max,
            dt_base,
            shrink_factor: 0.5,
            grow_factor: 1.1,
            stable_steps: 0,
            grow_after: 10,
            prev_energy: None,
        }
    }

    /// Report the energy after a step and get the dt for the next one.
    pub fn adapt(&mut self, energy: f64) -> f64 {
        if let Some(prev) = self.prev_energy {
            if energy > prev * (1.0 + 1e-12) + 1e-15 {
                self.dt_current = (self.dt_current * self.shrink_factor).max(self.dt_min);
                self.stable_steps = 0;
                debug!(dt = self.dt_current, "Field energy grew; shrinking step");
            } else {
                self.stable_steps += 1;
                if self.stable_steps >= self.grow_after {
                    self.dt_current = (self.dt_current * self.grow_factor).min(self.dt_max);
                    self.stable_steps = 0;
                }
            }
        }
        self.prev_energy = Some(energy);
        self.dt_current
    }

    pub fn current_dt(&self) -> f64 {
        self.dt_current
    }

    pub fn dt_min(&self) -> f64 {
        self.dt_min
    }

    pub fn dt_max(&self) -> f64 {
        self.dt_max
    }

    pub fn reset(&mut self) {
        self.dt_current = self.dt_base.min(self.dt_max);
        self.stable_steps = 0;
        self.prev_energy = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn constants() -> PhysicalConstants {
        PhysicalConstants::fiducial()
    }

    fn excited() -> FieldState {
        let c = constants();
        FieldState::new(1.2, 0.3, 0.0, 0.05 / c.coherence_time).unwrap()
    }

    #[test]
    fn test_static_limit_pressure_equals_minus_density() {
        let c = constants();
        for a in [0.0, 0.5, 1.0, 1.7, 3.0] {
            let s = FieldState::new(a, 1.3, 0.0, 0.0).unwrap();
            let rho = energy_density(&s, &c).unwrap();
            let p = pressure(&s, &c).unwrap();
            assert_relative_eq!(p, -rho, max_relative = 1e-14);
        }
    }

    #[test]
    fn test_ground_state_is_vacuum_energy() {
        let c = constants();
        let rho = energy_density(&FieldState::ground(), &c).unwrap();
        assert_relative_eq!(rho, c.vacuum_energy_density, max_relative = 1e-14);
        let w = ReferenceStateField::default()
            .equation_of_state(&FieldState::ground(), &c)
            .unwrap();
        assert_eq!(w, EquationOfState::Defined(-1.0));
    }

    #[test]
    fn test_kinetic_term_raises_w() {
        let c = constants();
        let field = ReferenceStateField::default();
        let w = field.equation_of_state(&excited(), &c).unwrap().value().unwrap();
        assert!(w > -1.0 && w < 1.0, "w = {w}");
    }

    #[test]
    fn test_negative_amplitude_is_domain_error() {
        let c = constants();
        let bad = FieldState {
            amplitude: -0.5,
            ..FieldState::ground()
        };
        assert!(matches!(
            energy_density(&bad, &c),
            Err(CosmologyError::Domain { .. })
        ));
        assert!(matches!(pressure(&bad, &c), Err(CosmologyError::Domain { .. })));
    }

    #[test]
    fn test_zero_density_is_undefined() {
        assert_eq!(EquationOfState::from_ratio(1.0, 0.0), EquationOfState::Undefined);
        assert_eq!(EquationOfState::Undefined.value(), None);
    }

    #[test]
    fn test_potential_derivative_matches_finite_difference() {
        let h = 1e-6;
        for a in [0.2, 1.0, 2.5] {
            let fd = (amplitude_potential(a + h, 1.5) - amplitude_potential(a - h, 1.5)) / (2.0 * h);
            assert_relative_eq!(amplitude_potential_derivative(a, 1.5), fd, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_evolve_is_deterministic() {
        let c = constants();
        let dt = recommended_step_size(&c);
        for method in [
            IntegratorMethod::Euler,
            IntegratorMethod::SemiImplicit,
            IntegratorMethod::Rk4,
        ] {
            let field = ReferenceStateField::new(method);
            let a = field.evolve(&excited(), dt, &c).unwrap();
            let b = field.evolve(&excited(), dt, &c).unwrap();
            assert_eq!(a.amplitude.to_bits(), b.amplitude.to_bits());
            assert_eq!(a.phase.to_bits(), b.phase.to_bits());
            assert_eq!(a.amplitude_rate.to_bits(), b.amplitude_rate.to_bits());
            assert_eq!(a.phase_rate.to_bits(), b.phase_rate.to_bits());
        }
    }

    #[test]
    fn test_ground_state_is_stationary() {
        let c = constants();
        let field = ReferenceStateField::default();
        let next = field
            .evolve(&FieldState::ground(), recommended_step_size(&c), &c)
            .unwrap();
        assert_eq!(next, FieldState::ground());
    }

    #[test]
    fn test_expanding_friction_conserves_phase_charge() {
        let c = constants();
        let dt = recommended_step_size(&c);
        let field = ReferenceStateField::default();
        let charge = |s: &FieldState, a: f64| s.amplitude * s.amplitude * s.phase_rate * a.powi(3);
        let mut s = FieldState::new(1.0, 0.0, 0.0, 0.05 / c.coherence_time).unwrap();
        let mut a = 1.0;
        let q0 = charge(&s, a);
        for _ in 0..200 {
            (s, a) = field.evolve_expanding(&s, a, dt, &c).unwrap();
        }
        assert!(a > 1.3, "a = {a}");
        assert_relative_eq!(charge(&s, a), q0, max_relative = 1e-5);
    }

    #[test]
    fn test_expanding_scale_factor_matches_hubble_rate() {
        let c = constants();
        let dt = recommended_step_size(&c);
        let (_, a) = ReferenceStateField::default()
            .evolve_expanding(&FieldState::ground(), 1.0, dt, &c)
            .unwrap();
        assert_relative_eq!(a - 1.0, dt * c.hubble_parameter(1.0), max_relative = 1e-2);
    }

    #[test]
    fn test_expanding_rejects_bad_scale_factor() {
        let c = constants();
        let field = ReferenceStateField::default();
        for a in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                field.evolve_expanding(&FieldState::ground(), a, 1.0, &c),
                Err(CosmologyError::Domain { .. })
            ));
        }
    }

    #[test]
    fn test_energy_decreases_with_friction() {
        let c = constants();
        let dt = recommended_step_size(&c);
        for method in [IntegratorMethod::SemiImplicit, IntegratorMethod::Rk4] {
            let field = ReferenceStateField::new(method);
            let mut s = excited();
            let e0 = energy_terms(&s, &c).unwrap().total();
            for _ in 0..320 {
                s = field.evolve(&s, dt, &c).unwrap();
            }
            let e1 = energy_terms(&s, &c).unwrap().total();
            assert!(e1 <= e0 * (1.0 + 1e-3), "{method:?}: e0={e0}, e1={e1}");
        }
    }

    #[test]
    fn test_rk4_tracks_harmonic_oscillation() {
        // Small displacement, no phase drift: A − 1 ≈ δ cos(ωt) e^{−γt/2}
        let c = constants();
        let delta = 1e-3;
        let s0 = FieldState::new(1.0 + delta, 0.0, 0.0, 0.0).unwrap();
        let dt = recommended_step_size(&c);
        let field = ReferenceStateField::default();
        let mut s = s0;
        for _ in 0..(STEPS_PER_PERIOD as usize / 2) {
            s = field.evolve(&s, dt, &c).unwrap();
        }
        // Half a period later the displacement has flipped sign
        assert!(s.amplitude - 1.0 < -0.9 * delta, "A = {}", s.amplitude);
    }

    #[test]
    fn test_phase_advances_with_rate() {
        let c = constants();
        let s0 = FieldState::new(1.0, 0.0, 0.0, 1e-17).unwrap();
        let next = ReferenceStateField::default()
            .evolve(&s0, 1e15, &c)
            .unwrap();
        assert!(next.phase > 0.0);
    }

    #[test]
    fn test_collapse_through_zero_is_domain_error() {
        let c = constants();
        let s0 = FieldState::new(0.01, 0.0, -10.0 / c.coherence_time, 0.0).unwrap();
        let err = ReferenceStateField::new(IntegratorMethod::Euler)
            .evolve(&s0, c.coherence_time, &c)
            .unwrap_err();
        assert!(matches!(err, CosmologyError::Domain { ref quantity, .. } if quantity == "amplitude"));
    }

    #[test]
    fn test_invalid_dt_rejected() {
        let c = constants();
        let field = ReferenceStateField::default();
        assert!(field.evolve(&FieldState::ground(), 0.0, &c).is_err());
        assert!(field.evolve(&FieldState::ground(), f64::NAN, &c).is_err());
    }

    #[test]
    fn test_adaptive_shrinks_on_energy_increase() {
        let mut ctrl = AdaptiveTimestep::new(1.0, 2.0);
        ctrl.adapt(1.0);
        let dt = ctrl.adapt(2.0);
        assert_relative_eq!(dt, 0.5);
    }

    #[test]
    fn test_adaptive_grows_when_stable() {
        let mut ctrl = AdaptiveTimestep::new(1.0, 2.0);
        let mut dt = 0.0;
        for i in 0..=20 {
            dt = ctrl.adapt(1.0 - i as f64 * 0.01);
        }
        assert!(dt > 1.0);
        assert!(dt <= ctrl.dt_max());
    }

    #[test]
    fn test_adaptive_respects_floor() {
        let mut ctrl = AdaptiveTimestep::new(1.0, 1.0);
        let mut e = 1.0;
        for _ in 0..50 {
            e *= 2.0;
            ctrl.adapt(e);
        }
        assert_relative_eq!(ctrl.current_dt(), ctrl.dt_min());
        ctrl.reset();
        assert_relative_eq!(ctrl.current_dt(), 1.0);
    }
}
