//! Spring physics model
//!
//! A damped harmonic oscillator described by user-facing parameters
//! (response + damping ratio, stiffness + damping ratio, or duration + bounce),
//! plus the semi-implicit Euler step the animation driver runs every frame.
//!
//! ```text
//! stiffness          k = (2π / response)² · m
//! response             = 2π · √(m / k)
//! damping            c = 4π · ζ · m / response
//! damping ratio      ζ = c / (2 · √(k · m))
//! natural frequency ω₀ = √(k / m)
//! ```
//!
//! A response of `0` is the "instant" sentinel: stiffness becomes `+∞` and
//! drivers snap straight to their target instead of integrating.

use std::f64::consts::PI;
use std::fmt;

use recoil_core::{AnimatableVector, VectorQuantity};
use serde::Serialize;

use crate::error::{Result, SpringError};

/// Displacement threshold used for the settling estimate
pub const DEFAULT_SETTLING_EPSILON: f64 = 0.001;

/// Settling duration reported for instant springs, non-zero so drivers get one tick
const INSTANT_SETTLING_DURATION: f64 = 1.0;

/// Overdamped springs settle slower than the near-critical estimate suggests
const OVERDAMPED_SETTLING_FACTOR: f64 = 1.25;

/// Immutable spring parameters and the coefficients derived from them
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Spring {
    damping_ratio: f64,
    response: f64,
    mass: f64,
    #[serde(skip)]
    stiffness: f64,
    #[serde(skip)]
    damping: f64,
    #[serde(skip)]
    settling_duration: f64,
}

impl Spring {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Create a spring from a perceptual duration and bounce.
    ///
    /// `bounce` of `0` is critically damped, positive values overshoot and
    /// negative values are overdamped.
    ///
    /// # Panics
    ///
    /// Panics if `duration` is negative or `bounce` is greater than `1`.
    pub fn with_duration(duration: f64, bounce: f64) -> Self {
        Self::try_with_duration(duration, bounce).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Fallible form of [`Spring::with_duration`]
    pub fn try_with_duration(duration: f64, bounce: f64) -> Result<Self> {
        check_finite("bounce", bounce)?;
        Self::try_with_response(duration, 1.0 - bounce, 1.0)
    }

    /// Create a spring from stiffness, damping ratio and mass.
    ///
    /// # Panics
    ///
    /// Panics unless `stiffness`, `damping_ratio` and `mass` are all positive.
    pub fn with_stiffness(stiffness: f64, damping_ratio: f64, mass: f64) -> Self {
        Self::try_with_stiffness(stiffness, damping_ratio, mass)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Fallible form of [`Spring::with_stiffness`]
    pub fn try_with_stiffness(stiffness: f64, damping_ratio: f64, mass: f64) -> Result<Self> {
        check_finite("stiffness", stiffness)?;
        check_finite("damping_ratio", damping_ratio)?;
        check_finite("mass", mass)?;

        if stiffness <= 0.0 {
            return Err(SpringError::NonPositiveStiffness(stiffness));
        }
        if damping_ratio <= 0.0 {
            return Err(SpringError::NonPositiveDampingRatio(damping_ratio));
        }
        if mass <= 0.0 {
            return Err(SpringError::NonPositiveMass(mass));
        }

        let response = Self::response_for(stiffness, mass);
        let damping = Self::damping_for(damping_ratio, response, mass);
        Ok(Self::from_coefficients(
            damping_ratio,
            response,
            mass,
            stiffness,
            damping,
        ))
    }

    /// Create a spring from response, damping ratio and mass.
    ///
    /// A `response` of `0` yields an instant (non-animated) spring.
    ///
    /// # Panics
    ///
    /// Panics if `response` or `damping_ratio` is negative, or `mass` is not
    /// positive.
    pub fn with_response(response: f64, damping_ratio: f64, mass: f64) -> Self {
        Self::try_with_response(response, damping_ratio, mass)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Fallible form of [`Spring::with_response`]
    pub fn try_with_response(response: f64, damping_ratio: f64, mass: f64) -> Result<Self> {
        check_finite("response", response)?;
        check_finite("damping_ratio", damping_ratio)?;
        check_finite("mass", mass)?;

        if damping_ratio < 0.0 {
            return Err(SpringError::NegativeDampingRatio(damping_ratio));
        }
        if response < 0.0 {
            return Err(SpringError::NegativeResponse(response));
        }
        if mass <= 0.0 {
            return Err(SpringError::NonPositiveMass(mass));
        }

        let stiffness = Self::stiffness_for(response, mass);
        let damping = Self::damping_for(damping_ratio, response, mass);
        Ok(Self::from_coefficients(
            damping_ratio,
            response,
            mass,
            stiffness,
            damping,
        ))
    }

    fn from_coefficients(
        damping_ratio: f64,
        response: f64,
        mass: f64,
        stiffness: f64,
        damping: f64,
    ) -> Self {
        Self {
            damping_ratio,
            response,
            mass,
            stiffness,
            damping,
            settling_duration: Self::settling_time(
                damping_ratio,
                stiffness,
                mass,
                DEFAULT_SETTLING_EPSILON,
            ),
        }
    }

    // ========================================================================
    // Presets
    // ========================================================================

    /// Quick, lightly bouncy spring for tracking direct manipulation
    pub fn interactive() -> Self {
        Self::with_response(0.28, 0.86, 1.0)
    }

    /// Noticeable overshoot; `extra_bounce` adds to it
    pub fn bouncy(duration: f64, extra_bounce: f64) -> Self {
        Self::with_response(duration, 0.7 - extra_bounce, 1.0)
    }

    /// Critically damped, no overshoot unless `extra_bounce` is positive
    pub fn smooth(duration: f64, extra_bounce: f64) -> Self {
        Self::with_response(duration, 1.0 - extra_bounce, 1.0)
    }

    /// Small overshoot, settles fast
    pub fn snappy(duration: f64, extra_bounce: f64) -> Self {
        Self::with_response(duration, 0.85 - extra_bounce, 1.0)
    }

    /// Snaps straight to the target on the first tick
    pub fn non_animated() -> Self {
        Self::with_response(0.0, 1.0, 1.0)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn damping_ratio(&self) -> f64 {
        self.damping_ratio
    }

    pub fn response(&self) -> f64 {
        self.response
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Estimated time until the motion is indistinguishable from rest
    pub fn settling_duration(&self) -> f64 {
        self.settling_duration
    }

    /// Perceptual bounce, `1 - damping_ratio`
    pub fn bounce(&self) -> f64 {
        1.0 - self.damping_ratio
    }

    /// False for the instant sentinel (`response == 0`), and for responses so
    /// small that stiffness overflows to `+∞`
    pub fn is_animated(&self) -> bool {
        self.response > 0.0 && self.stiffness.is_finite()
    }

    pub fn undamped_natural_frequency(&self) -> f64 {
        Self::undamped_natural_frequency_for(self.stiffness, self.mass)
    }

    pub fn damped_natural_frequency(&self) -> f64 {
        Self::damped_natural_frequency_for(self.stiffness, self.mass, self.damping_ratio)
    }

    // ========================================================================
    // Coefficient formulas
    // ========================================================================

    pub fn stiffness_for(response: f64, mass: f64) -> f64 {
        (2.0 * PI / response).powi(2) * mass
    }

    pub fn response_for(stiffness: f64, mass: f64) -> f64 {
        2.0 * PI * (mass / stiffness).sqrt()
    }

    pub fn damping_for(damping_ratio: f64, response: f64, mass: f64) -> f64 {
        4.0 * PI * damping_ratio * mass / response
    }

    pub fn damping_ratio_for(damping: f64, stiffness: f64, mass: f64) -> f64 {
        damping / (2.0 * (stiffness * mass).sqrt())
    }

    pub fn undamped_natural_frequency_for(stiffness: f64, mass: f64) -> f64 {
        (stiffness / mass).sqrt()
    }

    pub fn damped_natural_frequency_for(stiffness: f64, mass: f64, damping_ratio: f64) -> f64 {
        Self::undamped_natural_frequency_for(stiffness, mass)
            * (1.0 - damping_ratio * damping_ratio).abs().sqrt()
    }

    /// Time for the oscillation envelope to decay below `epsilon`.
    ///
    /// Critically and overdamped springs use the estimate for a spring just
    /// under critical damping, scaled by 1.25. Undamped springs never settle
    /// and report `+∞`.
    pub fn settling_time(damping_ratio: f64, stiffness: f64, mass: f64, epsilon: f64) -> f64 {
        if stiffness == f64::INFINITY {
            return INSTANT_SETTLING_DURATION;
        }

        if damping_ratio >= 1.0 {
            let near_critical = 1.0 - f64::EPSILON;
            return Self::settling_time(near_critical, stiffness, mass, epsilon)
                * OVERDAMPED_SETTLING_FACTOR;
        }

        -epsilon.ln() / (damping_ratio * Self::undamped_natural_frequency_for(stiffness, mass))
    }

    // ========================================================================
    // Integration
    // ========================================================================

    /// Advance `value` and `velocity` towards `target` by `dt` seconds.
    ///
    /// Semi-implicit Euler: velocity is updated from the acceleration first,
    /// then position moves by the new velocity. Components are integrated
    /// independently.
    pub fn update_vector(
        &self,
        value: &mut AnimatableVector,
        velocity: &mut AnimatableVector,
        target: &AnimatableVector,
        dt: f64,
    ) {
        let inverse_mass = 1.0 / self.mass;
        let components = value
            .as_mut_slice()
            .iter_mut()
            .zip(velocity.as_mut_slice().iter_mut())
            .zip(target.as_slice());

        for ((x, v), target) in components {
            let displacement = *x - *target;
            let spring_force = displacement * -self.stiffness;
            let damping_force = *v * self.damping;
            let force = spring_force - damping_force;
            let acceleration = force * inverse_mass;

            *v += acceleration * dt;
            *x += *v * dt;
        }
    }

    /// [`Spring::update_vector`] for any [`VectorQuantity`]
    pub fn update<V: VectorQuantity>(&self, value: &mut V, velocity: &mut V, target: &V, dt: f64) {
        let mut value_vector = value.to_vector();
        let mut velocity_vector = velocity.to_vector();
        self.update_vector(&mut value_vector, &mut velocity_vector, &target.to_vector(), dt);
        *value = V::from_vector(&value_vector);
        *velocity = V::from_vector(&velocity_vector);
    }

    /// Value after a single `time`-sized step from `from`.
    ///
    /// This is one large step, not a sub-stepped integration; call
    /// [`Spring::update`] repeatedly with small steps for accuracy over long
    /// spans. Instant springs return `target`.
    pub fn value_at<V: VectorQuantity>(
        &self,
        from: &V,
        target: &V,
        initial_velocity: &V,
        time: f64,
    ) -> V {
        if !self.is_animated() {
            return target.clone();
        }
        let mut value = from.clone();
        let mut velocity = initial_velocity.clone();
        self.update(&mut value, &mut velocity, target, time);
        value
    }

    /// Velocity after a single `time`-sized step from `from`.
    ///
    /// See [`Spring::value_at`]. Instant springs return zero.
    pub fn velocity_at<V: VectorQuantity>(
        &self,
        from: &V,
        target: &V,
        initial_velocity: &V,
        time: f64,
    ) -> V {
        if !self.is_animated() {
            return V::zero();
        }
        let mut value = from.clone();
        let mut velocity = initial_velocity.clone();
        self.update(&mut value, &mut velocity, target, time);
        velocity
    }
}

impl Default for Spring {
    fn default() -> Self {
        Self::smooth(0.5, 0.0)
    }
}

impl fmt::Display for Spring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Spring(response: {}, damping_ratio: {}, mass: {})",
            self.response, self.damping_ratio, self.mass
        )
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SpringError::NonFinite { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recoil_core::Point;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance * expected.abs().max(1.0),
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_stiffness_response_round_trip() {
        for &(stiffness, damping_ratio, mass) in &[
            (100.0, 0.5, 1.0),
            (381.47, 0.86, 1.0),
            (42.0, 1.2, 2.5),
            (0.75, 0.1, 0.3),
        ] {
            let spring = Spring::with_stiffness(stiffness, damping_ratio, mass);
            let round_trip = Spring::stiffness_for(spring.response(), mass);
            assert_close(round_trip, stiffness, 1e-9);
        }
    }

    #[test]
    fn test_response_inverts_stiffness_for_any_mass() {
        // k = 200, m = 2: √(m / k) = 0.1
        let spring = Spring::with_stiffness(200.0, 0.5, 2.0);
        assert_close(spring.response(), 2.0 * PI * 0.1, 1e-12);
        assert_close(Spring::response_for(200.0, 2.0), 2.0 * PI * 0.1, 1e-12);
        // Not 2π / √(k · m), which only agrees when m = 1
        assert!((spring.response() - 2.0 * PI / 20.0).abs() > 0.1);
        assert_close(Spring::response_for(100.0, 1.0), 2.0 * PI / 10.0, 1e-12);
    }

    #[test]
    fn test_damping_ratio_round_trip() {
        let spring = Spring::with_response(0.4, 0.65, 2.0);
        let ratio = Spring::damping_ratio_for(spring.damping(), spring.stiffness(), spring.mass());
        assert_close(ratio, 0.65, 1e-9);
    }

    #[test]
    fn test_overdamped_settling_uses_exact_multiplier() {
        for &damping_ratio in &[1.0, 1.5, 3.0] {
            let spring = Spring::with_response(0.5, damping_ratio, 1.0);
            let near_critical = Spring::settling_time(
                1.0 - f64::EPSILON,
                spring.stiffness(),
                spring.mass(),
                DEFAULT_SETTLING_EPSILON,
            );
            assert_eq!(spring.settling_duration(), near_critical * 1.25);
        }
    }

    #[test]
    fn test_underdamped_settling_closed_form() {
        let spring = Spring::interactive();
        let omega = (spring.stiffness() / spring.mass()).sqrt();
        let expected = -DEFAULT_SETTLING_EPSILON.ln() / (0.86 * omega);
        assert_eq!(spring.settling_duration(), expected);
        assert!(spring.settling_duration() > 0.3 && spring.settling_duration() < 0.4);
    }

    #[test]
    fn test_instant_spring_settles_in_one_second() {
        for &damping_ratio in &[0.0, 0.5, 1.0, 2.0] {
            let spring = Spring::with_response(0.0, damping_ratio, 1.0);
            assert_eq!(spring.stiffness(), f64::INFINITY);
            assert_eq!(spring.settling_duration(), 1.0);
            assert!(!spring.is_animated());
        }
        assert_eq!(Spring::non_animated().settling_duration(), 1.0);
    }

    #[test]
    fn test_overflowing_stiffness_is_instant() {
        let spring = Spring::with_response(1e-160, 0.5, 1.0);
        assert_eq!(spring.stiffness(), f64::INFINITY);
        assert!(!spring.is_animated());
        assert_eq!(spring.settling_duration(), 1.0);
        assert_eq!(spring.value_at(&0.0f64, &4.0, &0.0, 1.0 / 60.0), 4.0);
        assert_eq!(spring.velocity_at(&0.0f64, &4.0, &0.0, 1.0 / 60.0), 0.0);
    }

    #[test]
    fn test_presets() {
        let interactive = Spring::interactive();
        assert_eq!(interactive.response(), 0.28);
        assert_eq!(interactive.damping_ratio(), 0.86);

        assert_eq!(Spring::bouncy(0.5, 0.0).damping_ratio(), 0.7);
        assert_eq!(Spring::smooth(0.5, 0.0).damping_ratio(), 1.0);
        assert_eq!(Spring::snappy(0.5, 0.0).damping_ratio(), 0.85);
        assert_eq!(Spring::bouncy(0.8, 0.2).response(), 0.8);
        assert_close(Spring::bouncy(0.8, 0.2).damping_ratio(), 0.5, 1e-12);
        assert_eq!(Spring::default(), Spring::smooth(0.5, 0.0));
    }

    #[test]
    fn test_duration_bounce_mapping() {
        let spring = Spring::with_duration(0.6, 0.3);
        assert_eq!(spring.response(), 0.6);
        assert_close(spring.damping_ratio(), 0.7, 1e-12);
        assert_close(spring.bounce(), 0.3, 1e-12);
        assert_eq!(spring.mass(), 1.0);
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        assert!(matches!(
            Spring::try_with_stiffness(0.0, 0.5, 1.0),
            Err(SpringError::NonPositiveStiffness(_))
        ));
        assert!(matches!(
            Spring::try_with_stiffness(100.0, 0.0, 1.0),
            Err(SpringError::NonPositiveDampingRatio(_))
        ));
        assert!(matches!(
            Spring::try_with_stiffness(100.0, 0.5, -1.0),
            Err(SpringError::NonPositiveMass(_))
        ));
        assert!(matches!(
            Spring::try_with_response(0.5, -0.1, 1.0),
            Err(SpringError::NegativeDampingRatio(_))
        ));
        assert!(matches!(
            Spring::try_with_response(-0.5, 0.5, 1.0),
            Err(SpringError::NegativeResponse(_))
        ));
        assert!(matches!(
            Spring::try_with_response(f64::NAN, 0.5, 1.0),
            Err(SpringError::NonFinite {
                name: "response",
                ..
            })
        ));
        assert!(matches!(
            Spring::try_with_duration(0.5, 1.5),
            Err(SpringError::NegativeDampingRatio(_))
        ));
    }

    #[test]
    #[should_panic(expected = "spring stiffness must be greater than 0")]
    fn test_panicking_constructor_reports_violation() {
        let _ = Spring::with_stiffness(-10.0, 0.5, 1.0);
    }

    #[test]
    fn test_semi_implicit_euler_reference_trajectory() {
        let spring = Spring::with_stiffness(100.0, 0.5, 1.0);
        assert_close(spring.damping(), 10.0, 1e-9);

        let mut value = 0.0f64;
        let mut velocity = 0.0f64;
        let dt = 0.05;

        // Hand-computed with k = 100, c = 10, m = 1, target = 1
        let expected = [(0.25, 5.0), (0.5625, 6.25), (0.828125, 5.3125)];
        for (expected_value, expected_velocity) in expected {
            spring.update(&mut value, &mut velocity, &1.0, dt);
            assert_close(velocity, expected_velocity, 1e-9);
            assert_close(value, expected_value, 1e-9);
        }
    }

    #[test]
    fn test_update_is_component_wise() {
        let spring = Spring::snappy(0.4, 0.0);
        let mut point = Point::new(0.0, 50.0);
        let mut velocity = Point::ZERO;
        spring.update(&mut point, &mut velocity, &Point::new(10.0, 50.0), 1.0 / 60.0);

        assert!(point.x > 0.0);
        assert_eq!(point.y, 50.0);
        assert_eq!(velocity.y, 0.0);
    }

    #[test]
    fn test_value_at_is_a_single_step() {
        let spring = Spring::with_stiffness(100.0, 0.5, 1.0);
        let value = spring.value_at(&0.0f64, &1.0, &0.0, 0.1);
        let velocity = spring.velocity_at(&0.0f64, &1.0, &0.0, 0.1);

        // v = k·t, x = v·t
        assert_close(velocity, 10.0, 1e-9);
        assert_close(value, 1.0, 1e-9);
    }

    #[test]
    fn test_instant_value_at_returns_target() {
        let spring = Spring::non_animated();
        assert_eq!(spring.value_at(&0.0f64, &7.0, &3.0, 0.5), 7.0);
        assert_eq!(spring.velocity_at(&0.0f64, &7.0, &3.0, 0.5), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Spring::with_response(0.5, 1.0, 1.0).to_string(),
            "Spring(response: 0.5, damping_ratio: 1, mass: 1)"
        );
    }
}
