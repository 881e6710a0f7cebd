//! Interpolation ramps.
//!
//! A ramp maps progress `x` in (0, 1] to a shape value that is usually in
//! [0, 1]. Positions are then `from + (to - from) * shape(x)`.

use core::f64::consts::PI;

use libm::cos;

/// Ramp shape used to reach a target.
#[derive(Debug, Clone, Default)]
pub enum Ramp {
    /// Constant speed.
    #[default]
    Linear,
    /// Eases in and out: `(1 - cos(pi x)) / 2`.
    Cosine,
    /// Accelerating fall: `x^2`.
    Parabolic,
    /// Decelerating launch: `1 - (x - 1)^2`.
    NegativeParabolic,
    /// User supplied shape.
    Custom(fn(f64) -> f64),
    /// Linear blend of two shapes. A factor of 0 is all `a`, 1 is all `b`.
    Blend(Box<Ramp>, Box<Ramp>, f64),
}

impl Ramp {
    /// Blend two ramps.
    pub fn blend(a: Ramp, b: Ramp, factor: f64) -> Self {
        Ramp::Blend(Box::new(a), Box::new(b), factor)
    }

    /// Evaluate the shape at progress `x`.
    pub fn shape(&self, x: f64) -> f64 {
        match self {
            Ramp::Linear => x,
            Ramp::Cosine => (1.0 - cos(PI * x)) / 2.0,
            Ramp::Parabolic => x * x,
            Ramp::NegativeParabolic => 1.0 - (x - 1.0) * (x - 1.0),
            Ramp::Custom(f) => f(x),
            Ramp::Blend(a, b, factor) => {
                let (a, b) = (a.shape(x), b.shape(x));
                a + (b - a) * factor
            }
        }
    }

    /// Position between `from` and `to` at progress `x`.
    #[inline]
    pub fn position(&self, from: f64, to: f64, x: f64) -> f64 {
        from + (to - from) * self.shape(x)
    }
}
