//! Quadrature rules for the one-dimensional domain `[-1, 1]`.

use crate::Rule;
use std::f64::consts::PI;

/// Newton iterations used to polish each Legendre root. Convergence is quadratic from the
/// initial guess below, so a handful of iterations is plenty for up to
/// [`MAX_GAUSS_POINTS`](crate::MAX_GAUSS_POINTS) points.
const MAX_ROOT_ITERATIONS: usize = 100;

/// Legendre polynomial `P_n(x)` together with `P_{n-1}(x)`, evaluated by the three-term
/// recurrence.
///
/// The derivative formula is singular at `|x| == 1`, so this is only meant for the open
/// interval `(-1, 1)`.
#[derive(Debug, Default)]
struct LegendreRecurrence {
    n: usize,
    x: f64,
    // p_n(x)
    p1: f64,
    // p_{n - 1}(x)
    p2: f64,
}

impl LegendreRecurrence {
    fn evaluate(n: usize, x: f64) -> Self {
        //  m P_m(x) = (2m - 1) x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)
        let mut p1 = 1.0;
        let mut p2 = 0.0;
        for m in 1..=n {
            let m = m as f64;
            let p3 = p2;
            p2 = p1;
            p1 = ((2.0 * m - 1.0) * x * p2 - (m - 1.0) * p3) / m;
        }

        Self { n, x, p1, p2 }
    }

    fn value(&self) -> f64 {
        self.p1
    }

    fn derivative(&self) -> f64 {
        let Self { n, x, p1, p2 } = &self;
        let n = *n as f64;
        // dp_n/dx (x) = n (x p_n(x) - p_{n - 1}(x)) / (x^2 - 1)
        n * (x * p1 - p2) / (x * x - 1.0)
    }
}

/// Gauss quadrature for the reference interval `[-1, 1]`.
///
/// Returns the [Gauss quadrature rule] with the given number of points. Given `n` points,
/// the rule integrates polynomials of degree up to `2n - 1` exactly. Points are sorted in
/// decreasing order.
///
/// # Panics
///
/// Panics if zero points are requested.
///
/// [Gauss quadrature rule]: https://en.wikipedia.org/wiki/Gaussian_quadrature
pub fn gauss(num_points: usize) -> Rule<1> {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    // The roots are symmetric about the origin, so only the first half is computed
    let m = (n + 1) / 2;

    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    for i in 0..m {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut recurrence = LegendreRecurrence::evaluate(n, x);

        for _ in 0..MAX_ROOT_ITERATIONS {
            let dx = -recurrence.value() / recurrence.derivative();
            x += dx;
            recurrence = LegendreRecurrence::evaluate(n, x);
            if dx.abs() <= 1e-15 {
                break;
            }
        }

        let dp = recurrence.derivative();
        points.push([x]);
        weights.push(2.0 / ((1.0 - x * x) * dp * dp));
    }

    for i in m..n {
        let mirror_idx = n - i - 1;
        points.push([-points[mirror_idx][0]]);
        weights.push(weights[mirror_idx]);
    }

    assert_eq!(points.len(), n, "Internal error: incorrect number of points produced");

    (weights, points)
}

/// Gauss quadrature for the interval `[a, b]`.
///
/// The rule is the affine image of [`gauss`], with weights scaled by `(b - a) / 2`.
pub fn gauss_interval(num_points: usize, a: f64, b: f64) -> Rule<1> {
    let (weights, points) = gauss(num_points);
    let half_length = 0.5 * (b - a);
    let midpoint = 0.5 * (a + b);
    let weights = weights.into_iter().map(|w| w * half_length).collect();
    let points = points
        .into_iter()
        .map(|[xi]| [midpoint + half_length * xi])
        .collect();
    (weights, points)
}
