use weakforms_quadrature::univariate::{gauss, gauss_interval};
use weakforms_quadrature::{gauss_points_for_degree, integrate, Error, MAX_GAUSS_POINTS};

use matrixcompare::assert_scalar_eq;
use proptest::prelude::*;

fn monomial_integral(alpha: i32, a: f64, b: f64) -> f64 {
    (b.powi(alpha + 1) - a.powi(alpha + 1)) / (alpha as f64 + 1.0)
}

#[test]
fn gauss_rules_satisfy_expected_accuracy() {
    for n in 1..=MAX_GAUSS_POINTS {
        let expected_polynomial_degree = 2 * n - 1;
        let rule = gauss(n);

        assert!(rule.0.iter().all(|&w| w > 0.0));

        for alpha in 0..=expected_polynomial_degree as i32 {
            let estimated_integral = integrate(&rule, |x| x[0].powi(alpha));
            assert_scalar_eq!(
                estimated_integral,
                monomial_integral(alpha, -1.0, 1.0),
                comp = abs,
                tol = 1e-14
            );
        }
    }
}

#[test]
fn gauss_rules_are_symmetric() {
    for n in 1..=MAX_GAUSS_POINTS {
        let (weights, points) = gauss(n);
        for i in 0..n {
            let mirror = n - i - 1;
            assert_scalar_eq!(points[i][0], -points[mirror][0], comp = abs, tol = 1e-15);
            assert_scalar_eq!(weights[i], weights[mirror], comp = abs, tol = 1e-15);
        }
    }
}

#[test]
fn gauss_interval_integrates_monomials_on_shifted_interval() {
    let (a, b) = (0.5, 3.0);
    for n in 1..=8 {
        let rule = gauss_interval(n, a, b);
        assert!(rule.1.iter().all(|&[x]| a < x && x < b));
        for alpha in 0..=(2 * n - 1) as i32 {
            let estimated_integral = integrate(&rule, |x| x[0].powi(alpha));
            assert_scalar_eq!(
                estimated_integral,
                monomial_integral(alpha, a, b),
                comp = abs,
                tol = 1e-10 * monomial_integral(alpha, a, b).abs().max(1.0)
            );
        }
    }
}

#[test]
fn gauss_points_for_degree_gives_smallest_exact_rule() {
    assert_eq!(gauss_points_for_degree(0), Ok(1));
    assert_eq!(gauss_points_for_degree(1), Ok(1));
    assert_eq!(gauss_points_for_degree(2), Ok(2));
    assert_eq!(gauss_points_for_degree(3), Ok(2));
    assert_eq!(gauss_points_for_degree(12), Ok(7));
    assert_eq!(gauss_points_for_degree(2 * MAX_GAUSS_POINTS - 1), Ok(MAX_GAUSS_POINTS));
    assert_eq!(gauss_points_for_degree(2 * MAX_GAUSS_POINTS), Err(Error::NoRuleAvailable));
}

proptest! {
    #[test]
    fn selected_rule_is_exact_for_requested_degree(degree in 0 ..= 2 * MAX_GAUSS_POINTS - 1) {
        let n = gauss_points_for_degree(degree).unwrap();
        prop_assert!(2 * n - 1 >= degree);
        let rule = gauss(n);
        let estimated_integral = integrate(&rule, |x| x[0].powi(degree as i32));
        let exact = monomial_integral(degree as i32, -1.0, 1.0);
        prop_assert!((estimated_integral - exact).abs() <= 1e-14);
    }
}
