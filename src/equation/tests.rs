#[cfg(test)]
mod tests {
    use crate::equation::Equation;

    const TOL: f64 = 1e-9;

    #[test]
    fn linear_passes_through_both_points() {
        let cases = [
            (0.0, 0.0, 1.0, 1.0),
            (2.0, 5.0, -3.0, 0.5),
            (0.1, 1e-7, 0.9, 0.0133),
            (-10.0, 100.0, 10.0, -100.0),
        ];
        for (x1, y1, x2, y2) in cases {
            let eq = Equation::linear(x1, y1, x2, y2);
            assert!((eq.evaluate(x1) - y1).abs() < TOL, "failed at x1 for {:?}", (x1, y1, x2, y2));
            assert!((eq.evaluate(x2) - y2).abs() < TOL, "failed at x2 for {:?}", (x1, y1, x2, y2));
        }
    }

    #[test]
    fn linear_extrapolates_outside_the_points() {
        let eq = Equation::linear(0.0, 0.0, 1.0, 2.0);
        assert!((eq.evaluate(2.0) - 4.0).abs() < TOL);
        assert!((eq.evaluate(-1.0) + 2.0).abs() < TOL);
    }

    #[test]
    #[should_panic]
    fn linear_with_equal_x_values_panics() {
        let _ = Equation::linear(1.0, 0.0, 1.0, 5.0);
    }

    #[test]
    fn switching_uses_right_at_threshold() {
        let eq = Equation::switching(
            0.5,
            Equation::linear(0.0, 0.0, 0.5, 1.0),
            Equation::linear(0.5, 1.0, 1.0, 0.0),
        );
        assert!((eq.evaluate(0.25) - 0.5).abs() < TOL);
        assert!((eq.evaluate(0.5) - 1.0).abs() < TOL);
        assert!((eq.evaluate(0.75) - 0.5).abs() < TOL);

        let split = Equation::switching(1.0, Equation::constant(-1.0), Equation::constant(1.0));
        assert_eq!(split.evaluate(0.999), -1.0);
        assert_eq!(split.evaluate(1.0), 1.0);
    }

    #[test]
    fn quotient_with_zero_denominator_is_zero() {
        let substance = Equation::linear(0.0, 1.0, 1.0, 0.0);
        let secondary = Equation::linear(0.0, 0.0, 1.0, 0.0);
        let fraction = substance.clone() / (substance + secondary);
        assert!((fraction.evaluate(0.5) - 1.0).abs() < TOL);
        assert_eq!(fraction.evaluate(1.0), 0.0);
    }

    #[test]
    fn log10_and_pow10_are_inverse() {
        let h = Equation::constant(1e-4);
        let ph = -Equation::log10(h);
        assert!((ph.evaluate(0.0) - 4.0).abs() < TOL);
        let back = Equation::pow10(-ph);
        assert!((back.evaluate(0.0) - 1e-4).abs() < 1e-15);
    }

    #[test]
    fn log10_of_non_positive_is_zero() {
        assert_eq!(Equation::log10(Equation::constant(0.0)).evaluate(3.0), 0.0);
        assert_eq!(Equation::log10(Equation::constant(-2.0)).evaluate(3.0), 0.0);
    }

    #[test]
    fn arithmetic_composition() {
        let x = Equation::linear(0.0, 0.0, 1.0, 1.0);
        let eq = (x.clone() * 3.0 + 2.0) * x.clone() - 1.0;
        // (3x + 2) * x - 1 at x = 2 -> 15
        assert!((eq.evaluate(2.0) - 15.0).abs() < TOL);
        assert!(((-x).evaluate(4.0) + 4.0).abs() < TOL);
    }

    #[test]
    fn within_clamps_output() {
        let eq = Equation::linear(0.0, 0.0, 1.0, 10.0).within(2.0, 5.0);
        assert_eq!(eq.evaluate(0.0), 2.0);
        assert!((eq.evaluate(0.3) - 3.0).abs() < TOL);
        assert_eq!(eq.evaluate(1.0), 5.0);
    }

    #[test]
    fn evaluate_count_rounds_and_floors_at_zero() {
        assert_eq!(Equation::constant(2.5).evaluate_count(0.0), 3);
        assert_eq!(Equation::constant(2.49).evaluate_count(0.0), 2);
        assert_eq!(Equation::constant(-3.0).evaluate_count(0.0), 0);
        assert_eq!(Equation::constant(f64::NAN).evaluate_count(0.0), 0);
    }

    #[test]
    fn monotonic_check() {
        assert!(Equation::linear(0.0, 0.0, 1.0, 5.0).is_monotonic_on(0.0, 1.0, 11));
        assert!(!Equation::linear(0.0, 5.0, 1.0, 0.0).is_monotonic_on(0.0, 1.0, 11));
        assert!(Equation::constant(1.0).is_monotonic_on(0.0, 1.0, 11));
    }

    #[test]
    fn sample_covers_range_inclusive() {
        let series = Equation::linear(0.0, 0.0, 1.0, 10.0).sample(0.0, 1.0, 11);
        assert_eq!(series.len(), 11);
        assert_eq!(series.first().map(|p| p.x), Some(0.0));
        assert_eq!(series.last().map(|p| p.x), Some(1.0));
        let (lo, hi) = series.y_range().unwrap();
        assert!(lo.abs() < TOL && (hi - 10.0).abs() < TOL);
    }

    #[test]
    fn sample_with_too_few_points_returns_the_start() {
        let eq = Equation::linear(0.0, 3.0, 1.0, 5.0);
        for points in [0, 1] {
            let series = eq.sample(0.0, 1.0, points);
            assert_eq!(series.len(), 1);
            assert_eq!(series.first().map(|p| (p.x, p.y)), Some((0.0, 3.0)));
        }
    }

    #[test]
    fn equation_survives_toml_config() {
        let text = r#"
            type = "switching"
            threshold = 0.5
            left = { type = "constant", value = 1.0 }
            right = { type = "linear", x1 = 0.5, y1 = 1.0, x2 = 1.0, y2 = 3.0 }
        "#;
        let eq: Equation = toml::from_str(text).unwrap();
        assert_eq!(eq.evaluate(0.1), 1.0);
        assert!((eq.evaluate(1.0) - 3.0).abs() < TOL);
    }

    #[test]
    fn toml_equations_are_checked_like_constructors() {
        let inverted = r#"
            type = "within"
            min = 2.0
            max = 1.0
            of = { type = "constant", value = 1.5 }
        "#;
        assert!(toml::from_str::<Equation>(inverted).is_err());

        let nested = r#"
            type = "log10"
            of = { type = "linear", x1 = 1.0, y1 = 0.0, x2 = 1.0, y2 = 5.0 }
        "#;
        assert!(toml::from_str::<Equation>(nested).is_err());

        let valid = r#"
            type = "within"
            min = 0.0
            max = 1.0
            of = { type = "linear", x1 = 0.0, y1 = 0.0, x2 = 1.0, y2 = 2.0 }
        "#;
        let eq: Equation = toml::from_str(valid).unwrap();
        assert_eq!(eq.evaluate(0.9), 1.0);
    }
}
