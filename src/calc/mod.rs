//! Derived-metric evaluation.
//!
//! Users compose indicators by combining two or three existing metric series
//! with arithmetic operators, optionally normalizing the result. Everything
//! here is a pure transform over one series at a time; grouping per
//! entity × metric is the caller's responsibility and transforms must never
//! mix values across groups.
//!
//! Null handling is total: missing operands propagate, division by zero
//! yields null at that position (not an error, not infinity).

use crate::domain::{MetricOp, NormalizeMode};

/// Apply one binary operator element-wise over two aligned series.
pub fn apply_op(a: &[Option<f64>], op: MetricOp, b: &[Option<f64>]) -> Vec<Option<f64>> {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| combine(x, op, y))
        .collect()
}

fn combine(a: Option<f64>, op: MetricOp, b: Option<f64>) -> Option<f64> {
    let (a, b) = (a?, b?);
    let out = match op {
        MetricOp::Add => a + b,
        MetricOp::Sub => a - b,
        MetricOp::Mul => a * b,
        MetricOp::Div => {
            if b == 0.0 {
                return None;
            }
            a / b
        }
    };
    out.is_finite().then_some(out)
}

/// Normalize one series in place-order, per the chosen mode.
///
/// All modes preserve the series length; null positions stay null except in
/// the documented degenerate cases (which produce zeros, not nulls).
pub fn normalize_series(series: &[Option<f64>], mode: NormalizeMode) -> Vec<Option<f64>> {
    match mode {
        NormalizeMode::Raw => series.to_vec(),
        NormalizeMode::Base100 => base100(series),
        NormalizeMode::Minmax => minmax(series),
        NormalizeMode::Zscore => zscore(series),
    }
}

/// Divide by the first non-null value, times 100.
///
/// No usable base (none present, or the first one is zero) nulls the whole
/// series: there is nothing meaningful to index against.
fn base100(series: &[Option<f64>]) -> Vec<Option<f64>> {
    let base = series.iter().flatten().copied().next();
    match base {
        Some(base) if base != 0.0 => series
            .iter()
            .map(|v| v.map(|x| x / base * 100.0))
            .collect(),
        _ => vec![None; series.len()],
    }
}

/// `(x - min) / (max - min)`; a degenerate range maps every present value
/// to zero (a defined result, unlike the null-propagation cases).
fn minmax(series: &[Option<f64>]) -> Vec<Option<f64>> {
    let present: Vec<f64> = series.iter().flatten().copied().collect();
    let (min, max) = match (
        present.iter().copied().reduce(f64::min),
        present.iter().copied().reduce(f64::max),
    ) {
        (Some(min), Some(max)) => (min, max),
        _ => return series.to_vec(),
    };
    if min == max {
        return series.iter().map(|v| v.map(|_| 0.0)).collect();
    }
    series
        .iter()
        .map(|v| v.map(|x| (x - min) / (max - min)))
        .collect()
}

/// `(x - mean) / stddev` with the sample standard deviation; zero or
/// undefined stddev maps every present value to zero.
fn zscore(series: &[Option<f64>]) -> Vec<Option<f64>> {
    let present: Vec<f64> = series.iter().flatten().copied().collect();
    let n = present.len();
    if n == 0 {
        return series.to_vec();
    }
    let mean = present.iter().sum::<f64>() / n as f64;
    let stddev = if n < 2 {
        0.0
    } else {
        let var = present.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    };
    if stddev == 0.0 || !stddev.is_finite() {
        return series.iter().map(|v| v.map(|_| 0.0)).collect();
    }
    series
        .iter()
        .map(|v| v.map(|x| (x - mean) / stddev))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn operators_combine_elementwise() {
        let a = some(&[1.0, 2.0, 3.0]);
        let b = some(&[10.0, 20.0, 30.0]);
        assert_eq!(apply_op(&a, MetricOp::Add, &b), some(&[11.0, 22.0, 33.0]));
        assert_eq!(apply_op(&b, MetricOp::Sub, &a), some(&[9.0, 18.0, 27.0]));
        assert_eq!(apply_op(&a, MetricOp::Mul, &b), some(&[10.0, 40.0, 90.0]));
    }

    #[test]
    fn divide_by_zero_is_null() {
        let num = some(&[10.0, 10.0]);
        let den = vec![Some(2.0), Some(0.0)];
        assert_eq!(apply_op(&num, MetricOp::Div, &den), vec![Some(5.0), None]);
    }

    #[test]
    fn nulls_propagate_through_operators() {
        let a = vec![Some(1.0), None, Some(3.0)];
        let b = vec![Some(1.0), Some(2.0), None];
        assert_eq!(
            apply_op(&a, MetricOp::Add, &b),
            vec![Some(2.0), None, None]
        );
    }

    #[test]
    fn base100_indexes_to_the_first_value() {
        assert_eq!(
            normalize_series(&some(&[50.0, 100.0, 150.0]), NormalizeMode::Base100),
            some(&[100.0, 200.0, 300.0])
        );
        // Leading nulls: the first *present* value is the base.
        assert_eq!(
            normalize_series(&[None, Some(50.0), Some(75.0)], NormalizeMode::Base100),
            vec![None, Some(100.0), Some(150.0)]
        );
        // No usable base nulls the series.
        assert_eq!(
            normalize_series(&[None, None], NormalizeMode::Base100),
            vec![None, None]
        );
        assert_eq!(
            normalize_series(&some(&[0.0, 5.0]), NormalizeMode::Base100),
            vec![None, None]
        );
    }

    #[test]
    fn minmax_scales_to_unit_range() {
        assert_eq!(
            normalize_series(&some(&[0.0, 5.0, 10.0]), NormalizeMode::Minmax),
            some(&[0.0, 0.5, 1.0])
        );
        // Degenerate range: all zero, nulls preserved.
        assert_eq!(
            normalize_series(&[Some(3.0), None, Some(3.0)], NormalizeMode::Minmax),
            vec![Some(0.0), None, Some(0.0)]
        );
    }

    #[test]
    fn zscore_of_constant_series_is_zero() {
        assert_eq!(
            normalize_series(&some(&[7.0, 7.0, 7.0]), NormalizeMode::Zscore),
            some(&[0.0, 0.0, 0.0])
        );
    }

    #[test]
    fn zscore_centers_and_scales() {
        let out = normalize_series(&some(&[1.0, 2.0, 3.0]), NormalizeMode::Zscore);
        // mean 2, sample stddev 1.
        assert_eq!(out, some(&[-1.0, 0.0, 1.0]));
    }

    #[test]
    fn raw_is_identity() {
        let series = vec![Some(1.5), None, Some(-2.0)];
        assert_eq!(normalize_series(&series, NormalizeMode::Raw), series);
    }
}
