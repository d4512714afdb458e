use std::collections::BTreeMap;

use crate::model::{Condition, TrendDirection, TrendResult};

use super::grouping::GroupEntry;

/// Slopes are compared against 1% of the series' mean magnitude so that
/// measurement noise does not flip the direction label.
const DIRECTION_EPSILON_FRACTION: f64 = 0.01;

const NEAR_ZERO: f64 = 1e-12;

/// Computes per-parameter trends for one qualifying lake group. The caller
/// guarantees >=3 distinct years; parameters observed in fewer than 2 of the
/// group's years are omitted entirely rather than padded with defaults.
pub fn analyze_group(lake_name: &str, entries: &[GroupEntry]) -> (Vec<TrendResult>, Vec<Condition>) {
    let mut series: BTreeMap<&str, BTreeMap<i32, (f64, usize)>> = BTreeMap::new();

    for entry in entries {
        let Some(year) = entry.year else {
            continue;
        };
        for (parameter, value) in &entry.parameters {
            let bucket = series
                .entry(parameter.as_str())
                .or_default()
                .entry(year)
                .or_insert((0.0, 0));
            bucket.0 += value;
            bucket.1 += 1;
        }
    }

    let mut results = Vec::new();
    let mut conditions = Vec::new();

    for (parameter, by_year) in series {
        if by_year.len() < 2 {
            continue;
        }

        // Multiple reports sharing a year are averaged, not discarded, so
        // the regression sees one observation per year.
        let points: Vec<(f64, f64)> = by_year
            .iter()
            .map(|(year, (total, count))| (f64::from(*year), total / *count as f64))
            .collect();

        let Some((slope, intercept)) = linear_fit(&points) else {
            continue;
        };

        let p_value = slope_p_value(&points, slope, intercept);
        if p_value.is_none() {
            conditions.push(Condition::UndefinedStatistic {
                lake_name: lake_name.to_string(),
                parameter: parameter.to_string(),
                statistic: "p_value".to_string(),
                reason: "fewer than 3 observed years".to_string(),
            });
        }

        let first_value = points[0].1;
        let last_value = points[points.len() - 1].1;
        let percent_change = if first_value == 0.0 {
            conditions.push(Condition::UndefinedStatistic {
                lake_name: lake_name.to_string(),
                parameter: parameter.to_string(),
                statistic: "percent_change".to_string(),
                reason: "first observed value is zero".to_string(),
            });
            None
        } else {
            Some((last_value - first_value) / first_value.abs() * 100.0)
        };

        results.push(TrendResult {
            parameter: parameter.to_string(),
            slope,
            intercept,
            p_value,
            percent_change,
            direction: direction_for(slope, &points),
            observations: points.len(),
            first_value,
            last_value,
        });
    }

    (results, conditions)
}

fn direction_for(slope: f64, points: &[(f64, f64)]) -> TrendDirection {
    let mean_magnitude =
        points.iter().map(|(_, value)| value.abs()).sum::<f64>() / points.len() as f64;
    let epsilon = (DIRECTION_EPSILON_FRACTION * mean_magnitude).max(NEAR_ZERO);

    if slope > epsilon {
        TrendDirection::Increasing
    } else if slope < -epsilon {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}

/// Ordinary least-squares fit. `None` when fewer than 2 points or all x
/// values coincide.
fn linear_fit(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let n = points.len() as f64;
    if points.len() < 2 {
        return None;
    }

    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let sxx = points
        .iter()
        .map(|(x, _)| (x - mean_x) * (x - mean_x))
        .sum::<f64>();
    if sxx <= NEAR_ZERO {
        return None;
    }

    let sxy = points
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum::<f64>();

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    Some((slope, intercept))
}

/// Two-sided t-test of the slope coefficient against zero, using residual
/// variance with n - 2 degrees of freedom. `None` below 3 points. A perfect
/// fit has no residual variance: p is 1 for a flat line and 0 otherwise.
fn slope_p_value(points: &[(f64, f64)], slope: f64, intercept: f64) -> Option<f64> {
    let n = points.len();
    if n < 3 {
        return None;
    }

    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n as f64;
    let sxx = points
        .iter()
        .map(|(x, _)| (x - mean_x) * (x - mean_x))
        .sum::<f64>();

    let sse = points
        .iter()
        .map(|(x, y)| {
            let residual = y - (slope * x + intercept);
            residual * residual
        })
        .sum::<f64>();

    if sse <= NEAR_ZERO {
        return Some(if slope.abs() <= NEAR_ZERO { 1.0 } else { 0.0 });
    }

    let degrees_of_freedom = (n - 2) as f64;
    let standard_error = (sse / degrees_of_freedom / sxx).sqrt();
    let t_statistic = slope / standard_error;

    Some(student_t_two_sided_p_value(
        t_statistic,
        degrees_of_freedom,
    ))
}

/// P(|T| >= |t|) for Student's t with `df` degrees of freedom, via the
/// regularized incomplete beta function.
pub fn student_t_two_sided_p_value(t_statistic: f64, df: f64) -> f64 {
    let x = df / (df + t_statistic * t_statistic);
    regularized_incomplete_beta(df / 2.0, 0.5, x).clamp(0.0, 1.0)
}

/// Continued-fraction evaluation of I_x(a, b).
fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    // The continued fraction converges quickly only for x below the
    // distribution's bulk; use the symmetry relation otherwise.
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - regularized_incomplete_beta(b, a, 1.0 - x)
    }
}

fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITERATIONS: usize = 200;
    const TINY: f64 = 1e-30;
    const EPSILON: f64 = 1e-14;

    let mut c = 1.0_f64;
    let mut d = 1.0 - (a + b) * x / (a + 1.0);
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut result = d;

    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;

        let numerator = m * (b - m) * x / ((a + 2.0 * m - 1.0) * (a + 2.0 * m));
        d = 1.0 + numerator * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + numerator / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        result *= d * c;

        let numerator = -(a + m) * (a + b + m) * x / ((a + 2.0 * m) * (a + 2.0 * m + 1.0));
        d = 1.0 + numerator * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + numerator / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        result *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }

    result
}

/// Lanczos approximation of ln Γ(x) for positive x.
fn ln_gamma(x: f64) -> f64 {
    const COEFFICIENTS: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.120_865_097_386_617_9e-2,
        -0.539_523_938_495_3e-5,
    ];

    let mut denominator = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();

    let mut sum = 1.000_000_000_190_015_f64;
    for coefficient in COEFFICIENTS {
        denominator += 1.0;
        sum += coefficient / denominator;
    }

    -tmp + (2.506_628_274_631_000_5 * sum / x).ln()
}
