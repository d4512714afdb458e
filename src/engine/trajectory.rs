use crate::model::{Trajectory, TrendDirection, TrendResult};
use crate::rules::{Polarity, RuleConfig};

#[derive(Debug, Clone)]
pub struct TrajectorySummary {
    pub trajectory: Trajectory,
    pub composite_score: f64,
    pub scored_parameters: usize,
    pub key_findings: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Aggregates per-parameter trends into one overall trajectory. Parameters
/// without a polarity entry are excluded from the composite but still show
/// up in findings when they qualify.
pub fn classify(results: &[TrendResult], rules: &RuleConfig) -> TrajectorySummary {
    let mut composite = 0.0_f64;
    let mut scored_parameters = 0_usize;

    for result in results {
        let Some(polarity) = rules.polarity.get(&result.parameter) else {
            continue;
        };

        scored_parameters += 1;
        composite += improvement_score(result, *polarity, rules.trajectory.significance_level);
    }

    let composite_score = if scored_parameters == 0 {
        0.0
    } else {
        composite / scored_parameters as f64
    };

    TrajectorySummary {
        trajectory: trajectory_for(composite_score, rules),
        composite_score,
        scored_parameters,
        key_findings: key_findings(results, rules),
        recommendations: recommendations(results, rules),
    }
}

/// Signed ecological improvement score for one parameter: full weight when
/// the favorable direction is statistically significant, half otherwise.
fn improvement_score(result: &TrendResult, polarity: Polarity, significance_level: f64) -> f64 {
    let favorable = match (result.direction, polarity) {
        (TrendDirection::Stable, _) => return 0.0,
        (TrendDirection::Increasing, Polarity::HigherIsBetter) => true,
        (TrendDirection::Decreasing, Polarity::LowerIsBetter) => true,
        (TrendDirection::Increasing, Polarity::LowerIsBetter) => false,
        (TrendDirection::Decreasing, Polarity::HigherIsBetter) => false,
    };

    let significant = result
        .p_value
        .map(|p| p < significance_level)
        .unwrap_or(false);

    let magnitude = if significant { 1.0 } else { 0.5 };
    if favorable { magnitude } else { -magnitude }
}

fn trajectory_for(composite_score: f64, rules: &RuleConfig) -> Trajectory {
    let bands = &rules.trajectory;

    if composite_score >= bands.significant_improvement_min {
        Trajectory::SignificantImprovement
    } else if composite_score >= bands.gradual_improvement_min {
        Trajectory::GradualImprovement
    } else if composite_score > bands.gradual_degradation_max {
        Trajectory::Stable
    } else if composite_score > bands.significant_degradation_max {
        Trajectory::GradualDegradation
    } else {
        Trajectory::SignificantDegradation
    }
}

/// One finding per parameter that moved by at least the percent threshold or
/// carries a significant p-value.
fn key_findings(results: &[TrendResult], rules: &RuleConfig) -> Vec<String> {
    let bands = &rules.trajectory;
    let mut findings = Vec::new();

    for result in results {
        let large_change = result
            .percent_change
            .map(|change| change.abs() >= bands.finding_percent_threshold)
            .unwrap_or(false);
        let significant = result
            .p_value
            .map(|p| p < bands.significance_level)
            .unwrap_or(false);
        if !large_change && !significant {
            continue;
        }

        let label = parameter_label(&result.parameter);
        let finding = match (result.direction, result.percent_change) {
            (TrendDirection::Stable, _) => {
                format!("{label} has remained relatively stable")
            }
            (TrendDirection::Increasing, Some(change)) => {
                format!("{label} has increased by {:.1}%", change.abs())
            }
            (TrendDirection::Decreasing, Some(change)) => {
                format!("{label} has decreased by {:.1}%", change.abs())
            }
            (direction, None) => {
                format!("{label} shows {} trend", article_for(direction))
            }
        };
        findings.push(finding);
    }

    findings
}

fn article_for(direction: TrendDirection) -> String {
    match direction {
        TrendDirection::Increasing => "an increasing".to_string(),
        TrendDirection::Decreasing => "a decreasing".to_string(),
        TrendDirection::Stable => "a stable".to_string(),
    }
}

/// Static (parameter, direction) lookup; duplicate texts collapse while
/// preserving first-seen order. Always yields at least the fallback.
fn recommendations(results: &[TrendResult], rules: &RuleConfig) -> Vec<String> {
    let mut recommendations: Vec<String> = Vec::new();

    for result in results {
        for rule in &rules.recommendations {
            if rule.parameter == result.parameter
                && rule.direction == result.direction
                && !recommendations.contains(&rule.text)
            {
                recommendations.push(rule.text.clone());
            }
        }
    }

    if recommendations.is_empty() {
        recommendations.push(rules.fallback_recommendation.clone());
    }

    recommendations
}

/// `dissolved_oxygen_min` -> `Dissolved Oxygen Min`.
pub fn parameter_label(parameter: &str) -> String {
    parameter
        .split('_')
        .map(|word| {
            let mut characters = word.chars();
            match characters.next() {
                Some(first) => first.to_uppercase().collect::<String>() + characters.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
