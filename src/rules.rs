use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::model::TrendDirection;
use crate::util::read_json_file;

/// Whether an increase in a parameter's value is ecologically favorable.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalParameterRule {
    pub key: String,
    pub weight: i64,
    #[serde(default)]
    pub importance: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRule {
    pub key: String,
    pub weight: i64,
    /// Canonical parameter keys that must all be present for the derived
    /// value to count as properly calculated.
    #[serde(default)]
    pub inputs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblematicParameterRule {
    pub key: String,
    pub weight: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRule {
    pub parameter: String,
    pub direction: TrendDirection,
    pub text: String,
}

/// Trajectory classification thresholds. Tunable configuration, not fixed
/// law; defaults reconstruct the documented bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryBands {
    pub significant_improvement_min: f64,
    pub gradual_improvement_min: f64,
    pub gradual_degradation_max: f64,
    pub significant_degradation_max: f64,
    pub significance_level: f64,
    pub finding_percent_threshold: f64,
}

impl Default for TrajectoryBands {
    fn default() -> Self {
        Self {
            significant_improvement_min: 0.6,
            gradual_improvement_min: 0.2,
            gradual_degradation_max: -0.2,
            significant_degradation_max: -0.6,
            significance_level: 0.05,
            finding_percent_threshold: 10.0,
        }
    }
}

/// Process-wide rule tables: compliance rubric, synonym and polarity tables,
/// trajectory bands and the static recommendation mapping. Loaded once at
/// startup and treated as immutable for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub critical_parameters: Vec<CriticalParameterRule>,
    pub critical_calculations: Vec<CalculationRule>,
    pub problematic_parameters: Vec<ProblematicParameterRule>,
    /// Folded raw metric name -> canonical parameter key.
    pub synonyms: BTreeMap<String, String>,
    pub polarity: BTreeMap<String, Polarity>,
    pub trajectory: TrajectoryBands,
    pub recommendations: Vec<RecommendationRule>,
    pub fallback_recommendation: String,
}

impl RuleConfig {
    /// Loads the configuration from `path`, or the built-in defaults when no
    /// path is given. Returns the config together with a source tag for the
    /// run manifest.
    pub fn load(path: Option<&Path>) -> Result<(Self, String)> {
        match path {
            Some(path) => {
                let config: Self = read_json_file(path)
                    .with_context(|| format!("failed to load rules: {}", path.display()))?;
                Ok((config, path.display().to_string()))
            }
            None => Ok((Self::default(), "built-in".to_string())),
        }
    }

    /// Every canonical parameter key the configuration knows about.
    pub fn canonical_vocabulary(&self) -> BTreeSet<&str> {
        let mut keys = BTreeSet::new();
        keys.extend(self.synonyms.values().map(String::as_str));
        keys.extend(self.polarity.keys().map(String::as_str));
        keys.extend(self.critical_parameters.iter().map(|rule| rule.key.as_str()));
        keys.extend(self.critical_calculations.iter().map(|rule| rule.key.as_str()));
        keys.extend(
            self.critical_calculations
                .iter()
                .flat_map(|rule| rule.inputs.iter().map(String::as_str)),
        );
        keys.extend(
            self.problematic_parameters
                .iter()
                .map(|rule| rule.key.as_str()),
        );
        keys
    }

    /// Hard-fails on configurations the engine cannot score with; returns
    /// advisory warnings otherwise.
    pub fn validate(&self) -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        if self.critical_parameters.is_empty() {
            bail!("rule configuration has no critical parameters");
        }

        let mut seen = BTreeSet::new();
        for rule in &self.critical_parameters {
            if !seen.insert(rule.key.as_str()) {
                bail!("duplicate critical parameter: {}", rule.key);
            }
        }
        let mut seen = BTreeSet::new();
        for rule in &self.critical_calculations {
            if !seen.insert(rule.key.as_str()) {
                bail!("duplicate critical calculation: {}", rule.key);
            }
        }
        let mut seen = BTreeSet::new();
        for rule in &self.problematic_parameters {
            if !seen.insert(rule.key.as_str()) {
                bail!("duplicate problematic parameter: {}", rule.key);
            }
        }

        let bands = &self.trajectory;
        if bands.significant_improvement_min <= bands.gradual_improvement_min
            || bands.gradual_improvement_min <= bands.gradual_degradation_max
            || bands.gradual_degradation_max <= bands.significant_degradation_max
        {
            bail!("trajectory bands are not strictly descending");
        }
        if !(0.0..=1.0).contains(&bands.significance_level) {
            bail!(
                "significance level must lie in [0, 1], got {}",
                bands.significance_level
            );
        }

        for rule in &self.critical_parameters {
            if rule.weight <= 0 {
                warnings.push(format!(
                    "critical parameter {} has non-positive weight {}",
                    rule.key, rule.weight
                ));
            }
        }
        for rule in &self.critical_calculations {
            if rule.weight <= 0 {
                warnings.push(format!(
                    "critical calculation {} has non-positive weight {}",
                    rule.key, rule.weight
                ));
            }
        }
        for rule in &self.problematic_parameters {
            if rule.weight <= 0 {
                warnings.push(format!(
                    "problematic parameter {} has non-positive weight {}",
                    rule.key, rule.weight
                ));
            }
        }

        let vocabulary = self.canonical_vocabulary();
        for rule in &self.recommendations {
            if !vocabulary.contains(rule.parameter.as_str()) {
                warnings.push(format!(
                    "recommendation references unknown parameter {}",
                    rule.parameter
                ));
            }
        }

        Ok(warnings)
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        let synonyms = default_synonyms();
        let polarity = default_polarity();

        Self {
            critical_parameters: vec![
                critical(
                    "dissolved_oxygen_min",
                    10,
                    "minimum DO drives hypoxia and HAB risk",
                ),
                critical("orthophosphate", 10, "bottom orthophosphate feeds blooms"),
                critical("ammonia", 10, "bottom ammonia indicates anoxic release"),
                critical(
                    "cyanobacteria_pct",
                    10,
                    "cyanobacteria dominance signals HAB conditions",
                ),
                critical(
                    "lake_volume",
                    10,
                    "bathymetric volume is required for hypoxic volume calculations",
                ),
            ],
            critical_calculations: vec![CalculationRule {
                key: "hypoxic_volume_pct".to_string(),
                weight: 15,
                inputs: vec!["hypoxic_volume".to_string(), "lake_volume".to_string()],
            }],
            problematic_parameters: vec![
                ProblematicParameterRule {
                    key: "copper_sulfate_dose".to_string(),
                    weight: 5,
                    reason: Some("chemical treatment addresses symptoms, not causes".to_string()),
                },
                ProblematicParameterRule {
                    key: "algaecide_application".to_string(),
                    weight: 5,
                    reason: Some("algaecide provides temporary relief only".to_string()),
                },
            ],
            synonyms,
            polarity,
            trajectory: TrajectoryBands::default(),
            recommendations: default_recommendations(),
            fallback_recommendation:
                "Continue regular monitoring and maintain current management practices".to_string(),
        }
    }
}

fn critical(key: &str, weight: i64, importance: &str) -> CriticalParameterRule {
    CriticalParameterRule {
        key: key.to_string(),
        weight,
        importance: Some(importance.to_string()),
    }
}

fn default_synonyms() -> BTreeMap<String, String> {
    let entries: &[(&str, &str)] = &[
        ("do_min", "dissolved_oxygen_min"),
        ("min_do", "dissolved_oxygen_min"),
        ("dissolved_oxygen_minimum", "dissolved_oxygen_min"),
        ("minimum_dissolved_oxygen", "dissolved_oxygen_min"),
        ("dissolved_oxygen_min", "dissolved_oxygen_min"),
        ("hypoxic_volume", "hypoxic_volume"),
        ("anoxic_volume", "hypoxic_volume"),
        ("hypoxic_water_volume", "hypoxic_volume"),
        ("hypoxic_volume_pct", "hypoxic_volume_pct"),
        ("hypoxic_percentage", "hypoxic_volume_pct"),
        ("hypoxic_volume_percent", "hypoxic_volume_pct"),
        ("percent_hypoxic", "hypoxic_volume_pct"),
        ("orthophosphate", "orthophosphate"),
        ("orthophosphate_max", "orthophosphate"),
        ("ortho_phosphate", "orthophosphate"),
        ("soluble_reactive_phosphorus", "orthophosphate"),
        ("srp", "orthophosphate"),
        ("po4", "orthophosphate"),
        ("ammonia", "ammonia"),
        ("ammonia_max", "ammonia"),
        ("ammonia_nitrogen", "ammonia"),
        ("ammonium", "ammonia"),
        ("nh3", "ammonia"),
        ("nh4", "ammonia"),
        ("cyanobacteria_pct", "cyanobacteria_pct"),
        ("cyanobacteria_percentage", "cyanobacteria_pct"),
        ("percent_cyanobacteria", "cyanobacteria_pct"),
        ("blue_green_algae_percent", "cyanobacteria_pct"),
        ("chlorophyll_a", "chlorophyll_a"),
        ("chl_a", "chlorophyll_a"),
        ("chla", "chlorophyll_a"),
        ("chlorophyll", "chlorophyll_a"),
        ("total_phosphorus", "total_phosphorus"),
        ("tp", "total_phosphorus"),
        ("secchi_depth", "secchi_depth"),
        ("secchi", "secchi_depth"),
        ("water_clarity", "secchi_depth"),
        ("lake_volume", "lake_volume"),
        ("total_volume", "lake_volume"),
        ("water_temperature", "water_temperature"),
        ("water_temp", "water_temperature"),
        ("temperature", "water_temperature"),
        ("copper_sulfate", "copper_sulfate_dose"),
        ("copper_sulfate_dose", "copper_sulfate_dose"),
        ("cuso4", "copper_sulfate_dose"),
        ("algaecide", "algaecide_application"),
        ("algaecide_application", "algaecide_application"),
        ("herbicide_application", "algaecide_application"),
    ];

    entries
        .iter()
        .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
        .collect()
}

fn default_polarity() -> BTreeMap<String, Polarity> {
    let entries: &[(&str, Polarity)] = &[
        ("dissolved_oxygen_min", Polarity::HigherIsBetter),
        ("secchi_depth", Polarity::HigherIsBetter),
        ("compliance_score", Polarity::HigherIsBetter),
        ("hypoxic_volume", Polarity::LowerIsBetter),
        ("hypoxic_volume_pct", Polarity::LowerIsBetter),
        ("orthophosphate", Polarity::LowerIsBetter),
        ("ammonia", Polarity::LowerIsBetter),
        ("cyanobacteria_pct", Polarity::LowerIsBetter),
        ("chlorophyll_a", Polarity::LowerIsBetter),
        ("total_phosphorus", Polarity::LowerIsBetter),
    ];

    entries
        .iter()
        .map(|(key, polarity)| (key.to_string(), *polarity))
        .collect()
}

fn default_recommendations() -> Vec<RecommendationRule> {
    let entries: &[(&str, TrendDirection, &str)] = &[
        (
            "hypoxic_volume",
            TrendDirection::Increasing,
            "Hypoxic volume is increasing - implement aeration or nutrient reduction strategies immediately",
        ),
        (
            "hypoxic_volume",
            TrendDirection::Decreasing,
            "Hypoxic volume is decreasing - continue current management practices",
        ),
        (
            "hypoxic_volume_pct",
            TrendDirection::Increasing,
            "Hypoxic volume is increasing - implement aeration or nutrient reduction strategies immediately",
        ),
        (
            "dissolved_oxygen_min",
            TrendDirection::Decreasing,
            "Dissolved oxygen is declining - investigate causes and consider intervention",
        ),
        (
            "orthophosphate",
            TrendDirection::Increasing,
            "Nutrient levels are increasing - review watershed management and implement source controls",
        ),
        (
            "ammonia",
            TrendDirection::Increasing,
            "Nutrient levels are increasing - review watershed management and implement source controls",
        ),
        (
            "cyanobacteria_pct",
            TrendDirection::Increasing,
            "Cyanobacteria dominance is increasing - high HAB risk, implement mitigation measures",
        ),
    ];

    entries
        .iter()
        .map(|(parameter, direction, text)| RecommendationRule {
            parameter: parameter.to_string(),
            direction: *direction,
            text: text.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        let config = RuleConfig::default();
        let warnings = config.validate().expect("default config validates");
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn default_vocabulary_covers_rubric_keys() {
        let config = RuleConfig::default();
        let vocabulary = config.canonical_vocabulary();

        for rule in &config.critical_parameters {
            assert!(vocabulary.contains(rule.key.as_str()));
        }
        assert!(vocabulary.contains("hypoxic_volume_pct"));
        assert!(vocabulary.contains("copper_sulfate_dose"));
    }

    #[test]
    fn validation_rejects_duplicate_critical_keys() {
        let mut config = RuleConfig::default();
        config
            .critical_parameters
            .push(critical("ammonia", 10, "duplicate"));

        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_misordered_bands() {
        let mut config = RuleConfig::default();
        config.trajectory.gradual_improvement_min = 0.7;

        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = RuleConfig::default();
        let encoded = serde_json::to_string(&config).expect("serializes");
        let decoded: RuleConfig = serde_json::from_str(&encoded).expect("parses");

        assert_eq!(
            decoded.critical_parameters.len(),
            config.critical_parameters.len()
        );
        assert_eq!(decoded.synonyms, config.synonyms);
        assert_eq!(
            decoded.trajectory.significance_level,
            config.trajectory.significance_level
        );
    }

    #[test]
    fn partial_config_falls_back_to_field_defaults() {
        let decoded: RuleConfig = serde_json::from_str(
            r#"{"critical_parameters": [{"key": "dissolved_oxygen_min", "weight": 4}]}"#,
        )
        .expect("parses");

        assert_eq!(decoded.critical_parameters.len(), 1);
        assert_eq!(decoded.critical_parameters[0].weight, 4);
        assert!(!decoded.synonyms.is_empty());
        assert_eq!(decoded.trajectory.significant_improvement_min, 0.6);
    }
}
