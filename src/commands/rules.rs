use anyhow::Result;
use tracing::{info, warn};

use crate::cli::RulesArgs;
use crate::rules::RuleConfig;
use crate::util::print_json_pretty;

pub fn run(args: RulesArgs) -> Result<()> {
    let (rules, source) = RuleConfig::load(args.rules.as_deref())?;
    let warnings = rules.validate()?;
    for warning in &warnings {
        warn!(warning = %warning, "rule configuration warning");
    }

    info!(
        source = %source,
        critical_parameters = rules.critical_parameters.len(),
        critical_calculations = rules.critical_calculations.len(),
        problematic_parameters = rules.problematic_parameters.len(),
        synonyms = rules.synonyms.len(),
        warnings = warnings.len(),
        "rule configuration is valid"
    );

    if !args.check {
        print_json_pretty(&rules)?;
    }

    Ok(())
}
