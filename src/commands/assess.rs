use anyhow::Result;
use tracing::{info, warn};

use crate::cli::{AssessArgs, AssessMode};
use crate::engine;
use crate::model::{AssessRunManifest, DocumentsManifest};
use crate::rules::RuleConfig;
use crate::util::{now_utc_string, print_json_pretty, read_json_file, write_json_pretty};

pub fn run(args: AssessArgs) -> Result<()> {
    let (rules, rules_source) = RuleConfig::load(args.rules.as_deref())?;
    for warning in rules.validate()? {
        warn!(warning = %warning, "rule configuration warning");
    }

    let manifest: DocumentsManifest = read_json_file(&args.documents)?;
    info!(
        documents = manifest.documents.len(),
        rules = %rules_source,
        mode = args.mode.as_str(),
        "loaded documents manifest"
    );

    let outcome = engine::assess_batch(
        &manifest.documents,
        &rules,
        matches!(args.mode, AssessMode::Full),
    );

    let run_manifest = AssessRunManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        mode: args.mode.as_str().to_string(),
        rules_source,
        document_count: outcome.document_count,
        lake_count: outcome.lake_count,
        compliance_results: outcome.compliance_results,
        assessments: outcome.assessments,
        conditions: outcome.conditions,
    };

    info!(
        lakes = run_manifest.lake_count,
        assessments = run_manifest.assessments.len(),
        conditions = run_manifest.conditions.len(),
        "assessment complete"
    );

    match &args.output {
        Some(path) => {
            write_json_pretty(path, &run_manifest)?;
            info!(path = %path.display(), "wrote assessment manifest");
            Ok(())
        }
        None => print_json_pretty(&run_manifest),
    }
}
