//! CLI subcommand handlers.

use riskmap_core::config::RiskmapConfig;
use riskmap_core::coverage::{capability_coverage, tier_counts};
use riskmap_core::{Catalog, ModelSpecs, RiskAssessment, ThresholdMatcher, parse_flops};
use serde::Serialize;

use crate::render::{self, Explanation};
use crate::{Commands, ConfigAction};

/// Handle a CLI subcommand.
pub fn handle_command(command: Commands, config: &RiskmapConfig) -> anyhow::Result<()> {
    match command {
        Commands::Config { action } => handle_config(action, config),
        Commands::Assess {
            name,
            compute,
            parameters,
            capabilities,
            evaluations,
            explain,
            json,
        } => {
            let compute = parse_flops(&compute)?;
            let mut model = ModelSpecs::new(name, compute).with_capabilities(capabilities);
            model.passed_evaluations = evaluations;
            if let Some(billions) = parameters {
                model = model.with_parameters(billions * 1e9);
            }
            handle_assess(&model, config, explain, json)
        }
        Commands::Frameworks { json } => {
            let catalog = load_catalog(config)?;
            if json {
                print_json(&catalog.frameworks)
            } else {
                print!("{}", render::frameworks(&catalog));
                Ok(())
            }
        }
        Commands::Coverage { json } => {
            let catalog = load_catalog(config)?;
            let counts = tier_counts(&catalog);
            let coverage = capability_coverage(&catalog);
            if json {
                print_json(&serde_json::json!({
                    "tier_counts": counts,
                    "capability_coverage": coverage,
                }))
            } else {
                print!("{}", render::coverage(&counts, &coverage));
                Ok(())
            }
        }
        Commands::Thresholds { json } => {
            let catalog = load_catalog(config)?;
            if json {
                print_json(&catalog.compute_thresholds)
            } else {
                print!("{}", render::thresholds(&catalog.compute_thresholds));
                Ok(())
            }
        }
    }
}

fn load_catalog(config: &RiskmapConfig) -> anyhow::Result<Catalog> {
    Catalog::load(&config.data).map_err(|e| anyhow::anyhow!("Error loading data: {}", e))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Assessment JSON with the trigger behind each assigned tier.
#[derive(Serialize)]
struct ExplainedAssessment<'a> {
    #[serde(flatten)]
    assessment: &'a RiskAssessment,
    match_reasons: &'a [Explanation],
}

/// One entry per key of the assessment map that has a triggered tier.
fn explanations(matcher: &ThresholdMatcher, model: &ModelSpecs) -> Vec<Explanation> {
    matcher
        .match_catalog(model)
        .into_iter()
        .filter_map(|(framework, matched)| {
            matched.reason().map(|reason| Explanation {
                framework,
                tier: matched.tier_name().to_string(),
                reason: reason.clone(),
            })
        })
        .collect()
}

fn handle_assess(
    model: &ModelSpecs,
    config: &RiskmapConfig,
    explain: bool,
    json: bool,
) -> anyhow::Result<()> {
    let catalog = load_catalog(config)?;
    let matcher = ThresholdMatcher::new(catalog, &config.matching);
    let assessment = matcher.assess(model)?;

    let explanations = if explain {
        explanations(&matcher, model)
    } else {
        Vec::new()
    };

    if json {
        return if explain {
            print_json(&ExplainedAssessment {
                assessment: &assessment,
                match_reasons: &explanations,
            })
        } else {
            print_json(&assessment)
        };
    }

    let exceeded = matcher
        .catalog()
        .compute_thresholds
        .exceeded_by(model.training_compute_flops);

    print!(
        "{}",
        render::assessment(
            &assessment,
            matcher.catalog().regulatory.compute_threshold_flops,
            &exceeded,
            &explanations,
        )
    );
    Ok(())
}

fn handle_config(action: ConfigAction, config: &RiskmapConfig) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}
