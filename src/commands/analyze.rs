//! Read-only commands: analyze, candidates, recommend.

use chrono::Utc;

use super::display;
use crate::analysis::{RecommendationPolicy, Survey, candidates as list_candidates, recommendations};
use crate::cli::GlobalOpts;
use crate::error::Result;
use crate::logging::Logger;
use crate::units::{format_size, parse_size};

/// Measure the cache and every environment under the base path.
pub(crate) fn take_survey(opts: &GlobalOpts, log: &Logger) -> Result<Survey> {
    let cache = opts.cache_analyzer()?;
    let base_path = opts.get_base_path()?;
    let environments = opts.environment_analyzer();

    log.verbose(1, format!("Measuring cache at {}", cache.root().display()));
    log.verbose(
        1,
        format!(
            "Searching {} for '{}' directories (depth {})",
            base_path.display(),
            environments.marker(),
            environments.max_depth()
        ),
    );

    let survey = Survey::take(&cache, &environments, &base_path)?;

    for line in display::failure_lines(&survey.cache.failures) {
        log.warn(line);
    }
    for failure in &survey.environments.failures {
        if failure.error.is_not_found() && failure.path == base_path {
            log.warn(format!("Base path {} does not exist", base_path.display()));
        } else {
            log.warn(format!("Skipped {failure}"));
        }
    }

    log.verbose(
        1,
        format!(
            "Found {} environment(s), {} in total",
            survey.environments.len(),
            format_size(survey.total_bytes())
        ),
    );
    Ok(survey)
}

/// Executes the analyze command.
///
/// Prints the cache breakdown, the environments largest first, and the
/// largest packages of the largest environment.
pub fn analyze(opts: &GlobalOpts, top: usize) -> Result<()> {
    let log = opts.logger();
    let survey = take_survey(opts, &log)?;
    let now = Utc::now();

    print!("{}", display::cache_report(&survey.cache, top));
    println!();
    print!(
        "{}",
        display::environment_table(&survey.environments.records, top, now)
    );

    if let Some(largest) = survey.environments.records.first() {
        let packages = opts.environment_analyzer().top_packages(&largest.path, top)?;
        println!();
        print!("{}", display::package_table(largest, &packages));
    }

    println!();
    println!(
        "Total: {} (cache {}, environments {})",
        format_size(survey.total_bytes()),
        format_size(survey.cache_bytes()),
        format_size(survey.environment_bytes())
    );
    Ok(())
}

/// Executes the candidates command.
pub fn candidates(opts: &GlobalOpts) -> Result<()> {
    let log = opts.logger();
    let policy = opts.thresholds().candidate_policy()?;
    let survey = take_survey(opts, &log)?;

    let found = list_candidates(&survey, &policy, Utc::now());
    print!("{}", display::candidate_table(&found));
    Ok(())
}

/// Executes the recommend command.
pub fn recommend(opts: &GlobalOpts, cache_threshold: &str, env_count_threshold: usize) -> Result<()> {
    let log = opts.logger();
    let policy = opts.thresholds().candidate_policy()?;
    let recommendation_policy = RecommendationPolicy {
        cache_threshold_bytes: parse_size(cache_threshold)?,
        environment_count_threshold: env_count_threshold,
    };
    let survey = take_survey(opts, &log)?;

    let found = list_candidates(&survey, &policy, Utc::now());
    let advice = recommendations(&survey, &found, &recommendation_policy);
    print!("{}", display::recommendation_list(&advice));
    Ok(())
}
