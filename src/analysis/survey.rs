use std::path::Path;

use chrono::{DateTime, Utc};

use super::cache::CacheAnalyzer;
use super::classifier::{Thresholds, environment_candidate};
use super::environment::EnvironmentAnalyzer;
use crate::error::Result;
use crate::report::{
    CandidateKind, CleanupCandidate, DirectorySizeReport, EnvironmentScan, Reason, Safety,
};
use crate::units::format_size;

/// Cache and environments as measured by one analysis run.
#[derive(Debug)]
pub struct Survey {
    pub cache: DirectorySizeReport,
    pub environments: EnvironmentScan,
    pub taken_at: DateTime<Utc>,
}

impl Survey {
    /// Measure the cache and every environment under `base`.
    pub fn take(cache: &CacheAnalyzer, environments: &EnvironmentAnalyzer, base: &Path) -> Result<Self> {
        Ok(Self {
            cache: cache.analyze()?,
            environments: environments.analyze_all(base),
            taken_at: Utc::now(),
        })
    }

    pub fn cache_bytes(&self) -> u64 {
        self.cache.size_bytes
    }

    pub fn environment_bytes(&self) -> u64 {
        self.environments.total_bytes()
    }

    pub fn total_bytes(&self) -> u64 {
        self.cache_bytes().saturating_add(self.environment_bytes())
    }
}

/// Which environments are worth classifying at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidatePolicy {
    pub thresholds: Thresholds,
    /// Environments smaller than this are ignored; they are usually empty
    /// placeholders and not worth a prompt.
    pub ignore_below_bytes: u64,
}

/// Every cleanup candidate in `survey`: the cache first (when it holds
/// anything), then unused environments from smallest to largest.
pub fn candidates(
    survey: &Survey,
    policy: &CandidatePolicy,
    now: DateTime<Utc>,
) -> Vec<CleanupCandidate> {
    let mut result = Vec::new();

    if survey.cache.size_bytes > 0 {
        result.push(CleanupCandidate {
            kind: CandidateKind::Cache,
            target: survey.cache.path.clone(),
            estimated_bytes_freed: survey.cache.size_bytes,
            safety: Safety::Safe,
            rationale: vec![Reason::RebuildableCache],
        });
    }

    let mut environments: Vec<CleanupCandidate> = survey
        .environments
        .records
        .iter()
        .filter(|record| record.size_bytes >= policy.ignore_below_bytes)
        .filter_map(|record| environment_candidate(record, &policy.thresholds, now))
        .collect();
    environments.sort_by(|a, b| {
        a.estimated_bytes_freed
            .cmp(&b.estimated_bytes_freed)
            .then_with(|| a.target.cmp(&b.target))
    });

    result.extend(environments);
    result
}

/// Limits that turn measurements into recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationPolicy {
    /// Recommend cleaning the cache once it grows past this.
    pub cache_threshold_bytes: u64,
    /// Suggest a review once more environments than this exist.
    pub environment_count_threshold: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationKind {
    CleanCache,
    RemoveEnvironments,
    Review,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub action: String,
    pub potential_savings: u64,
    pub description: String,
}

/// Turn a survey and its candidates into actionable advice.
pub fn recommendations(
    survey: &Survey,
    candidates: &[CleanupCandidate],
    policy: &RecommendationPolicy,
) -> Vec<Recommendation> {
    let mut result = Vec::new();

    let cache_bytes = survey.cache_bytes();
    if cache_bytes > policy.cache_threshold_bytes {
        result.push(Recommendation {
            kind: RecommendationKind::CleanCache,
            action: "Clean the package cache".to_string(),
            potential_savings: cache_bytes,
            description: format!(
                "The cache holds {}. Cleaning is safe: packages are downloaded again when needed.",
                format_size(cache_bytes)
            ),
        });
    }

    let unused: Vec<&CleanupCandidate> = candidates
        .iter()
        .filter(|c| c.kind == CandidateKind::Environment)
        .collect();
    if !unused.is_empty() {
        let total: u64 = unused.iter().map(|c| c.estimated_bytes_freed).sum();
        result.push(Recommendation {
            kind: RecommendationKind::RemoveEnvironments,
            action: format!("Remove {} unused environment(s)", unused.len()),
            potential_savings: total,
            description: format!(
                "Found {} potentially unused environments totaling {}.",
                unused.len(),
                format_size(total)
            ),
        });
    }

    let count = survey.environments.len();
    if count > policy.environment_count_threshold {
        result.push(Recommendation {
            kind: RecommendationKind::Review,
            action: "Review environments".to_string(),
            potential_savings: 0,
            description: format!("There are {count} environments. Consider removing unused ones."),
        });
    }

    result
}
