//! Run orchestration with Rayon-based parallel comparison.
//!
//! Both universes are built once, sequentially, and then only read.  Every
//! primary-artifact class of the base universe is compared independently on
//! a bounded worker pool, and the per-class results are merged and sorted by
//! the aggregator.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::classpath::index::ClasspathIndex;
use crate::classpath::universe::UniverseInputs;
use crate::errors::JccResult;
use crate::models::ClassModel;
use crate::report::{CheckReport, ClassResult, Diagnostic};
use crate::rules::config::CheckerConfig;
use crate::rules::engine::RuleEngine;

fn compare_all(
    engine: &RuleEngine<'_>,
    roots: &[&Arc<ClassModel>],
    workers: usize,
) -> Vec<ClassResult> {
    let compare_one =
        |class: &&Arc<ClassModel>| ClassResult::new(Arc::clone(*class), engine.compare(class));

    if roots.is_empty() {
        return vec![];
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build();

    match pool {
        Ok(pool) => pool.install(|| roots.par_iter().map(compare_one).collect()),
        Err(e) => {
            debug!("Worker pool unavailable ({e}); comparing sequentially");
            roots.iter().map(compare_one).collect()
        }
    }
}

fn diagnostics_for(index: &ClasspathIndex) -> impl Iterator<Item = Diagnostic> + '_ {
    index
        .duplicates()
        .iter()
        .map(|duplicate| Diagnostic::DuplicateClass {
            universe: index.label().to_string(),
            duplicate: duplicate.clone(),
        })
}

/// Entry point for one compatibility run.
#[derive(Clone, Debug, Default)]
pub struct CompatibilityChecker {
    config: CheckerConfig,
}

impl CompatibilityChecker {
    pub fn new(config: CheckerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Validate inputs, build both universes, and compare.  Only malformed
    /// input fails the run.
    pub fn check(&self, inputs: &UniverseInputs) -> JccResult<CheckReport> {
        for model in inputs
            .base_artifact
            .iter()
            .chain(&inputs.candidate_artifact)
            .chain(&inputs.shared_libraries)
            .chain(&inputs.base_libraries)
            .chain(&inputs.candidate_libraries)
        {
            model.validate()?;
        }

        let platform = &self.config.platform_classes;
        let base = inputs.base_universe().with_platform_classes(platform.iter().cloned());
        let candidate = inputs
            .candidate_universe()
            .with_platform_classes(platform.iter().cloned());
        Ok(self.check_universes(&base, &candidate))
    }

    /// Compare every primary-artifact class of `base` against `candidate`.
    pub fn check_universes(&self, base: &ClasspathIndex, candidate: &ClasspathIndex) -> CheckReport {
        let started = Instant::now();
        let roots: Vec<&Arc<ClassModel>> = base.primary_classes().collect();
        let engine = RuleEngine::new(&self.config, candidate).with_base_universe(base);
        let results = compare_all(&engine, &roots, self.config.workers);

        let diagnostics: Vec<Diagnostic> = diagnostics_for(base)
            .chain(diagnostics_for(candidate))
            .collect();
        let report = CheckReport::aggregate(results, diagnostics);

        info!(
            "Compared {} classes in {:?} mode: {} errors, {} warnings, {} diagnostics in {}ms",
            report.classes_compared(),
            self.config.mode(),
            report.error_count,
            report.warning_count,
            report.diagnostics.len(),
            started.elapsed().as_millis()
        );
        report
    }
}

/// Run a check with `config`.
pub fn check(inputs: &UniverseInputs, config: CheckerConfig) -> JccResult<CheckReport> {
    CompatibilityChecker::new(config).check(inputs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
