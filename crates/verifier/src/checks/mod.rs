//! Rule checks over extracted function facts.
//!
//! Each check is pure: it reads a [`FunctionFacts`] record and either emits
//! one finding or stays silent. The registry isolates failures so a single
//! misbehaving check cannot abort the batch.

mod patterns;

pub use patterns::{
    BareExceptCheck, BroadExceptCheck, CommandInjectionCheck, GiantFunctionCheck,
    ImplicitNoneReturnCheck, MutableDefaultsCheck, ResourceLeakCheck, ShadowBuiltinCheck,
    StarImportCheck, UnreachableCodeCheck,
};

use std::sync::Arc;

use anyhow::Result;
use rayon::prelude::*;
use tracing::warn;

use crate::core::Finding;
use crate::facts::FunctionFacts;

pub trait Check: Send + Sync {
    /// Stable check name, used as the finding type in ids and rule ids.
    fn id(&self) -> &'static str;

    fn check(&self, facts: &FunctionFacts) -> Result<Option<Finding>>;
}

/// Ordered collection of checks. Order is stable so findings come out in a
/// deterministic sequence for a given input.
pub struct CheckRegistry {
    checks: Vec<Arc<dyn Check>>,
    parallel: bool,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            parallel: false,
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(BareExceptCheck);
        registry.register(MutableDefaultsCheck);
        registry.register(ResourceLeakCheck);
        registry.register(CommandInjectionCheck);
        registry.register(ImplicitNoneReturnCheck);
        registry.register(UnreachableCodeCheck);
        registry.register(GiantFunctionCheck);
        registry.register(StarImportCheck);
        registry.register(BroadExceptCheck);
        registry.register(ShadowBuiltinCheck);
        registry
    }

    pub fn register<C: Check + 'static>(&mut self, check: C) {
        self.checks.push(Arc::new(check));
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn list_ids(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.id()).collect()
    }

    /// Run every registered check against one fact record. A failing check is
    /// logged and skipped; the remaining checks still run.
    pub fn run_all(&self, facts: &FunctionFacts) -> Vec<Finding> {
        if self.parallel {
            let mut findings: Vec<(usize, Finding)> = self
                .checks
                .par_iter()
                .enumerate()
                .filter_map(|(i, check)| match check.check(facts) {
                    Ok(finding) => finding.map(|f| (i, f)),
                    Err(e) => {
                        warn!(check = check.id(), function = %facts.function_name, error = %e, "check failed");
                        None
                    }
                })
                .collect();
            findings.sort_by_key(|(i, _)| *i);
            findings.into_iter().map(|(_, f)| f).collect()
        } else {
            let mut findings = Vec::new();
            for check in &self.checks {
                match check.check(facts) {
                    Ok(Some(finding)) => findings.push(finding),
                    Ok(None) => {}
                    Err(e) => {
                        warn!(check = check.id(), function = %facts.function_name, error = %e, "check failed");
                    }
                }
            }
            findings
        }
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
