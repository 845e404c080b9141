// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry mapping a system name to a step executor factory.
//!
//! Resolution happens once, at job construction time; an unknown system
//! is a construction error, not a runtime lookup surprise.

use super::StepExecutor;
use std::collections::HashMap;
use thiserror::Error;

/// Errors from registry resolution
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no executor registered for system '{0}'")]
    UnknownSystem(String),
}

type ExecutorFactory = Box<dyn Fn() -> Box<dyn StepExecutor> + Send + Sync>;

/// Maps system names (e.g. a target site) to executor factories.
#[derive(Default)]
pub struct ExecutorRegistry {
    factories: HashMap<String, ExecutorFactory>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a system name. A later registration for
    /// the same name replaces the earlier one.
    pub fn register<F>(&mut self, system: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn StepExecutor> + Send + Sync + 'static,
    {
        self.factories.insert(system.into(), Box::new(factory));
    }

    /// Build a fresh executor for the given system.
    pub fn resolve(&self, system: &str) -> Result<Box<dyn StepExecutor>, RegistryError> {
        self.factories
            .get(system)
            .map(|factory| factory())
            .ok_or_else(|| RegistryError::UnknownSystem(system.to_string()))
    }

    /// Registered system names, for diagnostics.
    pub fn systems(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
