//! The ordered catalogue of candidate models.
//!
//! Order matters: models are fitted in listed order and, when two models
//! reach the same R², the first-listed one wins.

use std::collections::HashSet;

use crate::error::RegistryError;
use crate::models::ModelKind;

/// One catalogue entry: a functional form, its name and its starting point.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub kind: ModelKind,
    pub name: String,
    pub initial_params: Vec<f64>,
}

impl ModelSpec {
    /// Entry with the kind's display name and default starting point.
    pub fn standard(kind: ModelKind) -> Self {
        Self {
            kind,
            name: kind.display_name().to_string(),
            initial_params: kind.initial_params(),
        }
    }
}

/// Validated, read-only list of model specs.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    specs: Vec<ModelSpec>,
}

impl ModelRegistry {
    /// Build a registry, rejecting arity mismatches and duplicate names.
    pub fn new(specs: Vec<ModelSpec>) -> Result<Self, RegistryError> {
        if specs.is_empty() {
            return Err(RegistryError::Empty);
        }
        let mut seen = HashSet::new();
        for spec in &specs {
            let expected = spec.kind.param_count();
            if spec.initial_params.len() != expected {
                return Err(RegistryError::ArityMismatch {
                    name: spec.name.clone(),
                    expected,
                    found: spec.initial_params.len(),
                });
            }
            if !seen.insert(spec.name.to_ascii_lowercase()) {
                return Err(RegistryError::DuplicateName {
                    name: spec.name.clone(),
                });
            }
        }
        Ok(Self { specs })
    }

    /// The full nine-model catalogue.
    pub fn standard() -> Self {
        Self {
            specs: ModelKind::ALL.into_iter().map(ModelSpec::standard).collect(),
        }
    }

    /// Keep only the named models (case-insensitive), preserving registry order.
    pub fn only<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, RegistryError> {
        for name in names {
            let name = name.as_ref();
            if self.get(name).is_none() {
                return Err(RegistryError::UnknownModel {
                    name: name.to_string(),
                });
            }
        }
        let specs = self
            .specs
            .iter()
            .filter(|s| names.iter().any(|n| s.name.eq_ignore_ascii_case(n.as_ref())))
            .cloned()
            .collect();
        Self::new(specs)
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.specs.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn specs(&self) -> &[ModelSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
