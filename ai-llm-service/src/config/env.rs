//! Environment lookup with typed, validated accessors.
//!
//! Configs are read through an [`EnvReader`] rather than `std::env` directly,
//! so tests can feed a fixed set of pairs without mutating the process
//! environment.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error_handler::{AiLlmError, ConfigError};

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub struct EnvReader {
    lookup: Lookup,
}

impl EnvReader {
    /// Reads from the process environment.
    pub fn process() -> Self {
        Self {
            lookup: Box::new(|k| std::env::var(k).ok()),
        }
    }

    /// Reads from a fixed set of pairs.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            lookup: Box::new(move |k| map.get(k).cloned()),
        }
    }

    /// Returns the trimmed value, treating empty strings as unset.
    pub fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Fetches a required, non-empty variable.
    ///
    /// # Errors
    /// [`ConfigError::MissingVar`] if the variable is absent or empty.
    pub fn must(&self, name: &'static str) -> Result<String, AiLlmError> {
        self.get(name)
            .ok_or_else(|| ConfigError::MissingVar(name).into())
    }

    pub fn or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    /// Parses an optional number (`Ok(None)` if unset/empty).
    ///
    /// # Errors
    /// [`ConfigError::InvalidNumber`] if the variable is set but does not parse.
    pub fn opt_num<T: FromStr>(
        &self,
        name: &'static str,
        reason: &'static str,
    ) -> Result<Option<T>, AiLlmError> {
        match self.get(name) {
            Some(v) => v
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidNumber { var: name, reason }.into()),
            None => Ok(None),
        }
    }

    pub fn opt_u32(&self, name: &'static str) -> Result<Option<u32>, AiLlmError> {
        self.opt_num(name, "expected u32")
    }

    pub fn opt_u64(&self, name: &'static str) -> Result<Option<u64>, AiLlmError> {
        self.opt_num(name, "expected u64")
    }

    pub fn opt_usize(&self, name: &'static str) -> Result<Option<usize>, AiLlmError> {
        self.opt_num(name, "expected unsigned integer")
    }

    pub fn opt_f32(&self, name: &'static str) -> Result<Option<f32>, AiLlmError> {
        self.opt_num(name, "expected float")
    }
}

impl std::fmt::Debug for EnvReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EnvReader")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_count_as_unset() {
        let env = EnvReader::from_pairs(&[("A", "  "), ("B", " x ")]);
        assert_eq!(env.get("A"), None);
        assert_eq!(env.get("B").as_deref(), Some("x"));
        assert!(matches!(
            env.must("A"),
            Err(AiLlmError::Config(ConfigError::MissingVar("A")))
        ));
    }

    #[test]
    fn numbers_parse_or_fail_loudly() {
        let env = EnvReader::from_pairs(&[("N", "512"), ("BAD", "lots")]);
        assert_eq!(env.opt_u32("N").unwrap(), Some(512));
        assert_eq!(env.opt_u32("MISSING").unwrap(), None);
        assert!(matches!(
            env.opt_u32("BAD"),
            Err(AiLlmError::Config(ConfigError::InvalidNumber { var: "BAD", .. }))
        ));
    }
}
