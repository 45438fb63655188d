//! # Configuração do Extrator
//!
//! Tabelas de rótulos usadas pelo canonicalizador. Todas têm valores padrão;
//! um arquivo JSON pode sobrescrever qualquer subconjunto dos campos.
//!
//! ```json
//! { "accepted_labels": ["PERSON", "EMAIL"], "display_separator": "; " }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuração imutável do canonicalizador, compartilhada entre documentos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Rótulos (antes do remapeamento) que entram no conjunto de registros.
    pub accepted_labels: Vec<String>,
    /// Renomeação de rótulos: categoria estatística → rótulo de exibição.
    pub label_remap: BTreeMap<String, String>,
    /// Rótulos preservados literalmente (sem limpeza nem capitalização).
    pub literal_labels: Vec<String>,
    /// Separador usado ao juntar os valores de um rótulo para exibição.
    pub display_separator: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            accepted_labels: strings(&[
                "PERSON",
                "ORG",
                "GPE",
                "LOC",
                "LOCATION",
                "LANGUAGE",
                "SKILL",
                "DEGREE",
                "EMAIL",
                "MOBILE",
                "EDUCATIONAL_INSTITUTION",
                "LINKEDIN",
                "GITHUB",
            ]),
            label_remap: [("PERSON", "NAME"), ("GPE", "LOCATION"), ("LOC", "LOCATION")]
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            literal_labels: strings(&["MOBILE", "EMAIL", "LINKEDIN", "GITHUB"]),
            display_separator: ",    ".to_string(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ExtractorConfig {
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&source)
    }

    pub fn accepts(&self, label: &str) -> bool {
        self.accepted_labels.iter().any(|l| l == label)
    }

    /// Rótulo final após o remapeamento.
    pub fn remap<'a>(&'a self, label: &'a str) -> &'a str {
        self.label_remap.get(label).map(String::as_str).unwrap_or(label)
    }

    pub fn is_literal(&self, label: &str) -> bool {
        self.literal_labels.iter().any(|l| l == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ExtractorConfig::default();
        assert_eq!(cfg.remap("PERSON"), "NAME");
        assert_eq!(cfg.remap("GPE"), "LOCATION");
        assert_eq!(cfg.remap("LOC"), "LOCATION");
        assert_eq!(cfg.remap("SKILL"), "SKILL");
        assert!(cfg.is_literal("MOBILE"));
        assert!(!cfg.is_literal("SKILL"));
        assert!(cfg.accepts("ORG"));
        assert!(!cfg.accepts("NORP"));
    }

    #[test]
    fn test_partial_override() {
        let cfg = ExtractorConfig::from_json_str(r#"{"display_separator": "; "}"#).unwrap();
        assert_eq!(cfg.display_separator, "; ");
        assert_eq!(cfg.remap("PERSON"), "NAME");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            ExtractorConfig::from_json_str("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }
}
