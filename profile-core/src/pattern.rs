//! # Compilador de Padrões
//!
//! Transforma definições declarativas (JSON Lines) em matchers internos.
//! Cada linha do arquivo descreve um padrão:
//!
//! ```json
//! {"label": "EDUCATIONAL_INSTITUTION", "pattern": [
//!     {"lower_in": ["university", "college"]},
//!     {"is_alpha": true, "is_stop": true, "op": "*"},
//!     {"lower_in": ["teacher", "professor"], "op": "!"},
//!     {"is_alpha": true, "is_stop": false, "op": "*"}
//! ]}
//! ```
//!
//! ## Predicados por passo
//!
//! Um passo combina (conjunção) um ou mais predicados:
//!
//! | Chave          | Teste                                        |
//! |----------------|----------------------------------------------|
//! | `lower_in`     | texto minúsculo pertence ao conjunto         |
//! | `text_regex`   | regex encontrada no texto cru                |
//! | `lower_regex`  | regex encontrada no texto minúsculo          |
//! | `is_alpha`     | token alfabético (ou não)                    |
//! | `is_stop`      | token stopword (ou não)                      |
//! | `ent_type_in`  | tipo estatístico pertence ao conjunto        |
//!
//! ## Quantificadores (`op`)
//!
//! - `"1"` (padrão): exatamente um token.
//! - `"*"`: zero ou mais, guloso.
//! - `"+"`: um ou mais, guloso.
//! - `"!"`: lookahead negativo de largura zero.
//!
//! Uma definição inválida é rejeitada sozinha; o restante do conjunto é
//! compilado normalmente.

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PatternError, Rejection, RulesetError};
use crate::token::Token;

/// Regras padrão embutidas no crate.
const EMBEDDED_RULES: &str = include_str!("../rules/patterns.jsonl");

/// Definição de um passo como aparece no arquivo de regras.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_in: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_alpha: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_stop: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ent_type_in: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
}

/// Definição de um padrão completo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternDef {
    pub label: String,
    /// Nome para rastreabilidade (ex: "mobile_us"). Opcional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub pattern: Vec<StepDef>,
}

/// Um teste sobre os atributos de um único token.
#[derive(Debug, Clone)]
pub enum TokenPredicate {
    LowerIn(HashSet<String>),
    TextRegex(Regex),
    LowerRegex(Regex),
    IsAlpha(bool),
    IsStop(bool),
    EntTypeIn(HashSet<String>),
}

impl TokenPredicate {
    /// Avalia o predicado. Atributo ausente (sem tipo estatístico) → falso.
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            TokenPredicate::LowerIn(set) => set.contains(&token.lower),
            TokenPredicate::TextRegex(re) => re.is_match(&token.text),
            TokenPredicate::LowerRegex(re) => re.is_match(&token.lower),
            TokenPredicate::IsAlpha(expected) => token.is_alpha == *expected,
            TokenPredicate::IsStop(expected) => token.is_stop == *expected,
            TokenPredicate::EntTypeIn(set) => token
                .ent_type
                .as_ref()
                .map(|t| set.contains(t))
                .unwrap_or(false),
        }
    }
}

/// Quantas ocorrências consecutivas um passo consome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantifier {
    One,
    ZeroOrMore,
    OneOrMore,
    ZeroOccurrence,
}

impl Quantifier {
    /// Interpreta o operador textual; `None` se desconhecido.
    pub fn parse(op: Option<&str>) -> Option<Self> {
        match op {
            None | Some("1") => Some(Quantifier::One),
            Some("*") => Some(Quantifier::ZeroOrMore),
            Some("+") => Some(Quantifier::OneOrMore),
            Some("!") => Some(Quantifier::ZeroOccurrence),
            Some(_) => None,
        }
    }

    /// Se o passo obriga o consumo de pelo menos um token.
    pub fn requires_token(&self) -> bool {
        matches!(self, Quantifier::One | Quantifier::OneOrMore)
    }
}

/// Passo compilado: conjunção de predicados + quantificador.
#[derive(Debug, Clone)]
pub struct Step {
    pub predicates: Vec<TokenPredicate>,
    pub quantifier: Quantifier,
}

impl Step {
    pub fn matches(&self, token: &Token) -> bool {
        self.predicates.iter().all(|p| p.matches(token))
    }
}

/// Padrão compilado. Imutável depois da carga.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub name: String,
    pub label: String,
    pub steps: Vec<Step>,
    /// Tipos estatísticos que este padrão absorve (via `ent_type_in`).
    pub folds: HashSet<String>,
}

/// Conjunto de padrões compilados mais o relatório de rejeições.
///
/// Construído uma vez na inicialização e passado por referência para cada
/// documento.
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    pub patterns: Vec<Pattern>,
    pub rejected: Vec<Rejection>,
}

impl Ruleset {
    /// Compila uma lista de definições já desserializadas.
    pub fn compile(defs: Vec<PatternDef>) -> Self {
        let mut ruleset = Ruleset::default();
        for (i, def) in defs.into_iter().enumerate() {
            ruleset.push_def(def, i + 1);
        }
        ruleset.report();
        ruleset
    }

    /// Compila um arquivo JSON Lines. Linhas em branco são ignoradas e
    /// linhas que não desserializam viram rejeições.
    pub fn from_jsonl(source: &str) -> Self {
        let mut ruleset = Ruleset::default();
        for (i, line) in source.lines().enumerate() {
            let line_no = i + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<PatternDef>(trimmed) {
                Ok(def) => ruleset.push_def(def, line_no),
                Err(e) => {
                    let label = serde_json::from_str::<serde_json::Value>(trimmed)
                        .ok()
                        .and_then(|v| v.get("label").and_then(|l| l.as_str()).map(String::from));
                    ruleset.rejected.push(Rejection {
                        line: line_no,
                        label,
                        error: PatternError::Malformed {
                            reason: e.to_string(),
                        },
                    });
                }
            }
        }
        ruleset.report();
        ruleset
    }

    /// Lê e compila um arquivo de regras do disco.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RulesetError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| RulesetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_jsonl(&source))
    }

    /// Regras padrão embutidas (e-mail, telefones, habilidades, instituições...).
    pub fn embedded() -> Self {
        Self::from_jsonl(EMBEDDED_RULES)
    }

    /// Rótulos produzidos pelos padrões carregados, sem repetição, em ordem.
    pub fn labels(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.patterns
            .iter()
            .map(|p| p.label.as_str())
            .filter(|l| seen.insert(*l))
            .collect()
    }

    fn push_def(&mut self, def: PatternDef, line: usize) {
        let label = def.label.clone();
        match compile_pattern(def, line) {
            Ok(pattern) => self.patterns.push(pattern),
            Err(error) => self.rejected.push(Rejection {
                line,
                label: Some(label).filter(|l| !l.is_empty()),
                error,
            }),
        }
    }

    fn report(&self) {
        for r in &self.rejected {
            warn!(line = r.line, label = ?r.label, "padrão rejeitado: {}", r.error);
        }
        info!(
            compiled = self.patterns.len(),
            rejected = self.rejected.len(),
            "regras carregadas"
        );
    }
}

/// Compila uma única definição.
pub fn compile_pattern(def: PatternDef, line: usize) -> Result<Pattern, PatternError> {
    let label = def.label.trim().to_string();
    if label.is_empty() {
        return Err(PatternError::EmptyLabel);
    }
    if def.pattern.is_empty() {
        return Err(PatternError::NoSteps);
    }

    let mut steps = Vec::with_capacity(def.pattern.len());
    let mut folds = HashSet::new();

    for (i, step_def) in def.pattern.into_iter().enumerate() {
        let step_no = i + 1;
        let quantifier = Quantifier::parse(step_def.op.as_deref()).ok_or_else(|| {
            PatternError::UnknownOperator {
                step: step_no,
                op: step_def.op.clone().unwrap_or_default(),
            }
        })?;

        let mut predicates = Vec::new();
        if let Some(words) = step_def.lower_in {
            let set = non_empty_set(words, step_no, "lower_in", true)?;
            predicates.push(TokenPredicate::LowerIn(set));
        }
        if let Some(pattern) = step_def.text_regex {
            predicates.push(TokenPredicate::TextRegex(build_regex(&pattern, step_no)?));
        }
        if let Some(pattern) = step_def.lower_regex {
            predicates.push(TokenPredicate::LowerRegex(build_regex(&pattern, step_no)?));
        }
        if let Some(flag) = step_def.is_alpha {
            predicates.push(TokenPredicate::IsAlpha(flag));
        }
        if let Some(flag) = step_def.is_stop {
            predicates.push(TokenPredicate::IsStop(flag));
        }
        if let Some(types) = step_def.ent_type_in {
            let set = non_empty_set(types, step_no, "ent_type_in", false)?;
            folds.extend(set.iter().cloned());
            predicates.push(TokenPredicate::EntTypeIn(set));
        }

        if predicates.is_empty() {
            return Err(PatternError::EmptyStep { step: step_no });
        }
        steps.push(Step {
            predicates,
            quantifier,
        });
    }

    if !steps.iter().any(|s| s.quantifier.requires_token()) {
        return Err(PatternError::MatchesEmpty);
    }

    let name = def.name.unwrap_or_else(|| format!("{}#{}", label, line));
    Ok(Pattern {
        name,
        label,
        steps,
        folds,
    })
}

fn non_empty_set(
    values: Vec<String>,
    step: usize,
    field: &str,
    lowercase: bool,
) -> Result<HashSet<String>, PatternError> {
    let set: HashSet<String> = values
        .into_iter()
        .map(|v| if lowercase { v.to_lowercase() } else { v })
        .collect();
    if set.is_empty() {
        return Err(PatternError::EmptySet {
            step,
            field: field.to_string(),
        });
    }
    Ok(set)
}

fn build_regex(pattern: &str, step: usize) -> Result<Regex, PatternError> {
    Regex::new(pattern).map_err(|e| PatternError::BadRegex {
        step,
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_valid_pattern() {
        let rules = Ruleset::from_jsonl(
            r#"{"label": "SKILL", "pattern": [{"lower_in": ["Rust", "python"]}]}"#,
        );
        assert!(rules.rejected.is_empty());
        assert_eq!(rules.patterns.len(), 1);
        let p = &rules.patterns[0];
        assert_eq!(p.label, "SKILL");
        assert_eq!(p.name, "SKILL#1");
        assert!(p.steps[0].matches(&Token::new("RUST", 0)));
        assert_eq!(p.steps[0].quantifier, Quantifier::One);
    }

    #[test]
    fn test_bad_entries_rejected_individually() {
        let source = r#"
{"label": "A", "pattern": [{"text_regex": "("}]}
{"label": "B", "pattern": [{"lower_in": []}]}
{"label": "C", "pattern": [{"is_alpha": true, "op": "?"}]}
{"label": "D", "pattern": [{"op": "+"}]}
{"label": "E", "pattern": [{"is_alpha": true, "op": "*"}]}
{"label": "F", "pattern": [{"colour": "red"}]}
not json at all
{"label": "", "pattern": [{"is_alpha": true}]}
{"label": "G", "pattern": []}
{"label": "OK", "pattern": [{"is_alpha": true, "op": "+"}]}
"#;
        let rules = Ruleset::from_jsonl(source);
        assert_eq!(rules.patterns.len(), 1);
        assert_eq!(rules.patterns[0].label, "OK");
        assert_eq!(rules.rejected.len(), 9);

        let kinds: Vec<&PatternError> = rules.rejected.iter().map(|r| &r.error).collect();
        assert!(matches!(kinds[0], PatternError::BadRegex { step: 1, .. }));
        assert!(matches!(kinds[1], PatternError::EmptySet { .. }));
        assert!(matches!(kinds[2], PatternError::UnknownOperator { .. }));
        assert!(matches!(kinds[3], PatternError::EmptyStep { step: 1 }));
        assert!(matches!(kinds[4], PatternError::MatchesEmpty));
        assert!(matches!(kinds[5], PatternError::Malformed { .. }));
        assert_eq!(rules.rejected[5].label.as_deref(), Some("F"));
        assert!(matches!(kinds[6], PatternError::Malformed { .. }));
        assert!(matches!(kinds[7], PatternError::EmptyLabel));
        assert!(matches!(kinds[8], PatternError::NoSteps));
        // Linha 1 é a quebra inicial da string
        assert_eq!(rules.rejected[0].line, 2);
    }

    #[test]
    fn test_ent_type_steps_record_folds() {
        let rules = Ruleset::from_jsonl(
            r#"{"label": "LOCATION", "pattern": [{"ent_type_in": ["GPE", "LOC"], "op": "+"}]}"#,
        );
        let folds = &rules.patterns[0].folds;
        assert!(folds.contains("GPE") && folds.contains("LOC"));
    }

    #[test]
    fn test_missing_entity_type_is_false() {
        let pred = TokenPredicate::EntTypeIn(["GPE".to_string()].into_iter().collect());
        assert!(!pred.matches(&Token::new("Paris", 0)));
    }

    #[test]
    fn test_embedded_rules_compile_cleanly() {
        let rules = Ruleset::embedded();
        assert!(rules.rejected.is_empty(), "{:?}", rules.rejected);
        let labels = rules.labels();
        for expected in ["EMAIL", "MOBILE", "SKILL", "EDUCATIONAL_INSTITUTION", "LOCATION", "LANGUAGE", "LINKEDIN", "GITHUB"] {
            assert!(labels.contains(&expected), "faltando {}", expected);
        }
    }

    #[test]
    fn test_compile_from_defs() {
        let defs = vec![PatternDef {
            label: "DEGREE".into(),
            name: Some("degree_bachelor".into()),
            pattern: vec![StepDef {
                lower_in: Some(vec!["bachelor".into()]),
                ..Default::default()
            }],
        }];
        let rules = Ruleset::compile(defs);
        assert_eq!(rules.patterns[0].name, "degree_bachelor");
    }
}
