//! # Canonicalização de Entidades
//!
//! Transforma a lista de spans no conjunto final de registros por rótulo e
//! no conjunto de palavras-chave usado para os destaques.
//!
//! ## Regras por rótulo
//!
//! 1. Rótulos fora da lista aceita são ignorados.
//! 2. Remapeamento: `PERSON` → `NAME`, `GPE`/`LOC` → `LOCATION`.
//! 3. Rótulos literais (telefone, e-mail, perfis) passam sem alteração.
//! 4. Os demais perdem todo caractere que não seja letra ou espaço e são
//!    capitalizados ("ACME University" → "Acme university").
//! 5. `EMAIL` precisa ter o formato `local@dominio.tld`.
//! 6. Deduplicação sem distinção de maiúsculas, preservando a ordem de
//!    inserção. `NAME` guarda apenas o primeiro valor aceito.
//!
//! Toda atualização de registros passa por [`absorb`], o único lugar onde a
//! regra "palavras-chave só na primeira inserção" é aplicada.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ExtractorConfig;
use crate::span::Span;
use crate::stopwords::is_stop_word;

/// Rótulo que guarda no máximo um valor por documento.
pub const NAME_LABEL: &str = "NAME";
/// Rótulo validado pelo formato de e-mail.
pub const EMAIL_LABEL: &str = "EMAIL";

static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").expect("EMAIL_SHAPE regex is invalid")
});

/// Valores distintos de um rótulo, em ordem de inserção.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub label: String,
    pub values: Vec<String>,
}

impl EntityRecord {
    fn contains_ignore_case(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.values.iter().any(|v| v.to_lowercase() == lower)
    }
}

/// Conjunto de registros de um documento: rótulo → valores.
///
/// Os rótulos ficam na ordem em que receberam o primeiro valor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    records: Vec<EntityRecord>,
}

/// Valor exibido de um rótulo: lista unida pelo separador.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayEntity {
    pub label: String,
    pub text: String,
}

impl RecordSet {
    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.records
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.values.as_slice())
    }

    pub fn records(&self) -> &[EntityRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Um item por rótulo com pelo menos um valor.
    pub fn display(&self, separator: &str) -> Vec<DisplayEntity> {
        self.records
            .iter()
            .filter(|r| !r.values.is_empty())
            .map(|r| DisplayEntity {
                label: r.label.clone(),
                text: r.values.join(separator),
            })
            .collect()
    }
}

/// Palavras minúsculas, sem stopwords, dos valores aceitos.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet(BTreeSet<String>);

impl KeywordSet {
    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    fn extend_from(&mut self, text: &str) {
        for piece in text.split_whitespace() {
            let lower = piece.to_lowercase();
            if !is_stop_word(&lower) {
                self.0.insert(lower);
            }
        }
    }
}

impl FromIterator<String> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// O que aconteceu com um span durante a canonicalização.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Valor novo, adicionado ao registro e às palavras-chave.
    Appended,
    /// Já existia (sem distinção de maiúsculas).
    Duplicate,
    /// `NAME` já tinha valor; o primeiro vence.
    NameAlreadySet,
    /// Falhou na validação de e-mail.
    InvalidEmail,
    /// Nada restou depois da limpeza.
    EmptyAfterCleaning,
    /// Rótulo fora da lista aceita.
    LabelNotAccepted,
}

impl Decision {
    pub fn accepted(&self) -> bool {
        *self == Decision::Appended
    }
}

/// Decisão tomada para um span, com o rótulo e o texto finais.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanDecision {
    pub label: String,
    pub text: String,
    pub decision: Decision,
}

/// Atualização pura do conjunto de registros.
///
/// Recebe o estado atual e devolve o novo estado, sem efeitos colaterais:
/// - `NAME` já preenchido → descarta sem checar duplicidade;
/// - valor igual (sem distinção de maiúsculas) a um existente → inalterado;
/// - caso contrário anexa ao rótulo e adiciona suas palavras às
///   palavras-chave.
pub fn absorb(
    mut records: RecordSet,
    mut keywords: KeywordSet,
    label: &str,
    text: &str,
) -> (RecordSet, KeywordSet, Decision) {
    let decision = match records.records.iter_mut().find(|r| r.label == label) {
        Some(record) if label == NAME_LABEL && !record.values.is_empty() => Decision::NameAlreadySet,
        Some(record) if record.contains_ignore_case(text) => Decision::Duplicate,
        Some(record) => {
            record.values.push(text.to_string());
            Decision::Appended
        }
        None => {
            records.records.push(EntityRecord {
                label: label.to_string(),
                values: vec![text.to_string()],
            });
            Decision::Appended
        }
    };
    if decision.accepted() {
        keywords.extend_from(text);
    }
    (records, keywords, decision)
}

/// Remove tudo que não é letra ou espaço, normaliza espaços e capitaliza.
pub fn clean_text(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    capitalize(&collapsed)
}

/// Primeira letra maiúscula, restante minúsculo.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
    }
}

pub fn is_valid_email(text: &str) -> bool {
    EMAIL_SHAPE.is_match(text)
}

/// Resultado da canonicalização de um documento.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Canonical {
    pub records: RecordSet,
    pub keywords: KeywordSet,
    pub decisions: Vec<SpanDecision>,
}

/// Aplica as regras de limpeza, validação e deduplicação.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    config: ExtractorConfig,
}

impl Canonicalizer {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Canonicaliza os spans na ordem recebida.
    pub fn canonicalize(&self, spans: &[Span]) -> Canonical {
        let mut records = RecordSet::default();
        let mut keywords = KeywordSet::default();
        let mut decisions = Vec::with_capacity(spans.len());

        for span in spans {
            let (label, text, decision) = match self.prepare(span) {
                Ok((label, text)) => {
                    let (r, k, decision) = absorb(records, keywords, &label, &text);
                    records = r;
                    keywords = k;
                    (label, text, decision)
                }
                Err(decision) => (span.label.clone(), span.text.clone(), decision),
            };
            if !decision.accepted() {
                debug!(label = %label, text = %text, ?decision, "span não aceito");
            }
            decisions.push(SpanDecision { label, text, decision });
        }

        Canonical {
            records,
            keywords,
            decisions,
        }
    }

    /// Rótulo final e texto limpo, ou o motivo da rejeição.
    fn prepare(&self, span: &Span) -> Result<(String, String), Decision> {
        if !self.config.accepts(&span.label) {
            return Err(Decision::LabelNotAccepted);
        }
        let label = self.config.remap(&span.label).to_string();

        if self.config.is_literal(&label) {
            if label == EMAIL_LABEL && !is_valid_email(&span.text) {
                return Err(Decision::InvalidEmail);
            }
            return Ok((label, span.text.clone()));
        }

        let cleaned = clean_text(&span.text);
        if cleaned.is_empty() {
            return Err(Decision::EmptyAfterCleaning);
        }
        Ok((label, cleaned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SpanOrigin;

    fn span(label: &str, text: &str) -> Span {
        Span {
            label: label.to_string(),
            start: 0,
            end: 1,
            text: text.to_string(),
            origin: SpanOrigin::Statistical,
        }
    }

    fn run(spans: &[Span]) -> Canonical {
        Canonicalizer::default().canonicalize(spans)
    }

    #[test]
    fn test_institution_cleaned_and_capitalized() {
        let out = run(&[span("EDUCATIONAL_INSTITUTION", "Acme University")]);
        assert_eq!(out.records.get("EDUCATIONAL_INSTITUTION").unwrap(), ["Acme university"]);
        assert!(out.keywords.contains("acme"));
        assert!(out.keywords.contains("university"));
    }

    #[test]
    fn test_email_validation() {
        let out = run(&[
            span("EMAIL", "alice@example.com"),
            span("EMAIL", "alice(at)example"),
            span("EMAIL", "bob@localhost"),
        ]);
        assert_eq!(out.records.get("EMAIL").unwrap(), ["alice@example.com"]);
        assert_eq!(out.decisions[1].decision, Decision::InvalidEmail);
        assert_eq!(out.decisions[2].decision, Decision::InvalidEmail);
        assert!(!out.keywords.contains("bob@localhost"));
    }

    #[test]
    fn test_phone_kept_verbatim() {
        let out = run(&[span("MOBILE", "123-456-7890")]);
        assert_eq!(out.records.get("MOBILE").unwrap(), ["123-456-7890"]);
        assert!(out.keywords.contains("123-456-7890"));
    }

    #[test]
    fn test_profile_urls_not_case_folded() {
        let out = run(&[span("GITHUB", "https://github.com/Alice")]);
        assert_eq!(out.records.get("GITHUB").unwrap(), ["https://github.com/Alice"]);
    }

    #[test]
    fn test_name_first_wins() {
        let out = run(&[
            span("PERSON", "John Smith"),
            span("PERSON", "Jane Doe"),
            span("PERSON", "JOHN SMITH"),
        ]);
        assert_eq!(out.records.get("NAME").unwrap(), ["John smith"]);
        assert_eq!(out.decisions[1].decision, Decision::NameAlreadySet);
        assert_eq!(out.decisions[2].decision, Decision::NameAlreadySet);
        // Nome descartado não contribui palavras-chave
        assert!(!out.keywords.contains("jane"));
        assert!(out.keywords.contains("john"));
    }

    #[test]
    fn test_case_insensitive_dedup_preserves_order() {
        let out = run(&[
            span("SKILL", "Python"),
            span("SKILL", "rust"),
            span("SKILL", "PYTHON"),
            span("SKILL", "Rust!"),
        ]);
        assert_eq!(out.records.get("SKILL").unwrap(), ["Python", "Rust"]);
        assert_eq!(out.decisions[2].decision, Decision::Duplicate);
    }

    #[test]
    fn test_remap_locations_and_unaccepted_labels() {
        let out = run(&[
            span("GPE", "Paris"),
            span("LOC", "paris"),
            span("NORP", "French"),
            span("DATE", "2020"),
        ]);
        assert_eq!(out.records.get("LOCATION").unwrap(), ["Paris"]);
        assert_eq!(out.decisions[2].decision, Decision::LabelNotAccepted);
        assert!(out.records.get("NORP").is_none());
    }

    #[test]
    fn test_empty_after_cleaning_dropped() {
        let out = run(&[span("SKILL", "++ 42")]);
        assert!(out.records.is_empty());
        assert_eq!(out.decisions[0].decision, Decision::EmptyAfterCleaning);
        assert!(out.keywords.is_empty());
    }

    #[test]
    fn test_keywords_drop_stopwords() {
        let out = run(&[span("EDUCATIONAL_INSTITUTION", "University of Delhi")]);
        let words: Vec<&str> = out.keywords.iter().collect();
        assert_eq!(words, vec!["delhi", "university"]);
    }

    #[test]
    fn test_keyword_subset_law() {
        let spans = [
            span("PERSON", "Mary Jones"),
            span("PERSON", "Other Person"),
            span("SKILL", "Machine Learning"),
            span("SKILL", "machine learning"),
            span("EMAIL", "not-an-email"),
            span("ORG", "The Acme Corp."),
        ];
        let out = run(&spans);
        let appended_words: BTreeSet<String> = out
            .records
            .records()
            .iter()
            .flat_map(|r| r.values.iter())
            .flat_map(|v| v.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>())
            .collect();
        for kw in out.keywords.iter() {
            assert_eq!(kw, kw.to_lowercase());
            assert!(!is_stop_word(kw));
            assert!(appended_words.contains(kw), "{} sem origem", kw);
        }
    }

    #[test]
    fn test_duplicate_adds_no_new_keywords() {
        // Duplicatas são iguais sem distinção de maiúsculas, então estender as
        // palavras-chave em toda ocorrência daria o mesmo conjunto.
        let (r, k, _) = absorb(RecordSet::default(), KeywordSet::default(), "SKILL", "Data Science");
        let (r2, k2, d) = absorb(r.clone(), k.clone(), "SKILL", "DATA SCIENCE");
        assert_eq!(d, Decision::Duplicate);
        assert_eq!(r, r2);
        assert_eq!(k, k2);
    }

    #[test]
    fn test_display_join() {
        let out = run(&[span("SKILL", "Python"), span("SKILL", "Sql")]);
        let display = out.records.display(",    ");
        assert_eq!(display.len(), 1);
        assert_eq!(display[0].text, "Python,    Sql");
    }

    #[test]
    fn test_empty_input() {
        let out = run(&[]);
        assert!(out.records.is_empty());
        assert!(out.keywords.is_empty());
        assert!(out.records.display(",").is_empty());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("aCME"), "Acme");
        assert_eq!(capitalize(""), "");
        assert_eq!(clean_text("  C++ / Java  "), "C java");
    }
}
