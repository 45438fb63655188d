//! # Spans
//!
//! Um span é um trecho contíguo de tokens com um único rótulo, vindo de um
//! padrão de regra ou do reconhecedor estatístico. Spans são efêmeros:
//! produzidos pelo matcher e consumidos pelo canonicalizador.

use serde::{Deserialize, Serialize};

use crate::token::{join_tokens, EntIob, Token};

/// Origem de um span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpanOrigin {
    /// Produzido por um padrão compilado (nome do padrão).
    Rule { pattern: String },
    /// Lido dos tipos estatísticos dos tokens.
    Statistical,
}

/// Representa um span (intervalo) de tokens com uma label associada.
///
/// # Exemplo
/// Em "John works at Acme University", o span "Acme University":
/// `Span { label: "EDUCATIONAL_INSTITUTION", start: 3, end: 5, .. }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Rótulo da entidade (ex: "EMAIL", "PERSON")
    pub label: String,
    /// Índice do token inicial (inclusivo)
    pub start: usize,
    /// Índice do token final (exclusivo)
    pub end: usize,
    /// Texto de origem reconstruído a partir dos tokens
    pub text: String,
    pub origin: SpanOrigin,
}

impl Span {
    /// Cria um span sobre `tokens[start..end]`. O chamador garante os limites.
    pub fn over(tokens: &[Token], start: usize, end: usize, label: &str, origin: SpanOrigin) -> Self {
        Self {
            label: label.to_string(),
            start,
            end,
            text: join_tokens(&tokens[start..end]),
            origin,
        }
    }

    pub fn is_statistical(&self) -> bool {
        self.origin == SpanOrigin::Statistical
    }

    /// Se este span contém inteiramente `other`.
    pub fn covers(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Se os dois intervalos compartilham pelo menos um token.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Lê os spans estatísticos já presentes nos tokens.
///
/// Máquina de estados IOB:
/// - `Begin` abre um novo span.
/// - `Inside` do mesmo tipo continua o span aberto; de outro tipo (ou sem
///   span aberto) é tratado como `Begin`.
/// - `Outside` fecha o span aberto.
pub fn statistical_spans(tokens: &[Token]) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut open: Option<(usize, &str)> = None;

    for (i, token) in tokens.iter().enumerate() {
        let ent = token.ent_type.as_deref();
        let continues = match (open, token.ent_iob, ent) {
            (Some((_, label)), EntIob::Inside, Some(t)) => label == t,
            _ => false,
        };
        if continues {
            continue;
        }
        if let Some((start, label)) = open.take() {
            spans.push(Span::over(tokens, start, i, label, SpanOrigin::Statistical));
        }
        if let (Some(t), EntIob::Begin | EntIob::Inside) = (ent, token.ent_iob) {
            open = Some((i, t));
        }
    }

    // Fecha último span se aberto
    if let Some((start, label)) = open {
        spans.push(Span::over(tokens, start, tokens.len(), label, SpanOrigin::Statistical));
    }

    spans
}
