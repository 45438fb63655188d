//! # Interpretador de Padrões
//!
//! Varre a sequência de tokens contra cada padrão compilado, da esquerda
//! para a direita, e une os spans de regra aos spans estatísticos.
//!
//! ## Algoritmo por posição inicial
//!
//! 1. `one`: o token atual precisa satisfazer o passo; avança um.
//! 2. `*` / `+`: consome a maior sequência possível (guloso, sem
//!    backtracking); `+` exige pelo menos um token.
//! 3. `!`: se o próximo token existir e satisfizer o passo, a tentativa
//!    falha; caso contrário segue sem consumir nada.
//!
//! Ao casar, emite o span e recomeça logo depois dele (sem sobreposição
//! dentro do mesmo padrão). Ao falhar, avança um token. Nenhum padrão sem
//! ocorrências é erro.

use std::cmp::Reverse;

use tracing::debug;

use crate::pattern::{Pattern, Quantifier, Ruleset};
use crate::span::{statistical_spans, Span, SpanOrigin};
use crate::token::Token;

/// Tenta casar `pattern` a partir de `start`. Retorna o fim (exclusivo).
pub fn match_at(pattern: &Pattern, tokens: &[Token], start: usize) -> Option<usize> {
    let mut pos = start;
    for step in &pattern.steps {
        match step.quantifier {
            Quantifier::One => {
                if pos < tokens.len() && step.matches(&tokens[pos]) {
                    pos += 1;
                } else {
                    return None;
                }
            }
            Quantifier::ZeroOrMore => {
                while pos < tokens.len() && step.matches(&tokens[pos]) {
                    pos += 1;
                }
            }
            Quantifier::OneOrMore => {
                let run_start = pos;
                while pos < tokens.len() && step.matches(&tokens[pos]) {
                    pos += 1;
                }
                if pos == run_start {
                    return None;
                }
            }
            Quantifier::ZeroOccurrence => {
                if pos < tokens.len() && step.matches(&tokens[pos]) {
                    return None;
                }
            }
        }
    }
    // Padrões compilados sempre consomem algo; a guarda evita spans vazios
    (pos > start).then_some(pos)
}

/// Todas as ocorrências não sobrepostas de um padrão.
pub fn scan(pattern: &Pattern, tokens: &[Token]) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match match_at(pattern, tokens, i) {
            Some(end) => {
                spans.push(Span::over(
                    tokens,
                    i,
                    end,
                    &pattern.label,
                    SpanOrigin::Rule {
                        pattern: pattern.name.clone(),
                    },
                ));
                i = end;
            }
            None => i += 1,
        }
    }
    spans
}

/// Entre spans de regra do mesmo rótulo que se sobrepõem, mantém só o mais
/// longo. No empate vence o que começa antes e, depois, o padrão listado
/// primeiro. Rótulos diferentes nunca competem entre si.
fn keep_longest(mut candidates: Vec<(Span, usize)>) -> Vec<(Span, usize)> {
    candidates.sort_by_key(|(span, rank)| (Reverse(span.len()), span.start, *rank));

    let mut kept: Vec<(Span, usize)> = Vec::with_capacity(candidates.len());
    for (span, rank) in candidates {
        let shadowed = kept
            .iter()
            .any(|(other, _)| other.label == span.label && other.overlaps(&span));
        if shadowed {
            debug!(label = %span.label, text = %span.text, "span de regra sobreposto por outro mais longo");
            continue;
        }
        kept.push((span, rank));
    }
    kept
}

/// Produz a lista final de spans do documento.
///
/// Spans de regra do mesmo rótulo que se sobrepõem são reduzidos ao mais
/// longo. Em seguida, spans de regra e estatísticos são unidos: um span
/// estatístico inteiramente coberto por um span de regra cujo padrão absorve
/// o seu tipo (`ent_type_in`) é incorporado ao span de regra em vez de
/// duplicado.
///
/// A ordem é determinística: início crescente, fim decrescente, regra antes
/// de estatístico e, no empate, a ordem dos padrões no conjunto.
pub fn find_spans(ruleset: &Ruleset, tokens: &[Token]) -> Vec<Span> {
    // (span, ordem do padrão; estatísticos vêm depois de todos)
    let mut candidates: Vec<(Span, usize)> = Vec::new();
    for (rank, pattern) in ruleset.patterns.iter().enumerate() {
        for span in scan(pattern, tokens) {
            debug!(pattern = %pattern.name, start = span.start, end = span.end, text = %span.text, "padrão casou");
            candidates.push((span, rank));
        }
    }
    let mut ranked = keep_longest(candidates);

    let folding: Vec<(&Span, &Pattern)> = ranked
        .iter()
        .map(|(span, rank)| (span, &ruleset.patterns[*rank]))
        .filter(|(_, pattern)| !pattern.folds.is_empty())
        .collect();
    let remaining: Vec<Span> = statistical_spans(tokens)
        .into_iter()
        .filter(|span| {
            let folded = folding
                .iter()
                .any(|(rule, pattern)| rule.covers(span) && pattern.folds.contains(&span.label));
            if folded {
                debug!(label = %span.label, text = %span.text, "span estatístico absorvido por regra");
            }
            !folded
        })
        .collect();

    let stat_rank = ruleset.patterns.len();
    ranked.extend(remaining.into_iter().map(|span| (span, stat_rank)));
    ranked.sort_by_key(|(span, rank)| (span.start, Reverse(span.end), span.is_statistical(), *rank));
    ranked.into_iter().map(|(span, _)| span).collect()
}
