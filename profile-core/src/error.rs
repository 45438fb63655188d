//! # Erros Tipados do Núcleo
//!
//! Somente duas falhas chegam ao chamador: o relatório de padrões rejeitados
//! (informativo, não bloqueia a carga) e a rejeição de um layout
//! estruturalmente inválido. Todo o resto é absorvido localmente.

use serde::{Deserialize, Serialize};

/// Motivo pelo qual uma definição de padrão foi rejeitada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternError {
    #[error("linha não é uma definição válida: {reason}")]
    Malformed { reason: String },

    #[error("rótulo vazio")]
    EmptyLabel,

    #[error("padrão sem passos")]
    NoSteps,

    #[error("passo {step}: nenhum predicado")]
    EmptyStep { step: usize },

    #[error("passo {step}: conjunto `{field}` vazio")]
    EmptySet { step: usize, field: String },

    #[error("passo {step}: regex inválida `{pattern}`: {reason}")]
    BadRegex {
        step: usize,
        pattern: String,
        reason: String,
    },

    #[error("passo {step}: operador desconhecido `{op}`")]
    UnknownOperator { step: usize, op: String },

    #[error("padrão pode casar um trecho vazio (nenhum passo `1` ou `+`)")]
    MatchesEmpty,
}

/// Uma definição rejeitada, com sua posição no arquivo de regras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    /// Linha (1-based) no arquivo JSONL, ou posição na lista.
    pub line: usize,
    /// Rótulo da definição, quando foi possível lê-lo.
    pub label: Option<String>,
    pub error: PatternError,
}

/// Falha ao ler o arquivo de regras como um todo (E/S).
#[derive(Debug, thiserror::Error)]
pub enum RulesetError {
    #[error("falha ao ler arquivo de regras {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Layout de páginas estruturalmente inválido.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutError {
    #[error("página {page} fora do intervalo 1..={page_count}")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("página {page} aparece depois da página {previous}")]
    PageOutOfOrder { page: usize, previous: usize },

    #[error("palavra {word} declara página {declared} mas está na página {page}")]
    WordPageMismatch {
        page: usize,
        word: usize,
        declared: usize,
    },

    #[error("palavra {word} da página {page} tem geometria inválida")]
    InvalidGeometry { page: usize, word: usize },
}

/// Falha ao carregar a configuração do extrator.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("falha ao ler configuração {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuração inválida: {0}")]
    Parse(#[from] serde_json::Error),
}
