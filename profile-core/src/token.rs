//! # Modelo de Token
//!
//! O `Token` é a visão imutável de atributos que o restante do núcleo lê.
//! Ele é produzido inteiramente pelos colaboradores externos (tokenizador e
//! reconhecedor estatístico); o motor de padrões apenas consulta seus campos.
//!
//! ## Atributos
//!
//! | Campo       | Uso no motor de padrões                        |
//! |-------------|------------------------------------------------|
//! | `text`      | regex sobre o texto cru                        |
//! | `lower`     | pertinência a conjunto, regex em minúsculas    |
//! | `is_alpha`  | teste alfabético                               |
//! | `is_stop`   | teste de stopword                              |
//! | `ent_type`  | pertinência do tipo estatístico                |

use serde::{Deserialize, Serialize};

use crate::stopwords::is_stop_word;

/// Posição do token dentro de uma entidade estatística (esquema IOB).
///
/// Permite distinguir duas entidades adjacentes do mesmo tipo:
/// `Nova(B-GPE) York(I-GPE) Londres(B-GPE)` → dois spans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntIob {
    /// Primeiro token de uma entidade.
    Begin,
    /// Continuação da entidade anterior.
    Inside,
    /// Fora de qualquer entidade.
    #[default]
    Outside,
}

/// Um token do documento com seus atributos derivados.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Texto cru (ex: "Acme", "alice@example.com").
    pub text: String,
    /// Texto em minúsculas, pré-calculado.
    pub lower: String,
    /// Índice de byte inicial no texto original (0 quando desconhecido).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista (0, 1, 2...).
    pub index: usize,
    /// Verdadeiro se todos os caracteres forem letras.
    pub is_alpha: bool,
    /// Verdadeiro se a forma minúscula for uma stopword.
    pub is_stop: bool,
    /// Tipo estatístico atribuído pelo reconhecedor externo, se houver.
    pub ent_type: Option<String>,
    /// Posição IOB do tipo estatístico.
    pub ent_iob: EntIob,
    /// Se o token era seguido de espaço no texto original.
    pub space_after: bool,
}

impl Token {
    /// Cria um token sem tipo estatístico, derivando os atributos do texto.
    pub fn new(text: impl Into<String>, index: usize) -> Self {
        let text = text.into();
        let lower = text.to_lowercase();
        let is_alpha = !text.is_empty() && text.chars().all(char::is_alphabetic);
        let is_stop = is_stop_word(&lower);
        Self {
            text,
            lower,
            start: 0,
            end: 0,
            index,
            is_alpha,
            is_stop,
            ent_type: None,
            ent_iob: EntIob::Outside,
            space_after: true,
        }
    }

    /// Define os offsets de byte no texto original.
    pub fn with_offsets(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_space_after(mut self, space_after: bool) -> Self {
        self.space_after = space_after;
        self
    }

    /// Anexa o tipo estatístico e a posição IOB.
    ///
    /// `EntIob::Outside` descarta o tipo: um token fora de entidade nunca
    /// carrega tipo.
    pub fn with_entity(mut self, ent_type: impl Into<String>, iob: EntIob) -> Self {
        if iob == EntIob::Outside {
            self.ent_type = None;
        } else {
            self.ent_type = Some(ent_type.into());
        }
        self.ent_iob = iob;
        self
    }
}

/// Reconstrói o texto de um trecho de tokens respeitando `space_after`.
///
/// O espaço do último token nunca é incluído.
pub fn join_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        out.push_str(&token.text);
        if token.space_after && i + 1 < tokens.len() {
            out.push(' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_derived() {
        let t = Token::new("The", 0);
        assert_eq!(t.lower, "the");
        assert!(t.is_alpha);
        assert!(t.is_stop);
        assert!(t.ent_type.is_none());

        let t = Token::new("123-456-7890", 1);
        assert!(!t.is_alpha);
        assert!(!t.is_stop);
    }

    #[test]
    fn test_outside_drops_type() {
        let t = Token::new("Paris", 0).with_entity("GPE", EntIob::Outside);
        assert!(t.ent_type.is_none());
        let t = Token::new("Paris", 0).with_entity("GPE", EntIob::Begin);
        assert_eq!(t.ent_type.as_deref(), Some("GPE"));
    }

    #[test]
    fn test_join_tokens_spacing() {
        let tokens = vec![
            Token::new("Acme", 0),
            Token::new("Inc", 1).with_space_after(false),
            Token::new(".", 2),
        ];
        assert_eq!(join_tokens(&tokens), "Acme Inc.");
        assert_eq!(join_tokens(&[]), "");
    }
}
