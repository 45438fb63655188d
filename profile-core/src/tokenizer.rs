//! # Tokenizador
//!
//! Divide o texto do documento em tokens, normalizando espaços e quebras de
//! linha. Pontuação de borda (parênteses, aspas, vírgulas, ponto final) vira
//! token próprio; pontuação interna é preservada para que e-mails, URLs,
//! telefones e siglas como "B.Tech" permaneçam inteiros.
//!
//! ## Exemplo
//!
//! `"(alice@example.com), B.Tech."` →
//! `"("`, `"alice@example.com"`, `")"`, `","`, `"B.Tech"`, `"."`

use crate::token::Token;

/// Caracteres destacados do início de uma palavra.
const LEADING: &[char] = &['(', '[', '{', '"', '\'', '\u{201C}', '\u{2018}', '<'];

/// Caracteres destacados do fim de uma palavra.
const TRAILING: &[char] = &[
    ',', '.', ';', ':', ')', ']', '}', '"', '\'', '\u{201D}', '\u{2019}', '!', '?', '>',
];

/// Tokeniza o texto e calcula os atributos de cada token.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (start, end) in chunks(text) {
        let followed_by_space = end < text.len();
        split_chunk(&mut tokens, text, start, end, followed_by_space);
    }

    // Re-indexa os tokens
    for (i, token) in tokens.iter_mut().enumerate() {
        token.index = i;
    }
    tokens
}

/// Intervalos de byte dos trechos separados por espaço.
fn chunks(text: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut current: Option<usize> = None;
    for (pos, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(start) = current.take() {
                out.push((start, pos));
            }
        } else if current.is_none() {
            current = Some(pos);
        }
    }
    if let Some(start) = current {
        out.push((start, text.len()));
    }
    out
}

/// Separa a pontuação de borda de um trecho.
fn split_chunk(tokens: &mut Vec<Token>, text: &str, start: usize, end: usize, space_after: bool) {
    let mut core_start = start;
    let mut core_end = end;
    let mut prefix = Vec::new();
    let mut suffix = Vec::new();

    while let Some(ch) = text[core_start..core_end].chars().next() {
        if !LEADING.contains(&ch) || core_start + ch.len_utf8() >= core_end {
            break;
        }
        prefix.push((core_start, core_start + ch.len_utf8()));
        core_start += ch.len_utf8();
    }
    while let Some(ch) = text[core_start..core_end].chars().next_back() {
        if !TRAILING.contains(&ch) || core_end - ch.len_utf8() <= core_start {
            break;
        }
        suffix.push((core_end - ch.len_utf8(), core_end));
        core_end -= ch.len_utf8();
    }
    suffix.reverse();

    let pieces: Vec<(usize, usize)> = prefix
        .into_iter()
        .chain(std::iter::once((core_start, core_end)))
        .chain(suffix)
        .collect();
    let last = pieces.len() - 1;
    for (i, (s, e)) in pieces.into_iter().enumerate() {
        push_token(tokens, text, s, e, i == last && space_after);
    }
}

/// Adiciona um token com offsets no texto original
fn push_token(tokens: &mut Vec<Token>, text: &str, start: usize, end: usize, space_after: bool) {
    tokens.push(
        Token::new(&text[start..end], 0)
            .with_offsets(start, end)
            .with_space_after(space_after),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_basic() {
        let tokens = tokenize("John Smith works at Acme University.");
        assert_eq!(texts(&tokens), vec!["John", "Smith", "works", "at", "Acme", "University", "."]);
        assert_eq!(tokens[6].index, 6);
        assert!(!tokens[5].space_after);
        assert!(tokens[3].is_stop);
    }

    #[test]
    fn test_keeps_inner_punctuation() {
        let tokens = tokenize("contact alice@example.com or alice(at)example, 123-456-7890");
        assert_eq!(
            texts(&tokens),
            vec!["contact", "alice@example.com", "or", "alice(at)example", ",", "123-456-7890"]
        );
    }

    #[test]
    fn test_brackets_and_offsets() {
        let text = "(B.Tech.) https://github.com/alice/";
        let tokens = tokenize(text);
        assert_eq!(texts(&tokens), vec!["(", "B.Tech", ".", ")", "https://github.com/alice/"]);
        for t in &tokens {
            assert_eq!(&text[t.start..t.end], t.text);
        }
    }

    #[test]
    fn test_newlines_normalized() {
        let tokens = tokenize("Python\n\nRust\tSQL  ");
        assert_eq!(texts(&tokens), vec!["Python", "Rust", "SQL"]);
        assert!(tokens[2].space_after);
    }

    #[test]
    fn test_punctuation_only_chunk() {
        let tokens = tokenize("a -- b ...");
        assert_eq!(texts(&tokens), vec!["a", "--", "b", ".", ".", "."]);
    }

    #[test]
    fn test_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n ").is_empty());
    }
}
