//! # Reconhecedor de Entidades (colaborador externo)
//!
//! O núcleo espera tokens já anotados com um tipo estatístico. Este módulo
//! define a costura [`EntityRecognizer`] e uma implementação simples por
//! gazetteers e gatilhos, suficiente para rodar o pipeline de ponta a ponta
//! sem um serviço de NLP externo.
//!
//! ## Tipos produzidos
//!
//! | Tipo       | Origem                                          |
//! |------------|-------------------------------------------------|
//! | PERSON     | gazetteer de nomes, título ("Dr", "Mr") + nomes |
//! | ORG        | gazetteer de organizações, sufixo ("Inc", "Ltd")|
//! | GPE        | gazetteer de cidades e países                   |
//! | LANGUAGE   | idiomas                                         |
//! | NORP       | nacionalidades                                  |

use crate::span::{Span, SpanOrigin};
use crate::token::{EntIob, Token};

/// Fonte dos tipos estatísticos. Implementações são compartilhadas entre
/// threads e não guardam estado por documento.
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, tokens: &[Token]) -> Vec<Span>;
}

/// Reconhecedor sem entidades (útil quando os tokens já chegam anotados).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecognizer;

impl EntityRecognizer for NoopRecognizer {
    fn recognize(&self, _tokens: &[Token]) -> Vec<Span> {
        Vec::new()
    }
}

/// Reconhecedor por gazetteers e padrões de contexto.
#[derive(Debug, Clone)]
pub struct GazetteerRecognizer {
    /// Nomes de pessoas conhecidas (lowercase, pode ser múltiplas palavras)
    person_names: Vec<Vec<String>>,
    /// Cidades, estados e países (lowercase, pode ser múltiplas palavras)
    location_names: Vec<Vec<String>>,
    /// Organizações conhecidas (lowercase, pode ser múltiplas palavras)
    org_names: Vec<Vec<String>>,
    languages: Vec<String>,
    nationalities: Vec<String>,
    /// Títulos que precedem nomes de pessoas
    person_titles: Vec<String>,
    /// Palavras que indicam organização logo antes
    org_indicators: Vec<String>,
}

fn lower_all(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

fn split_lower(name: &str) -> Vec<String> {
    name.split_whitespace().map(|p| p.to_lowercase()).collect()
}

fn is_capitalized(token: &Token) -> bool {
    token.is_alpha && token.text.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

impl GazetteerRecognizer {
    /// Reconhecedor vazio, apenas com títulos e indicadores de organização.
    pub fn new() -> Self {
        Self {
            person_names: vec![],
            location_names: vec![],
            org_names: vec![],
            languages: vec![],
            nationalities: vec![],
            person_titles: lower_all(&["mr", "mrs", "ms", "miss", "dr", "prof", "sir"]),
            org_indicators: lower_all(&[
                "inc", "ltd", "llc", "llp", "corp", "corporation", "limited", "pvt", "technologies", "gmbh",
            ]),
        }
    }

    /// Listas padrão em inglês para currículos.
    pub fn english() -> Self {
        let mut r = Self::new();
        for place in [
            "India", "United States", "USA", "United Kingdom", "UK", "Canada", "Germany", "France",
            "Australia", "Singapore", "Japan", "New York", "San Francisco", "London", "Berlin",
            "Paris", "Toronto", "Sydney", "Tokyo", "California", "Bangalore", "Bengaluru", "Mumbai",
            "New Delhi", "Delhi", "Pune", "Hyderabad", "Chennai", "Kolkata",
        ] {
            r.add_location(place);
        }
        for lang in [
            "English", "Hindi", "French", "German", "Spanish", "Tamil", "Telugu", "Marathi",
            "Bengali", "Japanese", "Mandarin", "Chinese", "Kannada", "Gujarati",
        ] {
            r.languages.push(lang.to_lowercase());
        }
        for nat in ["Indian", "American", "British", "Canadian", "Australian"] {
            r.nationalities.push(nat.to_lowercase());
        }
        for org in ["Google", "Microsoft", "Amazon", "Infosys", "Tata Consultancy Services", "Wipro", "IBM"] {
            r.add_org(org);
        }
        r
    }

    pub fn add_person(&mut self, name: &str) {
        push_parts(&mut self.person_names, name);
    }

    pub fn add_location(&mut self, name: &str) {
        push_parts(&mut self.location_names, name);
    }

    pub fn add_org(&mut self, name: &str) {
        push_parts(&mut self.org_names, name);
    }

    pub fn add_language(&mut self, name: &str) {
        self.languages.push(name.to_lowercase());
    }
}

fn push_parts(list: &mut Vec<Vec<String>>, name: &str) {
    let parts = split_lower(name);
    if !parts.is_empty() {
        list.push(parts);
        // Mais longos primeiro: "New Delhi" antes de "Delhi"
        list.sort_by_key(|p| std::cmp::Reverse(p.len()));
    }
}

impl Default for GazetteerRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Marca de ocupação por token, para que cada token tenha um só tipo.
struct Occupancy {
    taken: Vec<bool>,
    spans: Vec<Span>,
}

impl Occupancy {
    fn free(&self, start: usize, end: usize) -> bool {
        self.taken[start..end].iter().all(|t| !t)
    }

    fn claim(&mut self, tokens: &[Token], start: usize, end: usize, label: &str) {
        for t in &mut self.taken[start..end] {
            *t = true;
        }
        self.spans.push(Span::over(tokens, start, end, label, SpanOrigin::Statistical));
    }
}

impl EntityRecognizer for GazetteerRecognizer {
    fn recognize(&self, tokens: &[Token]) -> Vec<Span> {
        let mut occ = Occupancy {
            taken: vec![false; tokens.len()],
            spans: Vec::new(),
        };

        // 1. Gazetteers de n-gramas (organização, pessoa, local)
        for (list, label) in [
            (&self.org_names, "ORG"),
            (&self.person_names, "PERSON"),
            (&self.location_names, "GPE"),
        ] {
            let mut i = 0;
            while i < tokens.len() {
                let hit = list.iter().find(|parts| {
                    i + parts.len() <= tokens.len()
                        && parts.iter().enumerate().all(|(j, part)| tokens[i + j].lower == *part)
                        && occ.free(i, i + parts.len())
                });
                match hit {
                    Some(parts) => {
                        occ.claim(tokens, i, i + parts.len(), label);
                        i += parts.len();
                    }
                    None => i += 1,
                }
            }
        }

        // 2. Idiomas e nacionalidades (token único)
        for (i, token) in tokens.iter().enumerate() {
            if !occ.free(i, i + 1) {
                continue;
            }
            if self.languages.contains(&token.lower) {
                occ.claim(tokens, i, i + 1, "LANGUAGE");
            } else if self.nationalities.contains(&token.lower) {
                occ.claim(tokens, i, i + 1, "NORP");
            }
        }

        // 3. Regra de título: "Dr. Jane Doe" → "Jane Doe" é PERSON
        for i in 0..tokens.len() {
            if !self.person_titles.contains(&tokens[i].lower) {
                continue;
            }
            let mut start = i + 1;
            if tokens.get(start).map(|t| t.text == ".").unwrap_or(false) {
                start += 1;
            }
            let mut end = start;
            while end < tokens.len() && end - start < 3 && is_capitalized(&tokens[end]) && occ.free(end, end + 1) {
                end += 1;
            }
            if end > start {
                occ.claim(tokens, start, end, "PERSON");
            }
        }

        // 4. Indicadores de organização: "Acme Labs Inc" → ORG
        for i in 1..tokens.len() {
            if !self.org_indicators.contains(&tokens[i].lower) || !occ.free(i, i + 1) {
                continue;
            }
            let mut start = i;
            while start > 0 && i - start < 3 && is_capitalized(&tokens[start - 1]) && occ.free(start - 1, start) {
                start -= 1;
            }
            if start < i {
                occ.claim(tokens, start, i + 1, "ORG");
            }
        }

        let mut spans = occ.spans;
        spans.sort_by_key(|s| s.start);
        spans
    }
}

/// Escreve os tipos dos spans nos tokens (primeiro token `Begin`, demais
/// `Inside`). Spans que se sobrepõem a tokens já anotados são ignorados.
pub fn annotate(tokens: Vec<Token>, spans: &[Span]) -> Vec<Token> {
    let mut tokens = tokens;
    for span in spans {
        if span.start >= span.end || span.end > tokens.len() {
            continue;
        }
        if tokens[span.start..span.end].iter().any(|t| t.ent_type.is_some()) {
            continue;
        }
        for i in span.start..span.end {
            let iob = if i == span.start { EntIob::Begin } else { EntIob::Inside };
            let token = std::mem::replace(&mut tokens[i], Token::new("", 0));
            tokens[i] = token.with_entity(span.label.clone(), iob);
        }
    }
    tokens
}
