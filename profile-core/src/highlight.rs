//! # Localizador de Destaques
//!
//! Mapeia o conjunto de palavras-chave de volta para as palavras de cada
//! página. Cada palavra cujo texto minúsculo pertence ao conjunto gera uma
//! região própria: palavras adjacentes nunca são fundidas em uma frase.

use serde::{Deserialize, Serialize};

use crate::canonical::KeywordSet;
use crate::error::LayoutError;

/// Retângulo delimitador em coordenadas da página.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    fn is_valid(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1].iter().all(|v| v.is_finite())
            && self.x0 <= self.x1
            && self.y0 <= self.y1
    }
}

/// Uma palavra extraída do layout, com sua geometria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Número da página (1-based).
    pub page: usize,
    pub text: String,
    pub rect: Rect,
}

/// Palavras de uma página, na ordem de leitura do extrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub number: usize,
    #[serde(default)]
    pub words: Vec<Word>,
}

/// Layout completo do documento.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub page_count: usize,
    #[serde(default)]
    pub pages: Vec<Page>,
}

/// Região a destacar: uma por palavra encontrada.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighlightRegion {
    pub page: usize,
    pub rect: Rect,
}

impl Layout {
    /// Verifica a estrutura: páginas dentro de `1..=page_count`, em ordem
    /// estritamente crescente, palavras na página certa e geometria válida.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut previous = 0;
        for page in &self.pages {
            if page.number == 0 || page.number > self.page_count {
                return Err(LayoutError::PageOutOfRange {
                    page: page.number,
                    page_count: self.page_count,
                });
            }
            if page.number <= previous {
                return Err(LayoutError::PageOutOfOrder {
                    page: page.number,
                    previous,
                });
            }
            previous = page.number;

            for (i, word) in page.words.iter().enumerate() {
                if word.page != page.number {
                    return Err(LayoutError::WordPageMismatch {
                        page: page.number,
                        word: i,
                        declared: word.page,
                    });
                }
                if !word.rect.is_valid() {
                    return Err(LayoutError::InvalidGeometry {
                        page: page.number,
                        word: i,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Encontra as regiões a destacar, em ordem de página e depois de palavra.
pub fn locate(keywords: &KeywordSet, layout: &Layout) -> Result<Vec<HighlightRegion>, LayoutError> {
    layout.validate()?;
    Ok(collect_regions(keywords, layout))
}

/// Mesma busca de [`locate`], sobre um layout que já passou por
/// [`Layout::validate`].
pub(crate) fn collect_regions(keywords: &KeywordSet, layout: &Layout) -> Vec<HighlightRegion> {
    if keywords.is_empty() {
        return Vec::new();
    }
    layout
        .pages
        .iter()
        .flat_map(|page| page.words.iter())
        .filter(|word| keywords.contains(&word.text.to_lowercase()))
        .map(|word| HighlightRegion {
            page: word.page,
            rect: word.rect,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(page: usize, text: &str, x: f64) -> Word {
        Word {
            page,
            text: text.to_string(),
            rect: Rect::new(x, 10.0, x + 20.0, 20.0),
        }
    }

    fn keywords(words: &[&str]) -> KeywordSet {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_one_region_per_word() {
        let layout = Layout {
            page_count: 1,
            pages: vec![Page {
                number: 1,
                words: vec![word(1, "Acme", 0.0), word(1, "University", 30.0)],
            }],
        };
        let regions = locate(&keywords(&["acme", "university"]), &layout).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].rect, Rect::new(0.0, 10.0, 20.0, 20.0));
        assert_eq!(regions[1].rect, Rect::new(30.0, 10.0, 50.0, 20.0));
        assert!(regions.iter().all(|r| r.page == 1));
    }

    #[test]
    fn test_page_then_word_order_and_repeats() {
        let layout = Layout {
            page_count: 3,
            pages: vec![
                Page { number: 1, words: vec![word(1, "Rust", 0.0), word(1, "and", 30.0), word(1, "RUST", 60.0)] },
                Page { number: 2, words: vec![] },
                Page { number: 3, words: vec![word(3, "rust", 5.0)] },
            ],
        };
        let regions = locate(&keywords(&["rust"]), &layout).unwrap();
        let pages: Vec<usize> = regions.iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![1, 1, 3]);
        assert_eq!(regions[1].rect.x0, 60.0);
    }

    #[test]
    fn test_empty_inputs() {
        let layout = Layout { page_count: 2, pages: vec![] };
        assert!(locate(&keywords(&["rust"]), &layout).unwrap().is_empty());

        let layout = Layout {
            page_count: 1,
            pages: vec![Page { number: 1, words: vec![word(1, "Rust", 0.0)] }],
        };
        assert!(locate(&KeywordSet::default(), &layout).unwrap().is_empty());
    }

    #[test]
    fn test_structural_errors() {
        let out_of_range = Layout {
            page_count: 1,
            pages: vec![Page { number: 2, words: vec![] }],
        };
        assert!(matches!(
            locate(&keywords(&["x"]), &out_of_range),
            Err(LayoutError::PageOutOfRange { page: 2, page_count: 1 })
        ));

        let out_of_order = Layout {
            page_count: 2,
            pages: vec![Page { number: 2, words: vec![] }, Page { number: 1, words: vec![] }],
        };
        assert!(matches!(
            out_of_order.validate(),
            Err(LayoutError::PageOutOfOrder { page: 1, previous: 2 })
        ));

        let mismatch = Layout {
            page_count: 2,
            pages: vec![Page { number: 1, words: vec![word(2, "x", 0.0)] }],
        };
        assert!(matches!(
            mismatch.validate(),
            Err(LayoutError::WordPageMismatch { declared: 2, .. })
        ));

        let mut bad = word(1, "x", 0.0);
        bad.rect = Rect::new(10.0, 0.0, 5.0, 1.0);
        let inverted = Layout {
            page_count: 1,
            pages: vec![Page { number: 1, words: vec![bad] }],
        };
        assert!(matches!(
            inverted.validate(),
            Err(LayoutError::InvalidGeometry { page: 1, word: 0 })
        ));
    }

    #[test]
    fn test_collect_regions_matches_locate() {
        let layout = Layout {
            page_count: 2,
            pages: vec![
                Page { number: 1, words: vec![word(1, "Rust", 0.0), word(1, "and", 30.0)] },
                Page { number: 2, words: vec![word(2, "rust", 0.0)] },
            ],
        };
        let kw = keywords(&["rust"]);
        assert_eq!(collect_regions(&kw, &layout), locate(&kw, &layout).unwrap());
        assert_eq!(collect_regions(&kw, &layout).len(), 2);
        assert!(collect_regions(&KeywordSet::default(), &layout).is_empty());
    }

    #[test]
    fn test_highlight_soundness() {
        let kw = keywords(&["python", "delhi"]);
        let words = vec![
            word(1, "Python", 0.0),
            word(1, "of", 10.0),
            word(1, "Delhi", 20.0),
            word(1, "python", 30.0),
            word(1, "Java", 40.0),
        ];
        let layout = Layout {
            page_count: 1,
            pages: vec![Page { number: 1, words: words.clone() }],
        };
        let regions = locate(&kw, &layout).unwrap();
        let expected: Vec<Rect> = words
            .iter()
            .filter(|w| kw.contains(&w.text.to_lowercase()))
            .map(|w| w.rect)
            .collect();
        let got: Vec<Rect> = regions.iter().map(|r| r.rect).collect();
        assert_eq!(got, expected);
    }
}
