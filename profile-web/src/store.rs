//! Armazenamento em memória dos perfis extraídos e busca por habilidade.

use profile_core::{DisplayEntity, Extraction};
use serde::Serialize;

/// Perfil guardado após uma extração bem-sucedida.
#[derive(Debug, Clone, Serialize)]
pub struct StoredProfile {
    pub document: String,
    pub entities: Vec<DisplayEntity>,
}

impl StoredProfile {
    fn field(&self, label: &str) -> Option<&str> {
        self.entities
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.text.as_str())
    }
}

/// Linha do resultado de busca.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub document: String,
    pub skills: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    profiles: Vec<StoredProfile>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guarda o perfil; reenviar o mesmo documento substitui o anterior.
    pub fn insert(&mut self, document: &str, extraction: &Extraction) {
        let profile = StoredProfile {
            document: document.to_string(),
            entities: extraction.entities.clone(),
        };
        match self.profiles.iter_mut().find(|p| p.document == document) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Documentos cujo texto de `SKILL` contém `skill` (sem distinção de
    /// maiúsculas). Consulta vazia ou só com espaços não devolve nada.
    pub fn search(&self, skill: &str) -> Vec<SearchHit> {
        let needle = skill.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.profiles
            .iter()
            .filter(|p| {
                p.field("SKILL")
                    .map(|s| s.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .map(|p| SearchHit {
                document: p.document.clone(),
                skills: p.field("SKILL").map(String::from),
                name: p.field("NAME").map(String::from),
                email: p.field("EMAIL").map(String::from),
                mobile: p.field("MOBILE").map(String::from),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extraction(entities: &[(&str, &str)]) -> Extraction {
        Extraction {
            entities: entities
                .iter()
                .map(|(label, text)| DisplayEntity {
                    label: label.to_string(),
                    text: text.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_search_case_insensitive_substring() {
        let mut store = DocumentStore::new();
        store.insert(
            "alice.pdf",
            &extraction(&[("NAME", "Alice smith"), ("SKILL", "Python,    Machine learning"), ("EMAIL", "a@x.io")]),
        );
        store.insert("bob.pdf", &extraction(&[("NAME", "Bob"), ("SKILL", "Java")]));
        store.insert("carol.pdf", &extraction(&[("NAME", "Carol")]));

        let hits = store.search("LEARN");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document, "alice.pdf");
        assert_eq!(hits[0].name.as_deref(), Some("Alice smith"));
        assert_eq!(hits[0].email.as_deref(), Some("a@x.io"));
        assert_eq!(hits[0].mobile, None);

        // Consulta vazia não busca nada
        assert!(store.search("").is_empty());
        assert!(store.search("  ").is_empty());
    }

    #[test]
    fn test_reinsert_replaces() {
        let mut store = DocumentStore::new();
        store.insert("cv.pdf", &extraction(&[("SKILL", "Java")]));
        store.insert("cv.pdf", &extraction(&[("SKILL", "Rust")]));
        assert_eq!(store.len(), 1);
        assert!(store.search("java").is_empty());
        assert_eq!(store.search("rust").len(), 1);
    }
}
