//! # profile-core: Extração de Perfis a partir de Currículos
//!
//! Camada de regras que transforma um documento tokenizado em um perfil
//! estruturado (nome, e-mail, telefone, habilidades, formação, locais) e
//! indica quais palavras destacar no documento original.
//!
//! ## Arquitetura do Sistema
//!
//! O dado flui em linha reta, um documento por vez:
//!
//! 1.  **Tokenização** ([`tokenizer`]): texto → [`Token`]s com offsets e atributos.
//! 2.  **Reconhecimento** ([`recognizer`]): tipos estatísticos (PERSON, GPE...)
//!     anotados nos tokens. Pode ser substituído por um serviço externo.
//! 3.  **Compilação de Padrões** ([`pattern`]): regras JSONL → [`Ruleset`],
//!     uma única vez na inicialização.
//! 4.  **Matching** ([`matcher`]): spans de regra + spans estatísticos.
//! 5.  **Canonicalização** ([`canonical`]): registros por rótulo e
//!     palavras-chave.
//! 6.  **Destaques** ([`highlight`]): palavras-chave → retângulos por página.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use profile_core::{Layout, ProfilePipeline};
//!
//! let pipeline = ProfilePipeline::new();
//! let text = "Jane Doe, jane@example.com. Skills: Python, SQL.";
//! let extraction = pipeline.extract_text(text, &Layout::default()).unwrap();
//!
//! for entity in &extraction.entities {
//!     println!("{}: {}", entity.label, entity.text);
//! }
//! ```

pub mod canonical;
pub mod config;
pub mod error;
pub mod highlight;
pub mod matcher;
pub mod pattern;
pub mod pipeline;
pub mod recognizer;
pub mod span;
pub mod stopwords;
pub mod token;
pub mod tokenizer;

pub use canonical::{Canonicalizer, Decision, DisplayEntity, KeywordSet, RecordSet};
pub use config::ExtractorConfig;
pub use error::{ConfigError, LayoutError, PatternError, Rejection, RulesetError};
pub use highlight::{HighlightRegion, Layout, Page, Rect, Word};
pub use pattern::{PatternDef, Ruleset};
pub use pipeline::{DocumentInput, Extraction, PipelineEvent, ProfilePipeline};
pub use recognizer::{EntityRecognizer, GazetteerRecognizer, NoopRecognizer};
pub use span::{Span, SpanOrigin};
pub use token::{EntIob, Token};
