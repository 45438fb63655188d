//! # Pipeline de Extração: Orquestrador com Eventos Observáveis
//!
//! Conecta tokenizador, reconhecedor, matcher, canonicalizador e localizador
//! de destaques. Cada passo pode ser emitido como evento via um canal
//! `mpsc`, permitindo que o servidor WebSocket transmita o progresso em
//! tempo real.
//!
//! O conjunto de regras e a configuração são imutáveis e compartilhados; todo
//! estado mutável (spans, registros, palavras-chave) é local a cada chamada.

use std::sync::mpsc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::canonical::{Canonical, Canonicalizer, DisplayEntity, KeywordSet, RecordSet, SpanDecision};
use crate::config::ExtractorConfig;
use crate::error::LayoutError;
use crate::highlight::{collect_regions, HighlightRegion, Layout};
use crate::matcher::find_spans;
use crate::pattern::Ruleset;
use crate::recognizer::{annotate, EntityRecognizer, GazetteerRecognizer};
use crate::span::Span;
use crate::token::Token;
use crate::tokenizer::tokenize;

/// Eventos emitidos pelo pipeline durante o processamento de um documento.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: tokens prontos (já com tipos estatísticos).
    TokenizationDone { tokens: Vec<Token>, total: usize },
    /// **Passo 2**: um span produzido por regra ou pelo reconhecedor.
    SpanMatched { span: Span },
    /// **Passo 3**: decisão do canonicalizador para um span.
    EntityDecision { decision: SpanDecision },
    /// **Passo 4**: uma palavra a destacar.
    HighlightFound { region: HighlightRegion },
    /// **Conclusão**: registros para exibição e destaques.
    Done {
        entities: Vec<DisplayEntity>,
        keywords: Vec<String>,
        highlights: Vec<HighlightRegion>,
        total_tokens: usize,
        processing_ms: u64,
    },
    /// **Falha**: layout estruturalmente inválido.
    Error { message: String },
}

/// Resultado completo da extração de um documento.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// Rótulo → valores unidos pelo separador (visível externamente).
    pub entities: Vec<DisplayEntity>,
    pub records: RecordSet,
    pub keywords: KeywordSet,
    pub highlights: Vec<HighlightRegion>,
    pub spans: Vec<Span>,
    pub decisions: Vec<SpanDecision>,
}

/// Documento de entrada: texto normalizado e layout de palavras.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInput {
    pub text: String,
    #[serde(default)]
    pub layout: Layout,
}

/// Processa um documento já tokenizado e anotado.
///
/// Função livre do núcleo: recebe o conjunto de regras e o canonicalizador
/// por referência e não guarda estado entre chamadas.
pub fn process(
    ruleset: &Ruleset,
    canonicalizer: &Canonicalizer,
    tokens: &[Token],
    layout: &Layout,
) -> Result<Extraction, LayoutError> {
    layout.validate()?;

    let spans = find_spans(ruleset, tokens);
    let Canonical {
        records,
        keywords,
        decisions,
    } = canonicalizer.canonicalize(&spans);
    let highlights = collect_regions(&keywords, layout);
    let entities = records.display(&canonicalizer.config().display_separator);

    Ok(Extraction {
        entities,
        records,
        keywords,
        highlights,
        spans,
        decisions,
    })
}

/// O pipeline de extração de perfis.
///
/// Construído uma vez na inicialização; `&self` em todos os métodos, então
/// pode ser compartilhado entre threads sem travas.
pub struct ProfilePipeline {
    ruleset: Ruleset,
    canonicalizer: Canonicalizer,
    recognizer: Box<dyn EntityRecognizer>,
}

impl ProfilePipeline {
    /// Regras embutidas, configuração padrão e gazetteers em inglês.
    pub fn new() -> Self {
        Self::with_parts(
            Ruleset::embedded(),
            ExtractorConfig::default(),
            Box::new(GazetteerRecognizer::english()),
        )
    }

    pub fn with_parts(ruleset: Ruleset, config: ExtractorConfig, recognizer: Box<dyn EntityRecognizer>) -> Self {
        Self {
            ruleset,
            canonicalizer: Canonicalizer::new(config),
            recognizer,
        }
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    pub fn config(&self) -> &ExtractorConfig {
        self.canonicalizer.config()
    }

    /// Tokeniza e anota o texto com o reconhecedor configurado.
    pub fn prepare_tokens(&self, text: &str) -> Vec<Token> {
        let tokens = tokenize(text);
        let spans = self.recognizer.recognize(&tokens);
        annotate(tokens, &spans)
    }

    /// Extrai a partir de tokens anotados por um reconhecedor externo.
    pub fn extract_tokens(&self, tokens: &[Token], layout: &Layout) -> Result<Extraction, LayoutError> {
        let start = Instant::now();
        let extraction = process(&self.ruleset, &self.canonicalizer, tokens, layout)?;
        info!(
            tokens = tokens.len(),
            spans = extraction.spans.len(),
            labels = extraction.entities.len(),
            keywords = extraction.keywords.len(),
            highlights = extraction.highlights.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "documento processado"
        );
        Ok(extraction)
    }

    /// Extrai a partir do texto bruto.
    pub fn extract_text(&self, text: &str, layout: &Layout) -> Result<Extraction, LayoutError> {
        let tokens = self.prepare_tokens(text);
        self.extract_tokens(&tokens, layout)
    }

    /// Processa vários documentos em paralelo; cada um falha isoladamente.
    pub fn extract_batch(&self, docs: &[DocumentInput]) -> Vec<Result<Extraction, LayoutError>> {
        docs.par_iter()
            .map(|doc| self.extract_text(&doc.text, &doc.layout))
            .collect()
    }

    /// Executa o pipeline enviando eventos de progresso.
    ///
    /// # Fluxo de Eventos
    /// 1. `TokenizationDone`
    /// 2. `SpanMatched` (um por span, na ordem final)
    /// 3. `EntityDecision` (um por span)
    /// 4. `HighlightFound` (um por região)
    /// 5. `Done`, ou `Error` se o layout for inválido
    pub fn extract_streaming(&self, tokens: Vec<Token>, layout: &Layout, tx: mpsc::Sender<PipelineEvent>) {
        let start = Instant::now();
        let total = tokens.len();
        let _ = tx.send(PipelineEvent::TokenizationDone {
            tokens: tokens.clone(),
            total,
        });

        let extraction = match self.extract_tokens(&tokens, layout) {
            Ok(extraction) => extraction,
            Err(e) => {
                let _ = tx.send(PipelineEvent::Error { message: e.to_string() });
                return;
            }
        };

        for span in &extraction.spans {
            let _ = tx.send(PipelineEvent::SpanMatched { span: span.clone() });
        }
        for decision in &extraction.decisions {
            let _ = tx.send(PipelineEvent::EntityDecision {
                decision: decision.clone(),
            });
        }
        for region in &extraction.highlights {
            let _ = tx.send(PipelineEvent::HighlightFound { region: *region });
        }

        let _ = tx.send(PipelineEvent::Done {
            entities: extraction.entities,
            keywords: extraction.keywords.iter().map(String::from).collect(),
            highlights: extraction.highlights,
            total_tokens: total,
            processing_ms: start.elapsed().as_millis() as u64,
        });
    }
}

impl Default for ProfilePipeline {
    fn default() -> Self {
        Self::new()
    }
}
