//! Servidor web Axum para extração de perfis, com busca por habilidade e
//! streaming dos eventos do pipeline via WebSocket.
//!
//! ## Variáveis de ambiente
//!
//! | Variável         | Padrão          | Uso                                  |
//! |------------------|-----------------|--------------------------------------|
//! | `PROFILE_BIND`   | `0.0.0.0:3000`  | Endereço do servidor                 |
//! | `PROFILE_RULES`  | regras embutidas| Arquivo JSONL de padrões             |
//! | `PROFILE_CONFIG` | padrão          | JSON com `ExtractorConfig`           |
//! | `RUST_LOG`       | `info`          | Filtro do `tracing`                  |

mod store;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use profile_core::{
    ExtractorConfig, GazetteerRecognizer, Layout, PipelineEvent, ProfilePipeline, Ruleset, Token,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::store::DocumentStore;

/// Estado compartilhado da aplicação
struct AppState {
    pipeline: ProfilePipeline,
    store: RwLock<DocumentStore>,
}

/// Documento a extrair: texto bruto ou tokens já anotados.
#[derive(Deserialize)]
struct ExtractRequest {
    #[serde(default)]
    document: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    tokens: Option<Vec<Token>>,
    #[serde(default)]
    layout: Layout,
}

impl ExtractRequest {
    fn into_tokens(self, pipeline: &ProfilePipeline) -> Option<(Vec<Token>, Layout)> {
        match (self.tokens, self.text) {
            (Some(tokens), _) => Some((tokens, self.layout)),
            (None, Some(text)) if !text.trim().is_empty() => Some((pipeline.prepare_tokens(&text), self.layout)),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ExtractResponse {
    document: String,
    entities: Vec<profile_core::DisplayEntity>,
    keywords: Vec<String>,
    highlights: Vec<profile_core::HighlightRegion>,
    total_tokens: usize,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    skill: String,
}

#[derive(Serialize)]
struct RulesResponse<'a> {
    labels: Vec<&'a str>,
    patterns: usize,
    rejected: &'a [profile_core::Rejection],
}

fn load_pipeline() -> anyhow::Result<ProfilePipeline> {
    let ruleset = match std::env::var("PROFILE_RULES") {
        Ok(path) => Ruleset::from_path(&path).with_context(|| format!("carregando regras de {path}"))?,
        Err(_) => Ruleset::embedded(),
    };
    let config = match std::env::var("PROFILE_CONFIG") {
        Ok(path) => ExtractorConfig::from_path(&path).with_context(|| format!("carregando configuração de {path}"))?,
        Err(_) => ExtractorConfig::default(),
    };
    Ok(ProfilePipeline::with_parts(
        ruleset,
        config,
        Box::new(GazetteerRecognizer::english()),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let pipeline = load_pipeline()?;
    info!(
        patterns = pipeline.ruleset().patterns.len(),
        rejected = pipeline.ruleset().rejected.len(),
        "pipeline pronto"
    );
    let state = Arc::new(AppState {
        pipeline,
        store: RwLock::new(DocumentStore::new()),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/extract", post(extract_handler))
        .route("/search", get(search_handler))
        .route("/rules", get(rules_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state);

    let bind = std::env::var("PROFILE_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind em {bind}"))?;
    info!("🚀 Servidor de perfis iniciado em http://{}", bind);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Extração via HTTP POST; o resultado fica disponível para busca.
async fn extract_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExtractRequest>,
) -> impl IntoResponse {
    let document = req.document.clone().unwrap_or_else(|| "documento".to_string());
    let Some((tokens, layout)) = req.into_tokens(&state.pipeline) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Informe `text` ou `tokens`"})),
        )
            .into_response();
    };

    let worker = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || {
        let total = tokens.len();
        worker.pipeline.extract_tokens(&tokens, &layout).map(|e| (e, total))
    })
    .await;

    match result {
        Ok(Ok((extraction, total_tokens))) => {
            state.store.write().await.insert(&document, &extraction);
            Json(ExtractResponse {
                document,
                entities: extraction.entities,
                keywords: extraction.keywords.iter().map(String::from).collect(),
                highlights: extraction.highlights,
                total_tokens,
            })
            .into_response()
        }
        Ok(Err(e)) => {
            warn!(document = %document, error = %e, "layout rejeitado");
            (StatusCode::UNPROCESSABLE_ENTITY, Json(serde_json::json!({ "error": e }))).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// Busca de documentos por habilidade
async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let hits = state.store.read().await.search(&query.skill);
    Json(hits)
}

/// Rótulos carregados e relatório de padrões rejeitados
async fn rules_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let ruleset = state.pipeline.ruleset();
    let body = serde_json::to_value(RulesResponse {
        labels: ruleset.labels(),
        patterns: ruleset.patterns.len(),
        rejected: &ruleset.rejected,
    })
    .unwrap_or_default();
    Json(body)
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Recebe um documento (JSON ou texto puro), executa o pipeline e envia os
/// eventos em ordem.
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let req = serde_json::from_str::<ExtractRequest>(&text).unwrap_or(ExtractRequest {
                    document: None,
                    text: Some(text.to_string()),
                    tokens: None,
                    layout: Layout::default(),
                });
                let Some((tokens, layout)) = req.into_tokens(&state.pipeline) else {
                    continue;
                };

                info!(tokens = tokens.len(), "extraindo via WebSocket");

                let (tx, rx) = std::sync::mpsc::channel::<PipelineEvent>();
                let worker = Arc::clone(&state);
                let handle = tokio::task::spawn_blocking(move || {
                    worker.pipeline.extract_streaming(tokens, &layout, tx);
                });
                handle.await.ok();

                // Coleta os eventos numa Vec (o Receiver não é Send)
                let events: Vec<PipelineEvent> = rx.try_iter().collect();
                for event in &events {
                    if let Ok(json) = serde_json::to_string(event) {
                        if socket.send(Message::Text(json)).await.is_err() {
                            return; // cliente desconectou
                        }
                    }
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}
