use crate::answer::QuestionAnswerer;
use crate::cache::ExtractionCache;
use crate::config::Config;
use crate::engine::{Extraction, OcrEngine};
use crate::engines::EngineRegistry;
use crate::error::PixiError;
use crate::language::Language;
use crate::llm::GroqClient;
use crate::translate::Translator;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Upload types the pipeline accepts
const ACCEPTED_MIME_TYPES: [&str; 2] = ["image/png", "image/jpeg"];
const ACCEPTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engines: Arc<EngineRegistry>,
    pub translator: Arc<Translator>,
    pub answerer: Arc<QuestionAnswerer>,
    pub cache: Arc<ExtractionCache>,
    pub config: Arc<Config>,
}

/// Extraction response
#[derive(Serialize)]
pub struct ExtractResponse {
    pub text: String,
    pub confidence: f32,
    pub engine: String,
    pub cached: bool,
    pub processing_time_ms: u64,
    pub warnings: Vec<String>,
}

/// Translation request
#[derive(Deserialize)]
pub struct TranslateBody {
    pub text: String,
    pub language: String,
}

/// Translation response; `translation` is null when the sentinel was selected
#[derive(Serialize)]
pub struct TranslateResponse {
    pub language: String,
    pub translation: Option<String>,
    pub model: String,
}

/// Question request
#[derive(Deserialize)]
pub struct AnswerBody {
    pub text: String,
    pub question: String,
}

/// Question response
#[derive(Serialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub model: String,
}

/// One full interaction: extract, then the optional branches
#[derive(Serialize)]
pub struct PipelineResponse {
    pub text: String,
    pub confidence: f32,
    pub cached: bool,
    pub translation: Option<TranslationBlock>,
    pub answer: Option<String>,
    pub warnings: Vec<String>,
    pub processing_time_ms: u64,
}

#[derive(Serialize)]
pub struct TranslationBlock {
    pub language: String,
    pub content: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub model: String,
    pub translation_languages: Vec<String>,
    pub default_engine: String,
    pub available_engines: Vec<EngineBody>,
    pub supported_formats: Vec<String>,
    pub max_file_size_bytes: usize,
}

#[derive(Serialize)]
pub struct EngineBody {
    pub name: String,
    pub description: String,
    pub supported_formats: Vec<String>,
    pub supported_languages: Vec<String>,
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let engines = EngineRegistry::new(&config)?;

    let model = Arc::new(
        GroqClient::new(config.groq_api_key.clone(), config.model.clone())
            .with_base_url(config.llm_base_url.clone()),
    );

    let addr = format!("{}:{}", config.host, config.port);
    let max_file_size = config.max_file_size;

    let state = AppState {
        engines: Arc::new(engines),
        translator: Arc::new(Translator::new(model.clone())),
        answerer: Arc::new(QuestionAnswerer::new(model)),
        cache: Arc::new(ExtractionCache::new()),
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/extract", post(handle_extract))
        .route("/extract/:engine", post(handle_extract_with))
        .route("/translate", post(handle_translate))
        .route("/answer", post(handle_answer))
        .route("/pipeline", post(handle_pipeline))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Fields of one interaction's multipart form
#[derive(Default)]
struct InteractionForm {
    file: Option<Bytes>,
    filename: Option<String>,
    content_type: Option<String>,
    language: Option<String>,
    question: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<InteractionForm, PixiError> {
    let mut form = InteractionForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PixiError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                form.content_type = field.content_type().map(|s| s.to_string());
                form.filename = field.file_name().map(|s| s.to_string());
                form.file = Some(field.bytes().await.map_err(|e| {
                    PixiError::InvalidRequest(format!("Failed to read file data: {}", e))
                })?);
            }
            "language" => {
                form.language = Some(field.text().await.map_err(|e| {
                    PixiError::InvalidRequest(format!("Invalid language field: {}", e))
                })?);
            }
            "question" => {
                form.question = Some(field.text().await.map_err(|e| {
                    PixiError::InvalidRequest(format!("Invalid question field: {}", e))
                })?);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    Ok(form)
}

/// Enforce the png/jpg/jpeg upload boundary
fn check_upload(form: &InteractionForm, max_file_size: usize) -> Result<Bytes, PixiError> {
    let data = form.file.clone().ok_or(PixiError::MissingFile)?;

    if data.len() > max_file_size {
        return Err(PixiError::ImageTooLarge {
            size: data.len(),
            max: max_file_size,
        });
    }

    if let Some(mime) = form.content_type.as_deref() {
        if ACCEPTED_MIME_TYPES.contains(&mime) {
            return Ok(data);
        }
    }

    if let Some(name) = form.filename.as_deref() {
        let ext = std::path::Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        if let Some(ext) = ext {
            if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
                return Ok(data);
            }
        }
    }

    let described = form
        .content_type
        .clone()
        .or_else(|| form.filename.clone())
        .unwrap_or_else(|| "unknown".to_string());
    Err(PixiError::UnsupportedFormat(described))
}

/// Decode and OCR the upload, going through the memo cache first
fn run_extraction(
    state: &AppState,
    engine: &Arc<dyn OcrEngine>,
    data: &[u8],
) -> Result<(Extraction, bool), PixiError> {
    let key = ExtractionCache::key(data);

    if let Some(hit) = state.cache.get(&key) {
        tracing::debug!("Extraction cache hit");
        return Ok((hit, true));
    }

    let image = image::load_from_memory(data)
        .map_err(|e| PixiError::Extraction(format!("failed to decode image: {}", e)))?;

    let extraction = engine.extract(&image)?;
    state.cache.insert(key, extraction.clone());

    Ok((extraction, false))
}

fn default_engine(state: &AppState) -> Result<Arc<dyn OcrEngine>, PixiError> {
    state
        .engines
        .default()
        .ok_or_else(|| PixiError::Internal("no OCR engine available".to_string()))
}

/// Handle extraction requests
async fn handle_extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, PixiError> {
    let engine = default_engine(&state)?;
    extract_with_engine(state, engine, multipart).await
}

/// Handle extraction requests pinned to a named engine
async fn handle_extract_with(
    State(state): State<AppState>,
    Path(engine_name): Path<String>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, PixiError> {
    let engine = state
        .engines
        .get(&engine_name)
        .ok_or_else(|| PixiError::InvalidRequest(format!("Unknown engine: {}", engine_name)))?;
    extract_with_engine(state, engine, multipart).await
}

async fn extract_with_engine(
    state: AppState,
    engine: Arc<dyn OcrEngine>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, PixiError> {
    let start = Instant::now();

    let form = read_form(multipart).await?;
    let data = check_upload(&form, state.config.max_file_size)?;

    let (extraction, cached) = run_extraction(&state, &engine, &data)?;

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "Extraction completed in {}ms, confidence: {:.2}, text length: {}, cached: {}",
        processing_time_ms,
        extraction.confidence,
        extraction.text.len(),
        cached
    );

    Ok(Json(ExtractResponse {
        text: extraction.text,
        confidence: extraction.confidence,
        engine: engine.name().to_string(),
        cached,
        processing_time_ms,
        warnings: extraction.warnings,
    }))
}

/// Handle translation requests
async fn handle_translate(
    State(state): State<AppState>,
    Json(body): Json<TranslateBody>,
) -> Result<Json<TranslateResponse>, PixiError> {
    let language = Language::from_str(&body.language)?;

    let translation = state.translator.translate(&body.text, language).await?;

    Ok(Json(TranslateResponse {
        language: language.to_string(),
        translation: translation.map(|t| t.content),
        model: state.config.model.clone(),
    }))
}

/// Handle question requests
async fn handle_answer(
    State(state): State<AppState>,
    Json(body): Json<AnswerBody>,
) -> Result<Json<AnswerResponse>, PixiError> {
    if body.question.trim().is_empty() {
        return Err(PixiError::EmptyQuestion);
    }

    let answer = state.answerer.answer(&body.text, &body.question).await?;

    Ok(Json(AnswerResponse {
        answer,
        model: state.config.model.clone(),
    }))
}

/// Handle one full interaction: extract, then translate and answer as asked.
/// The two branches are independent; either may be skipped.
async fn handle_pipeline(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PipelineResponse>, PixiError> {
    let start = Instant::now();

    let form = read_form(multipart).await?;
    let data = check_upload(&form, state.config.max_file_size)?;

    let engine = default_engine(&state)?;
    let (extraction, cached) = run_extraction(&state, &engine, &data)?;
    let mut warnings = extraction.warnings.clone();

    let language = match form.language.as_deref() {
        Some(raw) => Language::from_str(raw)?,
        None => Language::None,
    };

    let translation = state
        .translator
        .translate(&extraction.text, language)
        .await?
        .map(|t| TranslationBlock {
            language: t.language.to_string(),
            content: t.content,
        });

    let answer = match form.question.as_deref() {
        Some(question) if question.trim().is_empty() => {
            warnings.push(PixiError::EmptyQuestion.to_string());
            None
        }
        Some(question) => Some(state.answerer.answer(&extraction.text, question).await?),
        None => None,
    };

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "Pipeline completed in {}ms (cached: {}, translated: {}, answered: {})",
        processing_time_ms,
        cached,
        translation.is_some(),
        answer.is_some()
    );

    Ok(Json(PipelineResponse {
        text: extraction.text,
        confidence: extraction.confidence,
        cached,
        translation,
        answer,
        warnings,
        processing_time_ms,
    }))
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.config.model.clone(),
        translation_languages: Language::CHOICES.iter().map(|l| l.to_string()).collect(),
        default_engine: state.engines.default_name().to_string(),
        available_engines: state
            .engines
            .info()
            .into_iter()
            .map(|e| EngineBody {
                name: e.name.to_string(),
                description: e.description.to_string(),
                supported_formats: e.supported_formats,
                supported_languages: e.supported_languages,
            })
            .collect(),
        supported_formats: ACCEPTED_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
        max_file_size_bytes: state.config.max_file_size,
    })
}
