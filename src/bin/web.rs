//! Shifu Web 后端
//!
//! 启动: cargo run --bin shifu-web --features web
//! 默认监听 http://127.0.0.1:8000

#![cfg(feature = "web")]

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shifu::config::{load_config, AppConfig};
use shifu::content::{ContentStore, KnowledgeItem, Question, QuestionType, Subject, Topic};
use shifu::llm::create_llm_from_config;
use shifu::session::{create_session_store, GradeLevel, Message, Phase, Session};
use shifu::Tutor;

struct AppState {
    tutor: Tutor,
    content: Arc<ContentStore>,
}

type SharedState = Arc<AppState>;

#[derive(Deserialize)]
struct CreateSessionRequest {
    #[serde(default = "default_student")]
    student_id: String,
    subject: Subject,
}

fn default_student() -> String {
    "default_student".to_string()
}

#[derive(Serialize)]
struct CreateSessionResponse {
    session_id: String,
    subject: Subject,
    welcome_message: String,
}

#[derive(Deserialize)]
struct ChatRequest {
    session_id: String,
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    session_id: String,
    response: String,
    state: Phase,
    grade: GradeLevel,
    is_question: bool,
    question: Option<Question>,
    mastered: bool,
}

#[derive(Deserialize)]
struct QuestionFilter {
    subject: Option<Subject>,
    topic_id: Option<String>,
    question_type: Option<QuestionType>,
    difficulty: Option<u8>,
}

#[derive(Deserialize)]
struct KnowledgeFilter {
    subject: Option<Subject>,
    topic_id: Option<String>,
    tag: Option<String>,
}

#[derive(Serialize)]
struct SubjectInfo {
    id: Subject,
    name: &'static str,
    icon: &'static str,
    question_count: usize,
    knowledge_count: usize,
}

fn subject_icon(subject: Subject) -> &'static str {
    match subject {
        Subject::Chinese => "📖",
        Subject::Math => "📐",
        Subject::English => "🌍",
        Subject::History => "🏛️",
        Subject::Politics => "⚖️",
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn create_session(
    State(state): State<SharedState>,
    Json(req): Json<CreateSessionRequest>,
) -> Json<CreateSessionResponse> {
    let session = state.tutor.create_session(&req.student_id, req.subject).await;
    let welcome_message = session
        .messages
        .last()
        .map(|m| m.content.clone())
        .unwrap_or_default();
    Json(CreateSessionResponse {
        session_id: session.id,
        subject: req.subject,
        welcome_message,
    })
}

async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, StatusCode> {
    match state.tutor.load_session(&id).await {
        Some(session) => Ok(Json(session)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn get_messages(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, StatusCode> {
    match state.tutor.load_session(&id).await {
        Some(session) => Ok(Json(session.messages)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn chat(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, StatusCode> {
    let Some(mut session) = state.tutor.load_session(&req.session_id).await else {
        return Err(StatusCode::NOT_FOUND);
    };

    let result = state.tutor.handle_turn(&mut session, &req.message).await;

    Ok(Json(ChatResponse {
        session_id: session.id,
        response: result.response,
        state: result.phase,
        grade: result.grade,
        is_question: result.is_question,
        question: result.question,
        mastered: result.mastered,
    }))
}

async fn list_subjects(State(state): State<SharedState>) -> Json<Vec<SubjectInfo>> {
    let subjects = Subject::ALL
        .iter()
        .map(|&subject| SubjectInfo {
            id: subject,
            name: subject.display_name(),
            icon: subject_icon(subject),
            question_count: state.content.question_count(subject),
            knowledge_count: state.content.knowledge_count(subject),
        })
        .collect();
    Json(subjects)
}

async fn list_topics(
    State(state): State<SharedState>,
    Path(subject): Path<String>,
) -> Result<Json<Vec<Topic>>, StatusCode> {
    let Some(subject) = Subject::parse(&subject) else {
        return Err(StatusCode::BAD_REQUEST);
    };
    Ok(Json(state.content.topics_for_subject(subject)))
}

async fn list_questions(
    State(state): State<SharedState>,
    Query(filter): Query<QuestionFilter>,
) -> Json<Vec<Question>> {
    let mut questions = state.content.all_questions();
    if let Some(subject) = filter.subject {
        questions.retain(|q| q.subject == subject);
    }
    if let Some(topic_id) = &filter.topic_id {
        questions.retain(|q| &q.topic_id == topic_id);
    }
    if let Some(question_type) = filter.question_type {
        questions.retain(|q| q.question_type == question_type);
    }
    if let Some(difficulty) = filter.difficulty {
        questions.retain(|q| q.difficulty == difficulty);
    }
    Json(questions)
}

async fn list_knowledge(
    State(state): State<SharedState>,
    Query(filter): Query<KnowledgeFilter>,
) -> Json<Vec<KnowledgeItem>> {
    let mut items = state.content.all_knowledge();
    if let Some(subject) = filter.subject {
        items.retain(|k| k.subject == subject);
    }
    if let Some(topic_id) = &filter.topic_id {
        items.retain(|k| &k.topic_id == topic_id);
    }
    if let Some(tag) = &filter.tag {
        items.retain(|k| k.tags.contains(tag));
    }
    Json(items)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("config load failed: {}, using defaults", e);
        AppConfig::default()
    });

    let content = Arc::new(ContentStore::with_preset());
    let sessions = create_session_store(cfg.app.session_db.as_deref());
    let llm = create_llm_from_config(&cfg);
    let tutor = Tutor::new(content.clone(), sessions, llm, &cfg);
    let state = Arc::new(AppState { tutor, content });

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/messages", get(get_messages))
        .route("/api/chat", post(chat))
        .route("/api/subjects", get(list_subjects))
        .route("/api/subjects/:subject/topics", get(list_topics))
        .route("/api/questions", get(list_questions))
        .route("/api/knowledge", get(list_knowledge))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = "127.0.0.1:8000";
    tracing::info!("shifu-web listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
