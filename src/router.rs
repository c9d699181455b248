//! The Request Router: the HTTP surface (spec.md §4.4, §6). Handlers
//! inspect ownership, handle requests locally, or forward to the owning
//! peer and proxy its response back verbatim. Structured after
//! `dekaf::registry::build_router`'s `axum::Router` + `.with_state(...)`
//! composition and `internal/broker/broker.go`'s handler bodies.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::error::BrokerError;
use crate::state::BrokerState;
use crate::wire::{
    ConsumeQuery, ConsumeResponse, CreateTopicRequest, CreateTopicResponse,
    InternalCreateTopicRequest, ListTopicsResponse, ProduceRequest, ProduceResponse,
    RegisterSchemaRequest, RegisterSchemaResponse,
};
use crate::{metrics, replication};

pub struct App {
    pub state: BrokerState,
    pub http: reqwest::Client,
}

impl App {
    pub fn new(state: BrokerState) -> Arc<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("building the forwarding HTTP client");
        Arc::new(Self { state, http })
    }
}

pub fn build_router(app: Arc<App>) -> Router<()> {
    Router::new()
        .route("/create-topic", post(create_topic))
        .route("/internal-create-topic", post(internal_create_topic))
        .route("/metadata", get(metadata))
        .route("/list-topics", get(list_topics))
        .route("/register-schema", post(register_schema))
        .route("/produce", post(produce))
        .route("/consume", get(consume))
        .merge(metrics::build_router())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(app)
}

#[tracing::instrument(skip_all, fields(topic = %req.topic))]
async fn create_topic(
    State(app): State<Arc<App>>,
    Json(req): Json<CreateTopicRequest>,
) -> Result<Json<CreateTopicResponse>, BrokerError> {
    if req.topic.is_empty() || req.partitions <= 0 {
        return Err(BrokerError::Input(
            "topic and a positive partition count are required".into(),
        ));
    }
    let partition_count = req.partitions as u32;

    let owners = app.state.compute_owners(partition_count);
    app.state.install_topic(&req.topic, owners.clone());
    tracing::info!(owners = ?owners, "created topic");

    replication::propagate_create_topic(
        &app.http,
        &app.state.address,
        &app.state.peers,
        &req.topic,
        &owners,
    )
    .await;

    Ok(Json(CreateTopicResponse {
        status: "created".to_string(),
    }))
}

#[tracing::instrument(skip_all, fields(topic = %req.topic))]
async fn internal_create_topic(
    State(app): State<Arc<App>>,
    Json(req): Json<InternalCreateTopicRequest>,
) -> Result<StatusCode, BrokerError> {
    if req.topic.is_empty() || req.owners.is_empty() {
        return Err(BrokerError::Input(
            "topic and a non-empty owners list are required".into(),
        ));
    }
    app.state.install_topic(&req.topic, req.owners);
    Ok(StatusCode::OK)
}

async fn metadata(State(app): State<Arc<App>>) -> impl IntoResponse {
    Json(app.state.metadata())
}

async fn list_topics(State(app): State<Arc<App>>) -> impl IntoResponse {
    Json(ListTopicsResponse {
        topics: app.state.list_topics(),
    })
}

#[tracing::instrument(skip_all, fields(topic = %req.topic))]
async fn register_schema(
    State(app): State<Arc<App>>,
    Json(req): Json<RegisterSchemaRequest>,
) -> Result<Json<RegisterSchemaResponse>, BrokerError> {
    app.state.register_schema(&req.topic, req.schema)?;
    Ok(Json(RegisterSchemaResponse {
        status: "schema registered".to_string(),
    }))
}

#[tracing::instrument(skip_all, fields(topic = %req.topic, partition = ?req.partition, key = ?req.key))]
async fn produce(State(app): State<Arc<App>>, Json(req): Json<ProduceRequest>) -> Response {
    match produce_inner(&app, req).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn produce_inner(app: &App, mut req: ProduceRequest) -> Result<Response, BrokerError> {
    let owners = app.state.owners(&req.topic).ok_or(BrokerError::NotFound)?;
    let partition_count = owners.len() as u32;
    if partition_count == 0 {
        return Err(BrokerError::NotFound);
    }

    let partition = app.state.select_partition(
        &req.topic,
        partition_count,
        req.partition,
        req.key.as_deref(),
    )?;
    let owner = owners[partition as usize].clone();

    if owner != app.state.address {
        // Rewrite the request to carry the resolved partition so the
        // owner never re-routes (spec.md §4.4), then proxy its response
        // back verbatim.
        req.partition = Some(partition);
        let url = format!("http://{owner}/produce");
        let resp = app
            .http
            .post(&url)
            .json(&req)
            .send()
            .await
            .map_err(|err| BrokerError::Forward(err.to_string()))?;
        return Ok(proxy_response(resp).await);
    }

    app.state.validate_produce(&req.topic, &req.message)?;

    let offset = app.state.append_in_memory(&req.topic, partition, req.message.clone())?;
    if let Err(err) = app.state.store.append(&req.topic, partition, &req.message).await {
        tracing::warn!(topic = %req.topic, partition, %err, "failed to persist produced message to disk");
    }
    metrics::inc_produced();
    tracing::info!(topic = %req.topic, partition, offset, "produced message");

    Ok(Json(ProduceResponse { offset }).into_response())
}

#[tracing::instrument(skip_all, fields(topic = %query.topic, partition = query.partition, offset = query.offset))]
async fn consume(State(app): State<Arc<App>>, Query(query): Query<ConsumeQuery>) -> Response {
    match consume_inner(&app, query).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn consume_inner(app: &App, query: ConsumeQuery) -> Result<Response, BrokerError> {
    let owners = app.state.owners(&query.topic).ok_or(BrokerError::NotFound)?;
    let owner = owners
        .get(query.partition as usize)
        .cloned()
        .ok_or(BrokerError::NotFound)?;

    if owner != app.state.address {
        let url = format!(
            "http://{owner}/consume?topic={}&partition={}&offset={}",
            query.topic, query.partition, query.offset
        );
        let resp = app
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| BrokerError::Forward(err.to_string()))?;
        return Ok(proxy_response(resp).await);
    }

    match app.state.read(&query.topic, query.partition, query.offset)? {
        Some(message) => {
            metrics::inc_consumed();
            tracing::info!(topic = %query.topic, partition = query.partition, offset = query.offset, "consumed message");
            Ok(Json(ConsumeResponse {
                offset: query.offset,
                message,
            })
            .into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Streams a forwarded owner's response back to the original caller
/// without decoding and re-encoding the body (spec.md §9).
async fn proxy_response(resp: reqwest::Response) -> Response {
    let status = resp.status();
    let body = resp.bytes().await.unwrap_or_default();
    (
        StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
        body,
    )
        .into_response()
}
