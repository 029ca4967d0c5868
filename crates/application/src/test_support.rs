use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use apiconnector_core::{AppError, AppResult};
use apiconnector_domain::{TelemetryRow, TopicRoutes};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::connector_ports::{
    HttpInvoker, InvokedResponse, MessageBus, OutboundRequest, SecretResolver, TaskQueue,
    TelemetryStore, TokenEndpoint, TokenRequest, TokenResponse,
};
use crate::{
    AuthStrategyResolver, EnqueueService, ExecutionService, FanOutPublisher, TelemetryWriter,
};

#[derive(Default)]
pub struct FakeTaskQueue {
    pub submitted: Mutex<Vec<(String, Vec<u8>)>>,
    pub fail_with: Option<String>,
}

#[async_trait]
impl TaskQueue for FakeTaskQueue {
    async fn submit(&self, queue_name: &str, message: Vec<u8>) -> AppResult<String> {
        if let Some(detail) = &self.fail_with {
            return Err(AppError::Internal(detail.clone()));
        }

        let mut submitted = self.submitted.lock().await;
        submitted.push((queue_name.to_owned(), message));
        Ok(format!("task-{}", submitted.len()))
    }

    async fn pending_count(&self, queue_name: &str) -> AppResult<u64> {
        let submitted = self.submitted.lock().await;
        Ok(submitted
            .iter()
            .filter(|(queue, _)| queue == queue_name)
            .count() as u64)
    }
}

#[derive(Default)]
pub struct FakeTelemetryStore {
    pub rows: Mutex<Vec<(String, TelemetryRow)>>,
    pub fail: bool,
}

impl FakeTelemetryStore {
    pub fn failing() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn tables(&self) -> Vec<String> {
        self.rows
            .lock()
            .await
            .iter()
            .map(|(table, _)| table.clone())
            .collect()
    }
}

#[async_trait]
impl TelemetryStore for FakeTelemetryStore {
    async fn append_row(&self, table: &str, row: TelemetryRow) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Internal("warehouse unavailable".to_owned()));
        }

        self.rows.lock().await.push((table.to_owned(), row));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMessageBus {
    pub published: Mutex<Vec<(String, Vec<u8>)>>,
}

#[async_trait]
impl MessageBus for FakeMessageBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> AppResult<()> {
        self.published
            .lock()
            .await
            .push((topic.to_owned(), payload));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSecretResolver {
    pub secrets: HashMap<String, Value>,
}

impl FakeSecretResolver {
    pub fn with_secret(name: &str, payload: Value) -> Self {
        let mut secrets = HashMap::new();
        secrets.insert(name.to_owned(), payload);
        Self { secrets }
    }
}

#[async_trait]
impl SecretResolver for FakeSecretResolver {
    async fn resolve(&self, secret_id: &str) -> AppResult<Value> {
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("secret '{secret_id}' does not exist")))
    }
}

pub struct FakeTokenEndpoint {
    pub response: TokenResponse,
    pub requests: Mutex<Vec<TokenRequest>>,
}

impl FakeTokenEndpoint {
    pub fn replying(status_code: u16, body: &str) -> Self {
        Self {
            response: TokenResponse {
                status_code,
                body: body.to_owned(),
            },
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TokenEndpoint for FakeTokenEndpoint {
    async fn request_client_credentials_token(
        &self,
        request: &TokenRequest,
    ) -> AppResult<TokenResponse> {
        self.requests.lock().await.push(request.clone());
        Ok(self.response.clone())
    }
}

pub struct FakeHttpInvoker {
    pub response: Option<InvokedResponse>,
    pub requests: Mutex<Vec<OutboundRequest>>,
}

impl FakeHttpInvoker {
    pub fn replying(status_code: u16, content_type: &str, body: &str) -> Self {
        Self {
            response: Some(InvokedResponse {
                status_code,
                headers: vec![("content-type".to_owned(), content_type.to_owned())],
                body: body.to_owned(),
                elapsed: Duration::from_millis(12),
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            response: None,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl HttpInvoker for FakeHttpInvoker {
    async fn invoke(&self, request: OutboundRequest) -> AppResult<InvokedResponse> {
        self.requests.lock().await.push(request);
        self.response
            .clone()
            .ok_or_else(|| AppError::Internal("connection refused".to_owned()))
    }
}

pub struct Harness {
    pub task_queue: Arc<FakeTaskQueue>,
    pub telemetry: Arc<FakeTelemetryStore>,
    pub message_bus: Arc<FakeMessageBus>,
    pub token_endpoint: Arc<FakeTokenEndpoint>,
    pub http_invoker: Arc<FakeHttpInvoker>,
    pub secrets: Arc<FakeSecretResolver>,
    pub routes: TopicRoutes,
}

impl Harness {
    pub fn new(http_invoker: FakeHttpInvoker) -> Self {
        Self {
            task_queue: Arc::new(FakeTaskQueue::default()),
            telemetry: Arc::new(FakeTelemetryStore::default()),
            message_bus: Arc::new(FakeMessageBus::default()),
            token_endpoint: Arc::new(FakeTokenEndpoint::replying(
                200,
                r#"{"access_token":"tok-1"}"#,
            )),
            http_invoker: Arc::new(http_invoker),
            secrets: Arc::new(FakeSecretResolver::default()),
            routes: TopicRoutes::default(),
        }
    }

    pub fn enqueue_service(&self) -> EnqueueService {
        EnqueueService::new(
            self.task_queue.clone(),
            TelemetryWriter::new(self.telemetry.clone()),
        )
    }

    pub fn execution_service(&self) -> ExecutionService {
        ExecutionService::new(
            self.secrets.clone(),
            AuthStrategyResolver::new(self.token_endpoint.clone(), "access_token"),
            self.http_invoker.clone(),
            TelemetryWriter::new(self.telemetry.clone()),
            FanOutPublisher::new(self.message_bus.clone(), self.routes.clone()),
        )
    }
}
