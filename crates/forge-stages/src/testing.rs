//! Test doubles for the completion seam.

use crate::completion::{CompletionClient, CompletionError, CompletionRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Queue-backed fake: pops one scripted reply per call and records every
/// request for assertions. An exhausted queue answers with a malformed
/// response error.
pub(crate) struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    pub(crate) seen: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new(replies: Vec<Result<String, CompletionError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.seen.lock().await.push(request);
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(CompletionError::MalformedResponse))
    }
}
