//! In-memory upstream for tests in this crate and, behind the
//! `test-support` feature, in downstream crates.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::CoreError;
use crate::upstream::{CompletionRequest, GenerativeUpstream, IllustrationRequest};

/// Scripted [`GenerativeUpstream`].
///
/// Queued results are returned in order; once a queue is empty completions
/// return an empty string and illustrations return a numbered URL.
#[derive(Default)]
pub struct FakeUpstream {
    completions: Mutex<VecDeque<Result<String, CoreError>>>,
    illustrations: Mutex<VecDeque<Result<String, CoreError>>>,
    completion_log: Mutex<Vec<CompletionRequest>>,
    illustration_log: Mutex<Vec<IllustrationRequest>>,
    yield_between_calls: bool,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yield to the scheduler inside every illustration call so observers
    /// of intermediate state get a chance to run.
    pub fn yielding(mut self) -> Self {
        self.yield_between_calls = true;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn with_completion(self, text: &str) -> Self {
        self.completions.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn with_completion_error(self, err: CoreError) -> Self {
        self.completions.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn with_illustration(self, url: &str) -> Self {
        self.illustrations.lock().unwrap().push_back(Ok(url.to_string()));
        self
    }

    pub fn with_illustration_error(self, err: CoreError) -> Self {
        self.illustrations.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn completion_calls(&self) -> usize {
        self.completion_log.lock().unwrap().len()
    }

    pub fn illustration_calls(&self) -> usize {
        self.illustration_log.lock().unwrap().len()
    }

    pub fn last_completion(&self) -> Option<CompletionRequest> {
        self.completion_log.lock().unwrap().last().cloned()
    }

    pub fn illustration_requests(&self) -> Vec<IllustrationRequest> {
        self.illustration_log.lock().unwrap().clone()
    }

    /// Illustration prompts in call order.
    pub fn illustration_prompts(&self) -> Vec<String> {
        self.illustration_log
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }
}

#[async_trait]
impl GenerativeUpstream for FakeUpstream {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CoreError> {
        self.completion_log.lock().unwrap().push(request.clone());
        self.completions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }

    async fn illustrate(&self, request: &IllustrationRequest) -> Result<String, CoreError> {
        let n = {
            let mut log = self.illustration_log.lock().unwrap();
            log.push(request.clone());
            log.len()
        };
        if self.yield_between_calls {
            tokio::task::yield_now().await;
        }
        self.illustrations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("https://images.test/{n}.png")))
    }
}
