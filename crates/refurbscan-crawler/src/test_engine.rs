//! Scripted in-memory browser engine for pipeline tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::engine::{BrowserEngine, EngineError, PageSession};

/// What the fake engine does when a given URL is opened.
pub(crate) enum Outcome {
    /// Page loads and settles with this markup.
    Html(String),
    /// Page loads but never settles; `wait_for_stable` times out.
    Timeout,
    /// Navigation itself fails.
    NavError(String),
}

/// A [`BrowserEngine`] that replays scripted outcomes per URL, in order.
/// URLs with no remaining script produce an empty page, which the navigator
/// reads as pagination exhaustion.
pub(crate) struct FakeEngine {
    script: Mutex<HashMap<String, VecDeque<Outcome>>>,
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn script(&self, url: &str, outcome: Outcome) {
        self.script
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(outcome);
    }
}

impl BrowserEngine for FakeEngine {
    type Page = FakePage;

    async fn open(&self, url: &str) -> Result<FakePage, EngineError> {
        let outcome = self
            .script
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front);

        match outcome {
            Some(Outcome::NavError(reason)) => Err(EngineError::Navigation {
                url: url.to_string(),
                reason,
            }),
            Some(Outcome::Timeout) => Ok(FakePage {
                content: String::new(),
                settles: false,
            }),
            Some(Outcome::Html(content)) => Ok(FakePage {
                content,
                settles: true,
            }),
            None => Ok(FakePage {
                content: "<html><body></body></html>".to_string(),
                settles: true,
            }),
        }
    }
}

pub(crate) struct FakePage {
    content: String,
    settles: bool,
}

impl PageSession for FakePage {
    async fn wait_for_stable(&self, timeout: Duration) -> Result<(), EngineError> {
        if self.settles {
            Ok(())
        } else {
            Err(EngineError::StableTimeout {
                timeout_secs: timeout.as_secs(),
            })
        }
    }

    async fn query_text(&self, _selector: &str) -> Result<Option<String>, EngineError> {
        Ok(None)
    }

    async fn current_content(&self) -> Result<String, EngineError> {
        Ok(self.content.clone())
    }

    async fn close(self) -> Result<(), EngineError> {
        Ok(())
    }
}
