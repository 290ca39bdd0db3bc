//! Scripted engines and oracles for driving sessions deterministically

use crate::engines::{EngineClient, EngineRegistry, EngineSpec};
use crate::error::{ErrorKind, SearchError};
use crate::oracle::{Analysis, SufficiencyOracle};
use crate::results::{EvidenceSet, Hit};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted engine reply
#[derive(Debug, Clone)]
pub enum Step {
    Hits(Vec<Hit>),
    Fail(ErrorKind),
    /// Never answer within any test deadline
    Hang,
}

/// Hits for `urls`, titled after their position
pub fn hits(urls: &[&str]) -> Step {
    Step::Hits(
        urls.iter()
            .enumerate()
            .map(|(i, url)| Hit::new(*url, format!("Result {}", i + 1)).with_snippet("snippet"))
            .collect(),
    )
}

/// Engine replaying a script; the last step repeats once the script runs out
pub struct ScriptedEngine {
    id: String,
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    calls: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new(id: &str, steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(step) = steps.pop_front() {
            *last = Some(step.clone());
            step
        } else {
            last.clone().unwrap_or(Step::Hits(vec![]))
        }
    }
}

#[async_trait]
impl EngineClient for ScriptedEngine {
    async fn search(
        &self,
        _query: &str,
        count: usize,
        _timeout: Duration,
    ) -> Result<Vec<Hit>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Hits(mut hits) => {
                hits.truncate(count);
                Ok(hits)
            }
            Step::Fail(kind) => Err(SearchError::new(kind, "scripted failure").with_engine(&self.id)),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(vec![])
            }
        }
    }
}

/// Oracle replaying a script; refines with an empty query once it runs out
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<Analysis, SearchError>>>,
    calls: AtomicUsize,
    evidence_sizes: Mutex<Vec<usize>>,
}

impl ScriptedOracle {
    pub fn new(replies: Vec<Result<Analysis, SearchError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            evidence_sizes: Mutex::new(Vec::new()),
        })
    }

    /// Oracle that is never satisfied
    pub fn never_sufficient() -> Arc<Self> {
        Self::new(vec![])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Evidence size seen by each analyze call
    pub fn evidence_sizes(&self) -> Vec<usize> {
        self.evidence_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl SufficiencyOracle for ScriptedOracle {
    async fn analyze(
        &self,
        _original_query: &str,
        evidence: &EvidenceSet,
    ) -> Result<Analysis, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.evidence_sizes.lock().unwrap().push(evidence.len());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Analysis::refine("", "still looking")))
    }
}

/// Registry over scripted engines; the first one is the default
pub fn registry(engines: &[(&Arc<ScriptedEngine>, bool)]) -> Arc<EngineRegistry> {
    let default = engines.first().map(|(e, _)| e.id.clone()).unwrap_or_default();
    let mut registry = EngineRegistry::new(default);
    for (engine, paid) in engines {
        let spec = if *paid {
            EngineSpec::paid(engine.id.clone())
        } else {
            EngineSpec::free(engine.id.clone())
        };
        let client: Arc<dyn EngineClient> = (*engine).clone();
        registry.register(spec, client);
    }
    Arc::new(registry)
}
