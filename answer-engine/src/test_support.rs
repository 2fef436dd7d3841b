//! In-crate fakes of the three collaborators, shared by the pipeline tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rag_store::{BoxFuture, EmbeddingsProvider, PassageIndex, RagError, RetrievedPassage};

use crate::collab::TextGenerator;
use crate::error::GenerationError;

pub enum GeneratorBehavior {
    Reply(String),
    Fail(GenerationError),
    /// Never answers within any test timeout.
    Hang,
}

pub struct FakeGenerator {
    behavior: GeneratorBehavior,
    calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn new(behavior: GeneratorBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextGenerator for FakeGenerator {
    fn complete<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String, GenerationError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            match &self.behavior {
                GeneratorBehavior::Reply(s) => Ok(s.clone()),
                GeneratorBehavior::Fail(e) => Err(e.clone()),
                GeneratorBehavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(GenerationError::Timeout)
                }
            }
        })
    }

    fn is_reachable(&self) -> BoxFuture<'_, bool> {
        let ok = matches!(self.behavior, GeneratorBehavior::Reply(_));
        Box::pin(async move { ok })
    }
}

pub struct FakeEmbedder {
    pub fail: bool,
    calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingsProvider for FakeEmbedder {
    fn embed<'a>(
        &'a self,
        _text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail;
        Box::pin(async move {
            if fail {
                Err(RagError::Embedding("model not loaded".into()))
            } else {
                Ok(vec![0.1, 0.2, 0.3])
            }
        })
    }
}

/// How the fake index misbehaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexFault {
    None,
    NotConnected,
    CollectionMissing,
    QueryFails,
    /// `query` never returns.
    Hangs,
}

pub struct FakeIndex {
    pub passages: Vec<RetrievedPassage>,
    pub count: u64,
    pub fault: IndexFault,
    queries: AtomicUsize,
}

impl FakeIndex {
    pub fn with_passages(passages: Vec<RetrievedPassage>) -> Self {
        Self {
            count: 100,
            passages,
            fault: IndexFault::None,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn faulty(fault: IndexFault) -> Self {
        Self {
            fault,
            ..Self::with_passages(Vec::new())
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl PassageIndex for FakeIndex {
    fn ping(&self) -> BoxFuture<'_, Result<(), RagError>> {
        let fault = self.fault;
        Box::pin(async move {
            match fault {
                IndexFault::NotConnected => Err(RagError::NotConnected("refused".into())),
                _ => Ok(()),
            }
        })
    }

    fn collection_exists(&self) -> BoxFuture<'_, Result<bool, RagError>> {
        let fault = self.fault;
        Box::pin(async move {
            match fault {
                IndexFault::NotConnected => Err(RagError::NotConnected("refused".into())),
                IndexFault::CollectionMissing => Ok(false),
                _ => Ok(true),
            }
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, RagError>> {
        Box::pin(async move {
            match self.fault {
                IndexFault::NotConnected => Err(RagError::NotConnected("refused".into())),
                IndexFault::CollectionMissing => Err(RagError::CollectionMissing("c".into())),
                _ => Ok(self.count),
            }
        })
    }

    fn query<'a>(
        &'a self,
        _vector: &'a [f32],
        k: u64,
    ) -> BoxFuture<'a, Result<Vec<RetrievedPassage>, RagError>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            match self.fault {
                IndexFault::NotConnected => Err(RagError::NotConnected("refused".into())),
                IndexFault::CollectionMissing => Err(RagError::CollectionMissing("c".into())),
                IndexFault::QueryFails => Err(RagError::QueryFailed("boom".into())),
                IndexFault::Hangs => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(Vec::new())
                }
                IndexFault::None => {
                    let mut out = self.passages.clone();
                    out.sort_by(|a, b| a.distance.total_cmp(&b.distance));
                    out.truncate(k as usize);
                    Ok(out)
                }
            }
        })
    }

    fn sources(&self) -> BoxFuture<'_, Result<Vec<String>, RagError>> {
        Box::pin(async move {
            if self.fault != IndexFault::None {
                return Err(RagError::NotConnected("refused".into()));
            }
            let mut names: Vec<String> = self
                .passages
                .iter()
                .map(|p| p.metadata.source.clone())
                .collect();
            names.sort();
            names.dedup();
            Ok(names)
        })
    }
}
