use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::Semaphore;

use crate::config::DEFAULT_WORKERS;
use crate::domain::{Contents, ContentsBuilder, Parameters, Position};
use crate::fragment::Fragment;
use crate::tracer::{Statistics, Tracer};

/// Everything one page execution produced.
#[derive(Debug, Clone)]
pub struct PageResult {
    pub contents: Contents,
    pub statistics: Statistics,
}

/// An ordered set of fragments fetched together.
pub struct Page {
    fragments: Vec<Arc<Fragment>>,
    semaphore: Arc<Semaphore>,
    workers: usize,
}

impl Page {
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self::with_workers(fragments, DEFAULT_WORKERS)
    }

    /// At most `workers` fragments of this page are fetched at the same time.
    pub fn with_workers(fragments: Vec<Fragment>, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            fragments: fragments.into_iter().map(Arc::new).collect(),
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn positions(&self) -> Vec<&Position> {
        self.fragments.iter().flat_map(|f| f.positions()).collect()
    }

    /// Fetch all fragments with a fresh recording tracer.
    pub async fn fetch_with(&self, parameters: &Parameters) -> PageResult {
        self.fetch_traced(parameters, Tracer::new()).await
    }

    /// Fetch all fragments, recording into `tracer`.
    ///
    /// Returns once every fragment has completed. Backend failures never
    /// make this fail; they only leave positions unfilled.
    pub async fn fetch_traced(&self, parameters: &Parameters, tracer: Tracer) -> PageResult {
        let builder = ContentsBuilder::new();
        let mut handles = Vec::with_capacity(self.fragments.len());

        for fragment in &self.fragments {
            let fragment = fragment.clone();
            let semaphore = self.semaphore.clone();
            let tracer = tracer.clone();
            let builder = builder.clone();
            let parameters = parameters.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        tracing::error!("Worker pool closed: {}", e);
                        return;
                    }
                };

                let mut contents = fragment.fetch_with(&tracer, parameters);
                while let Some(content) = contents.next().await {
                    builder.put(content);
                }
            });

            handles.push(handle);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Task join error: {}", e);
            }
        }

        let statistics = tracer.statistics();
        tracing::debug!(
            "Page fetched in {}ms: {} requested, {} non-empty, {} errors",
            statistics.runtime_millis,
            statistics.num_requested,
            statistics.num_non_empty,
            statistics.num_errors
        );

        PageResult {
            contents: builder.build(),
            statistics,
        }
    }
}
