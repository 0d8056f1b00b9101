//! Parallel batch processing using Rayon
//!
//! Runs one engine operation over many inputs on a dedicated thread pool.
//! Results come back in input order and a failing input never aborts the
//! rest of the batch.

use anyhow::Result;
use netcalc_core::NetcalcError;
use netcalc_engine::{Engine, Operation, Request, Response};
use rayon::prelude::*;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::io::BufRead;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Outcome for one input line
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub input: String,
    pub result: std::result::Result<Response, NetcalcError>,
}

impl Serialize for BatchResult {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("BatchResult", 2)?;
        state.serialize_field("input", &self.input)?;
        match &self.result {
            Ok(response) => state.serialize_field("result", response)?,
            Err(e) => state.serialize_field(
                "error",
                &serde_json::json!({ "kind": e.kind(), "detail": e.to_string() }),
            )?,
        }
        state.end()
    }
}

/// Batch processor with parallel execution
pub struct BatchProcessor<'a> {
    engine: &'a Engine,
    thread_pool: rayon::ThreadPool,
}

impl<'a> BatchProcessor<'a> {
    /// Create a batch processor
    ///
    /// `num_threads` defaults to the number of CPU cores.
    pub fn new(engine: &'a Engine, num_threads: Option<usize>) -> Result<Self> {
        let num_threads = num_threads.unwrap_or_else(num_cpus::get).max(1);

        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;

        Ok(Self {
            engine,
            thread_pool,
        })
    }

    /// Run `operation` over every input in parallel, preserving order
    pub fn process(
        &self,
        inputs: Vec<String>,
        operation: Operation,
        cloud_mode: Option<&str>,
    ) -> Vec<BatchResult> {
        let total = inputs.len();
        let processed = AtomicUsize::new(0);

        self.thread_pool.install(|| {
            inputs
                .into_par_iter()
                .map(|input| {
                    let mut request = Request::new(operation, input);
                    request.cloud_mode = cloud_mode.map(str::to_string);
                    let result = self.engine.handle(&request);

                    let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if count % 1000 == 0 || count == total {
                        tracing::info!("Processed {}/{} inputs", count, total);
                    }

                    BatchResult {
                        input: request.address,
                        result,
                    }
                })
                .collect()
        })
    }

    pub fn thread_count(&self) -> usize {
        self.thread_pool.current_num_threads()
    }
}

/// Read one input per line, skipping blank lines and `#` comments
pub fn read_inputs<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut inputs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        inputs.push(trimmed.to_string());
    }
    Ok(inputs)
}
