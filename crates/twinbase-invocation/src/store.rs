use parking_lot::RwLock;
use std::collections::HashMap;
use twinbase_core_types::CorrelationId;

use crate::request::InvocationResponse;

/// Latest response per `(operation path, correlation id)`
///
/// Safe for one writer and any number of concurrent pollers. Only `store`
/// and `lookup` are exposed; there is no iteration.
#[derive(Debug, Default)]
pub struct InvocationResultStore {
    results: RwLock<HashMap<(String, CorrelationId), InvocationResponse>>,
}

impl InvocationResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the response for a handle
    pub fn store(&self, path: &str, response: InvocationResponse) {
        let key = (path.to_string(), response.request_id.clone());
        self.results.write().insert(key, response);
    }

    pub fn lookup(&self, path: &str, request_id: &CorrelationId) -> Option<InvocationResponse> {
        self.results
            .read()
            .get(&(path.to_string(), request_id.clone()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ExecutionState;

    fn response(id: &str, state: ExecutionState) -> InvocationResponse {
        InvocationResponse::with_state(CorrelationId::from(id), state, Vec::new(), Vec::new())
    }

    #[test]
    fn test_store_overwrites_same_handle() {
        let store = InvocationResultStore::new();
        store.store("Calculate", response("r1", ExecutionState::Initiated));
        store.store("Calculate", response("r1", ExecutionState::Completed));

        let found = store
            .lookup("Calculate", &CorrelationId::from("r1"))
            .unwrap();
        assert_eq!(found.execution_state, ExecutionState::Completed);
    }

    #[test]
    fn test_handles_are_scoped_by_path() {
        let store = InvocationResultStore::new();
        store.store("A", response("r1", ExecutionState::Completed));
        assert!(store.lookup("B", &CorrelationId::from("r1")).is_none());
    }

    #[test]
    fn test_concurrent_writes_and_reads() {
        let store = std::sync::Arc::new(InvocationResultStore::new());
        let writers: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.store("Op", response(&format!("r{}", i), ExecutionState::Running));
                        let _ = store.lookup("Op", &CorrelationId::from(format!("r{}", i)));
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        for i in 0..8 {
            assert!(store
                .lookup("Op", &CorrelationId::from(format!("r{}", i)))
                .is_some());
        }
    }
}
