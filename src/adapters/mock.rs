use std::{
    collections::{BTreeMap, HashSet},
    ops::Bound,
    sync::Mutex,
};

use crate::{
    adapters,
    model::{
        error::BackendError,
        object::{ObjectBody, ObjectPage, Operation},
    },
};

pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// A backend call as seen by [`MemoryBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    List {
        bucket: String,
        prefix: String,
        continuation_token: Option<String>,
    },
    Copy {
        src_bucket: String,
        src_key: String,
        dest_bucket: String,
        dest_key: String,
    },
    Delete {
        bucket: String,
        key: String,
    },
    Get {
        bucket: String,
        key: String,
    },
    Put {
        bucket: String,
        key: String,
        size: usize,
    },
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::List { .. } => Operation::List,
            Call::Copy { .. } => Operation::Copy,
            Call::Delete { .. } => Operation::Delete,
            Call::Get { .. } => Operation::Get,
            Call::Put { .. } => Operation::Put,
        }
    }
}

/// In-memory object store that keeps bytes, paginates listings and records
/// every call it receives.
pub struct MemoryBackend {
    pub page_size: usize,
    pub chunk_size: usize,
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashSet<Operation>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            chunk_size: 8 * 1024,
            objects: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashSet::new()),
        }
    }

    /// Stores an object directly, without recording a call.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        self.objects
            .lock()
            .expect("failed to acquire `objects` guard")
            .insert((bucket.to_string(), key.to_string()), body.into());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .expect("failed to acquire `objects` guard")
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.object(bucket, key).is_some()
    }

    /// Makes every following call of `operation` fail.
    pub fn fail_on(&self, operation: Operation) {
        self.failures
            .lock()
            .expect("failed to acquire `failures` guard")
            .insert(operation);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .expect("failed to acquire `calls` guard")
            .clone()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    fn record(&self, call: Call) -> Result<(), BackendError> {
        let operation = call.operation();
        self.calls
            .lock()
            .expect("failed to acquire `calls` guard")
            .push(call);

        let failing = self
            .failures
            .lock()
            .expect("failed to acquire `failures` guard")
            .contains(&operation);

        if failing {
            return Err(BackendError::new(format!(
                "injected failure for {}",
                operation
            )));
        }

        Ok(())
    }
}

impl adapters::ObjectBackend for MemoryBackend {
    fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, BackendError> {
        self.record(Call::List {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            continuation_token: continuation_token.clone(),
        })?;

        let objects = self.objects.lock().expect("failed to acquire `objects` guard");

        let lower = match continuation_token {
            Some(tok) => Bound::Excluded((bucket.to_string(), tok)),
            None => Bound::Included((bucket.to_string(), prefix.to_string())),
        };

        let mut matching = objects
            .range((lower, Bound::Unbounded))
            .map(|((b, k), _)| (b, k))
            .take_while(|(b, _)| b.as_str() == bucket)
            .filter(|(_, k)| k.starts_with(prefix))
            .map(|(_, k)| k.clone());

        let keys: Vec<String> = matching.by_ref().take(self.page_size).collect();
        let continuation_token = match matching.next() {
            Some(_) => keys.last().cloned(),
            None => None,
        };

        Ok(ObjectPage {
            keys,
            continuation_token,
        })
    }

    fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> Result<(), BackendError> {
        self.record(Call::Copy {
            src_bucket: src_bucket.to_string(),
            src_key: src_key.to_string(),
            dest_bucket: dest_bucket.to_string(),
            dest_key: dest_key.to_string(),
        })?;

        let mut objects = self.objects.lock().expect("failed to acquire `objects` guard");

        let body = objects
            .get(&(src_bucket.to_string(), src_key.to_string()))
            .cloned()
            .ok_or_else(|| {
                BackendError::not_found(format!("no such key: {}/{}", src_bucket, src_key))
            })?;

        objects.insert((dest_bucket.to_string(), dest_key.to_string()), body);

        Ok(())
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        self.record(Call::Delete {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;

        // Deleting a missing key succeeds, as it does on S3.
        self.objects
            .lock()
            .expect("failed to acquire `objects` guard")
            .remove(&(bucket.to_string(), key.to_string()));

        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, BackendError> {
        self.record(Call::Get {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;

        let body = self.object(bucket, key).ok_or_else(|| {
            BackendError::not_found(format!("no such key: {}/{}", bucket, key))
        })?;

        let chunks: Vec<Result<Vec<u8>, BackendError>> = body
            .chunks(self.chunk_size)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();

        Ok(Box::new(chunks.into_iter()))
    }

    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), BackendError> {
        self.record(Call::Put {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: body.len(),
        })?;

        self.insert(bucket, key, body);

        Ok(())
    }
}
