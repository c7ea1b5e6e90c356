use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use super::{ConnectionResponse, ConnectionsApi, DirectoryEntry, DirectoryKind};

/// In-memory stand-in for the REST backend.
#[derive(Default)]
pub struct MemoryApi {
    pub connections: Mutex<Vec<Value>>,
    pub alumni: Vec<DirectoryEntry>,
    pub mentors: Vec<DirectoryEntry>,
    /// Status and message returned by `request_connection`.
    pub connect_reply: Option<(u16, Option<String>)>,
    pub fail_fetch: AtomicBool,
    pub fail_connect: AtomicBool,
    pub requests: Mutex<Vec<(String, String)>>,
}

impl MemoryApi {
    pub fn with_connections(connections: Vec<Value>) -> Self {
        Self {
            connections: Mutex::new(connections),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        let api = Self::default();
        api.fail_fetch.store(true, Ordering::SeqCst);
        api.fail_connect.store(true, Ordering::SeqCst);
        api
    }
}

#[async_trait]
impl ConnectionsApi for MemoryApi {
    async fn fetch_connections(&self) -> anyhow::Result<Vec<Value>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        Ok(self.connections.lock().unwrap().clone())
    }

    async fn fetch_directory(&self, kind: DirectoryKind) -> anyhow::Result<Vec<DirectoryEntry>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        Ok(match kind {
            DirectoryKind::Alumni => self.alumni.clone(),
            DirectoryKind::Mentors => self.mentors.clone(),
        })
    }

    async fn request_connection(
        &self,
        alumni_id: &str,
        message: &str,
    ) -> anyhow::Result<ConnectionResponse> {
        if self.fail_connect.load(Ordering::SeqCst) {
            anyhow::bail!("connection reset");
        }
        self.requests
            .lock()
            .unwrap()
            .push((alumni_id.to_string(), message.to_string()));
        let (status, message) = self
            .connect_reply
            .clone()
            .unwrap_or((201, Some("Connection request sent".into())));
        if status == 201 {
            self.connections
                .lock()
                .unwrap()
                .push(serde_json::json!({ "alumniId": alumni_id }));
        }
        Ok(ConnectionResponse { status, message })
    }
}
