use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resolved identity for one authenticated session. Created by the
/// profile sync and destroyed when authentication ends; every thread
/// operation is gated on `eta_id` being present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtaProfile {
    pub eta_id: Option<String>,
    pub upload_date: Option<String>,
    pub user: Option<Value>,
}

impl EtaProfile {
    pub fn eta_id(&self) -> Option<&str> {
        self.eta_id.as_deref()
    }
}
