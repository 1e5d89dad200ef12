//! Core types shared across the workspace model and its stores.

/// NodeId: stable identifier of a file or folder node
pub type NodeId = String;

/// AssetId: identifier of a binary attachment in the content store
pub type AssetId = String;

/// Timestamp: milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a fresh random identifier for nodes and assets.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
