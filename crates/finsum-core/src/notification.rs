//! Inbound change notification payload.
//!
//! The webhook endpoint and queue transport that deliver this payload
//! live outside this system; the processor only consumes the collection
//! name and the feed resource identifier, and tolerates the payload
//! arriving more than once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload delivered for each change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    /// Name of the changed collection; decides the phase.
    #[serde(alias = "collectionId")]
    pub collection_id: String,

    /// Feed resource identifier the cursor is scoped to (the list id
    /// upstream).
    #[serde(alias = "affectedScopeId", alias = "resource")]
    pub resource_id: String,

    /// Identifier of the feed subscription that produced this
    /// notification, when the transport includes it.
    #[serde(default, alias = "subscriptionId")]
    pub subscription_id: Option<String>,

    /// When the feed subscription expires. Renewal is handled outside
    /// this system; carried here only because the payload includes it.
    #[serde(
        default,
        alias = "subscriptionExpiry",
        alias = "subscriptionExpirationDateTime"
    )]
    pub subscription_expiry: Option<DateTime<Utc>>,
}

impl ChangeNotification {
    pub fn new(collection_id: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            resource_id: resource_id.into(),
            subscription_id: None,
            subscription_expiry: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_webhook_shape() {
        let payload = r#"{
            "collectionId": "Expense Details Preliminary",
            "resource": "7e6e9302-0f3b-4355-9c5d-2a401d15d832",
            "subscriptionId": "8e2c3f44-1d5a-4a0e-9b77-0f6f2f1a9c21",
            "subscriptionExpirationDateTime": "2024-05-30T00:00:00Z"
        }"#;
        let notification: ChangeNotification = serde_json::from_str(payload).unwrap();
        assert_eq!(notification.collection_id, "Expense Details Preliminary");
        assert!(notification.subscription_id.is_some());
        assert_eq!(
            notification.resource_id,
            "7e6e9302-0f3b-4355-9c5d-2a401d15d832"
        );
        assert!(notification.subscription_expiry.is_some());
    }

    #[test]
    fn expiry_is_optional() {
        let payload = r#"{"collection_id": "Expense Details Final", "resource_id": "abc"}"#;
        let notification: ChangeNotification = serde_json::from_str(payload).unwrap();
        assert_eq!(notification.subscription_expiry, None);
    }
}
