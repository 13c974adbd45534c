//! Service-provider notification fan-out
//!
//! Every published tender is announced to each active service provider.
//! Delivery is best effort: the tender is already persisted, so a failed
//! notification is reported but never undoes it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::storage::StoreError;
use crate::types::{Tender, VehicleType};

/// Recipient type stamped on tender announcements
pub const RECIPIENT_SERVICE_PROVIDER: &str = "SERVICE_PROVIDER";

/// Announcement title shown to providers
pub const TENDER_NOTIFICATION_TITLE: &str = "New Tender Available";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

/// Directory of registered service providers
#[async_trait]
pub trait ServiceProviderDirectory: Send + Sync {
    async fn active_providers(&self) -> Result<Vec<ServiceProvider>, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    TenderCreation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    Dashboard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMetadata {
    pub tender_id: String,
    pub volume_tons: f64,
    pub vehicle_type: VehicleType,
    pub bidding_deadline: DateTime<Utc>,
}

/// One announcement addressed to one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderNotification {
    pub kind: NotificationKind,
    pub recipient_id: String,
    pub recipient_type: String,
    pub title: String,
    pub message: String,
    pub channels: Vec<Channel>,
    pub metadata: NotificationMetadata,
}

impl TenderNotification {
    pub fn for_provider(tender: &Tender, provider: &ServiceProvider) -> Self {
        Self {
            kind: NotificationKind::TenderCreation,
            recipient_id: provider.id.clone(),
            recipient_type: RECIPIENT_SERVICE_PROVIDER.to_string(),
            title: TENDER_NOTIFICATION_TITLE.to_string(),
            message: format!("A new tender is open for bidding: {}", tender.title),
            channels: vec![Channel::Email, Channel::Sms, Channel::Dashboard],
            metadata: NotificationMetadata {
                tender_id: tender.tender_id.clone(),
                volume_tons: tender.volume_required,
                vehicle_type: tender.vehicle_type,
                bidding_deadline: tender.bidding_deadline,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("delivery to {recipient} failed: {reason}")]
    Delivery { recipient: String, reason: String },
    #[error("notifier unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &TenderNotification) -> Result<(), NotifyError>;
}

/// Notifier that only emits a structured log event per announcement
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &TenderNotification) -> Result<(), NotifyError> {
        info!(
            recipient = %notification.recipient_id,
            tender_id = %notification.metadata.tender_id,
            volume_tons = notification.metadata.volume_tons,
            vehicle_type = %notification.metadata.vehicle_type,
            "{}",
            notification.message
        );
        Ok(())
    }
}
