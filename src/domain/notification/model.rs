//! Outbound notification types

use serde::{Deserialize, Serialize};

/// Who a notification is addressed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Recipient {
    /// A single user (vehicle owner)
    User(i32),
    /// A broadcast topic
    Topic(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Exit camera saw the vehicle but the owner has not confirmed leaving
    CheckOutConfirmationRequired,
    VehicleCheckedIn,
    VehicleCheckedOut,
    Broadcast,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckOutConfirmationRequired => "check_out_confirmation_required",
            Self::VehicleCheckedIn => "vehicle_checked_in",
            Self::VehicleCheckedOut => "vehicle_checked_out",
            Self::Broadcast => "broadcast",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: Recipient,
    pub alert: AlertType,
    pub title: String,
    pub body: String,
    pub payload: serde_json::Value,
}

impl Notification {
    pub fn to_user(
        user_id: i32,
        alert: AlertType,
        title: impl Into<String>,
        body: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            recipient: Recipient::User(user_id),
            alert,
            title: title.into(),
            body: body.into(),
            payload,
        }
    }

    pub fn to_topic(
        topic: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient: Recipient::Topic(topic.into()),
            alert: AlertType::Broadcast,
            title: title.into(),
            body: body.into(),
            payload: serde_json::Value::Null,
        }
    }
}
