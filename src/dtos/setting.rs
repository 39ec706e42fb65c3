use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct CreateSettingRequest {
    pub key: String,
    pub value: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateSettingRequest {
    pub value: Option<String>,
    pub category: Option<Option<String>>,
    pub description: Option<Option<String>>,
}

#[derive(Deserialize)]
pub struct UpsertSettingRequest {
    pub value: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// The well-known keys surfaced as one convenience document.
#[derive(Serialize)]
pub struct AppSettings {
    pub currency: String,
    pub theme: String,
    pub company_name: String,
    pub company_email: String,
    pub company_phone: String,
    pub company_address: String,
}

#[derive(Deserialize)]
pub struct UpdateAppSettingsRequest {
    pub currency: Option<String>,
    pub theme: Option<String>,
    pub company_name: Option<String>,
    pub company_email: Option<String>,
    pub company_phone: Option<String>,
    pub company_address: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
