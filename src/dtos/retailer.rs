use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateRetailerRequest {
    pub name: String,
    pub owner_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateRetailerRequest {
    pub name: Option<String>,
    pub owner_name: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub status: Option<String>,
}
