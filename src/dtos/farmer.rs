use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateFarmerRequest {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

// Option<Option<T>>: outer None = not provided, Some(None) = clear the field
#[derive(Deserialize)]
pub struct UpdateFarmerRequest {
    pub name: Option<String>,
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub status: Option<String>,
}
