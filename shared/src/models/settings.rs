//! Company Settings Model (single row)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySettings {
    pub company_name: String,
    pub logo_url: Option<String>,
    pub contact_email: Option<String>,
    pub updated_at: i64,
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            company_name: "Agro Norte Corp".to_string(),
            logo_url: None,
            contact_email: None,
            updated_at: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanySettingsUpdate {
    pub company_name: Option<String>,
    pub logo_url: Option<String>,
    pub contact_email: Option<String>,
}
