//! Achievements Gallery Model

use serde::{Deserialize, Serialize};

use super::area::Area;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryPost {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Public URL returned by object storage
    pub image_url: String,
    pub area: Area,
    pub author_id: i64,
    pub author_name: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryPostCreate {
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    /// Defaults to the author's area
    pub area: Option<Area>,
}
