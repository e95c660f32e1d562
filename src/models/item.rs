//! Listing records and downloaded covers.

use serde::{Deserialize, Serialize};

/// One movie entry from the listing API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemRecord {
    /// Subject identifier
    pub id: String,

    /// Display title, may contain characters that are illegal in filenames
    pub title: String,

    /// Cover image URL
    #[serde(rename = "cover")]
    pub cover_url: String,

    /// Cover width in pixels
    #[serde(default)]
    pub cover_x: i64,

    /// Rating as shown on the site (often empty for new releases)
    #[serde(default)]
    pub rate: String,

    /// Detail page URL
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub is_new: bool,

    #[serde(default)]
    pub playable: bool,
}

/// Top-level listing response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingPage {
    #[serde(default)]
    pub subjects: Vec<ItemRecord>,
}

impl ListingPage {
    /// Decode a raw listing response.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }
}

/// A downloaded cover, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Filesystem-safe name derived from the item title
    pub key: String,

    /// Id of the item the cover belongs to
    pub item_id: String,

    /// Raw image bytes
    pub payload: Vec<u8>,
}

/// One listing page to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    /// Zero-based page number
    pub index: u32,
    /// Value of `page_start`
    pub offset: u32,
    /// Value of `page_limit`
    pub limit: u32,
}

impl PageRequest {
    pub fn new(index: u32, page_size: u32) -> Self {
        Self {
            index,
            offset: index.saturating_mul(page_size),
            limit: page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_listing() {
        let body = br#"{"subjects":[{
            "cover": "https://img.example.com/p1.jpg",
            "cover_x": 1080,
            "id": "35267208",
            "is_new": false,
            "playable": true,
            "rate": "8.1",
            "title": "AC/DC: Let There Be Rock",
            "url": "https://movie.example.com/subject/35267208/"
        }]}"#;

        let page = ListingPage::from_slice(body).unwrap();
        assert_eq!(page.subjects.len(), 1);

        let item = &page.subjects[0];
        assert_eq!(item.id, "35267208");
        assert_eq!(item.cover_url, "https://img.example.com/p1.jpg");
        assert_eq!(item.cover_x, 1080);
        assert!(item.playable);
        assert!(!item.is_new);
    }

    #[test]
    fn test_decode_missing_subjects_is_empty() {
        let page = ListingPage::from_slice(b"{}").unwrap();
        assert!(page.subjects.is_empty());
    }

    #[test]
    fn test_decode_rejects_html() {
        assert!(ListingPage::from_slice(b"<html>blocked</html>").is_err());
    }

    #[test]
    fn test_page_request_offset() {
        let req = PageRequest::new(3, 20);
        assert_eq!(req.offset, 60);
        assert_eq!(req.limit, 20);
    }
}
