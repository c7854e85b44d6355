//! Pagination types shared by all list endpoints

use crate::error::{PaginationInfo, ResponseMetadata};
use serde::{Deserialize, Deserializer};
use utoipa::{IntoParams, ToSchema};

/// Standard pagination parameters for list endpoints
///
/// Deserialized through serde's buffering path when flattened into a list
/// params struct, so the numeric fields parse from their string form.
#[derive(Debug, Deserialize, IntoParams, ToSchema, Clone)]
pub struct PaginationParams {
    #[param(example = 1, minimum = 1)]
    #[serde(default, deserialize_with = "u32_from_query")]
    pub page: Option<u32>,

    #[param(example = 20, minimum = 1, maximum = 100)]
    #[serde(default, deserialize_with = "u32_from_query")]
    pub page_size: Option<u32>,
}

fn u32_from_query<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl PaginationParams {
    /// Page number (defaults to 1, minimum 1)
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size (defaults to 20, clamped between 1 and 100)
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(20).clamp(1, 100)
    }

    /// Total pages given a total count
    pub fn total_pages(&self, total_count: i64) -> u32 {
        if total_count == 0 {
            return 1;
        }
        ((total_count as f64) / (f64::from(self.page_size()))).ceil() as u32
    }

    /// Response metadata with pagination info
    pub fn to_metadata(&self, total_count: i64) -> ResponseMetadata {
        let total_pages = self.total_pages(total_count);

        ResponseMetadata {
            pagination: Some(PaginationInfo {
                page: self.page() as i32,
                page_size: self.page_size() as i32,
                total_pages: total_pages as i32,
                has_next: self.page() < total_pages,
                has_previous: self.page() > 1,
            }),
            total_count: Some(total_count),
        }
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: Some(1),
            page_size: Some(20),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = PaginationParams {
            page: None,
            page_size: None,
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), 20);
    }

    #[test]
    fn clamping() {
        let params = PaginationParams {
            page: Some(0),
            page_size: Some(500),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), 100);
    }

    #[test]
    fn parses_numbers_arriving_as_strings() {
        let params: PaginationParams =
            serde_json::from_value(serde_json::json!({"page": "2", "page_size": "50"})).unwrap();
        assert_eq!(params.page(), 2);
        assert_eq!(params.page_size(), 50);

        let params: PaginationParams = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), 20);
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PaginationParams {
            page: Some(1),
            page_size: Some(20),
        };
        assert_eq!(params.total_pages(100), 5);
        assert_eq!(params.total_pages(101), 6);
        assert_eq!(params.total_pages(0), 1);
    }

    #[test]
    fn metadata_flags() {
        let params = PaginationParams {
            page: Some(2),
            page_size: Some(20),
        };
        let metadata = params.to_metadata(100);
        let pagination = metadata.pagination.unwrap();
        assert_eq!(pagination.total_pages, 5);
        assert!(pagination.has_next);
        assert!(pagination.has_previous);
        assert_eq!(metadata.total_count, Some(100));
    }

    #[test]
    fn metadata_single_page() {
        let params = PaginationParams {
            page: Some(1),
            page_size: Some(20),
        };
        let pagination = params.to_metadata(15).pagination.unwrap();
        assert_eq!(pagination.total_pages, 1);
        assert!(!pagination.has_next);
        assert!(!pagination.has_previous);
    }
}
