use serde::{Deserialize, Serialize};

/// Value of the envelope `code` field. Every response travels as HTTP 200; this field
/// carries the outcome instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseCode {
    Ok,
    Created,
    BadRequest,
    ValidationError,
    ConfigurationError,
    InternalServerError,
    ServiceUnavailable,
    ProjectNotFound,
    TraitNotFound,
    AbilityNotFound,
    CharacterNotFound,
    NationNotFound,
}

/// Standard response wrapper: `{ data, error, code, message }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub data: T,
    pub error: bool,
    pub code: ResponseCode,
    pub message: String,
}

impl<T> ResponseEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self::success(data, ResponseCode::Ok)
    }

    pub fn created(data: T) -> Self {
        Self::success(data, ResponseCode::Created)
    }

    pub fn success(data: T, code: ResponseCode) -> Self {
        Self {
            data,
            error: false,
            code,
            message: String::new(),
        }
    }

    pub fn failure_with(data: T, code: ResponseCode, message: impl Into<String>) -> Self {
        Self {
            data,
            error: true,
            code,
            message: message.into(),
        }
    }
}

impl<T> ResponseEnvelope<Option<T>> {
    pub fn failure(code: ResponseCode, message: impl Into<String>) -> Self {
        Self::failure_with(None, code, message)
    }
}

/// Paged list payload carried in `data` of list responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<T> {
    pub list: Vec<T>,
    pub total_cnt: i64,
    pub page_size: i64,
    pub page: i64,
    pub total_page: i64,
    pub is_first: bool,
    pub is_last: bool,
}

impl<T> ListPage<T> {
    pub const DEFAULT_PAGE_SIZE: i64 = 10;

    pub fn new(list: Vec<T>, total_cnt: i64, page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size.unwrap_or(Self::DEFAULT_PAGE_SIZE).max(1);
        let total = total_cnt.max(0);
        let total_page = (total / page_size + i64::from(total % page_size != 0)).max(1);
        Self {
            list,
            total_cnt,
            page_size,
            page,
            total_page,
            is_first: page <= 1,
            is_last: page >= total_page,
        }
    }
}

/// Search and paging parameters accepted by every list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_keyword: Option<String>,
    /// Canonical field name to search in; absent means every searchable field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_type: Option<String>,
    /// Parent project filter for project-scoped entities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prj_no: Option<i64>,
}
