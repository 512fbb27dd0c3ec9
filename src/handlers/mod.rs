// handlers/mod.rs - thin axum adapters over the services
//
// Public: /health, /api/auth/*
// Authenticated + role gated: /api/users/*, /api/assets/*

pub mod assets;
pub mod auth;
pub mod health;
pub mod users;

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::filter::Page;

/// JSON body extractor whose rejection uses the API error envelope
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::from(rejection))?;
        Ok(Self(value))
    }
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("invalid {} id: {}", what, raw)))
}

/// Query string parameters of list endpoints. Multi-valued keys may repeat
/// (`role=a&role=b`) or be comma-separated (`role=a,b`).
#[derive(Debug, Default)]
pub(crate) struct ListParams {
    values: HashMap<String, Vec<String>>,
}

impl ListParams {
    pub fn parse(raw: Option<&str>) -> Self {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            values.entry(key.into_owned()).or_default().push(value.into_owned());
        }
        Self { values }
    }

    /// First non-blank value of `key`, trimmed
    pub fn text(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)?
            .iter()
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }

    pub fn one<T: FromStr>(&self, key: &str) -> Result<Option<T>, ApiError>
    where
        T::Err: std::fmt::Display,
    {
        self.text(key)
            .map(|v| v.parse::<T>().map_err(|e| ApiError::bad_request(format!("invalid {}: {}", key, e))))
            .transpose()
    }

    pub fn many<T: FromStr>(&self, key: &str) -> Result<Vec<T>, ApiError>
    where
        T::Err: std::fmt::Display,
    {
        self.values
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| v.parse::<T>().map_err(|e| ApiError::bad_request(format!("invalid {}: {}", key, e))))
            .collect()
    }

    /// `page`/`limit` window; unparsable numbers fall back like missing ones
    pub fn page(&self, api: &ApiConfig) -> Page {
        let number = |key: &str| self.text(key).and_then(|v| v.parse::<i64>().ok());
        Page::new(number("page"), number("limit"), api.default_page_size, api.max_page_size)
    }
}
