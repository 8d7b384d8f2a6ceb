//! REST access to the hosted backend tables.
//!
//! The backend exposes each table under `/rest/v1/<table>` and takes filters
//! as query parameters (`user_id=eq.<uuid>`). Every request carries the
//! project's anon key; once a user signs in their access token replaces the
//! anon key as the bearer credential.

use std::fmt::Display;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chlorofill_core::{
    BackendError, ContentType, CreationUpdate, FavoriteRow, NewCreation, UserCreation, UserId,
};
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::store::{CreationsStore, FavoritesStore, CREATIONS_TABLE, FAVORITES_TABLE};

const FAVORITES_CONFLICT_TARGET: &str = "user_id,item_id,item_type";

pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl RestBackend {
    pub fn new(
        base_url: &str,
        anon_key: &str,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self::from_client(client, base_url, anon_key))
    }

    pub fn from_client(client: reqwest::Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: RwLock::new(None),
        }
    }

    /// Use `token` as the bearer credential; `None` reverts to the anon key.
    pub fn set_access_token(&self, token: Option<String>) {
        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| self.anon_key.clone());
        request
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", bearer))
    }

    async fn send(
        &self,
        request: RequestBuilder,
        table: &str,
        on_error: fn(&str, String) -> BackendError,
    ) -> Result<Response, BackendError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| on_error(table, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::NotAuthenticated);
        }
        let body = response.text().await.unwrap_or_default();
        Err(on_error(table, format!("HTTP {}: {}", status.as_u16(), body)))
    }

    async fn read_rows<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        table: &str,
    ) -> Result<Vec<T>, BackendError> {
        let response = self.send(request, table, read_failed).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| read_failed(table, e.to_string()))
    }

    /// Write and decode the rows the backend echoes back.
    async fn write_returning<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        table: &str,
    ) -> Result<Vec<T>, BackendError> {
        let request = request.header("Prefer", "return=representation");
        let response = self.send(request, table, write_failed).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| write_failed(table, e.to_string()))
    }
}

fn read_failed(table: &str, reason: String) -> BackendError {
    BackendError::RemoteReadFailed {
        table: table.to_string(),
        reason,
    }
}

fn write_failed(table: &str, reason: String) -> BackendError {
    BackendError::RemoteWriteFailed {
        table: table.to_string(),
        reason,
    }
}

fn eq(value: impl Display) -> String {
    format!("eq.{}", value)
}

/// Characters that would break out of an `or=(...)` filter expression.
fn filter_safe(query: &str) -> String {
    query
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '{' | '}' | '*' | '"'))
        .collect()
}

#[derive(Serialize)]
struct CreationInsert<'a> {
    user_id: UserId,
    #[serde(flatten)]
    creation: &'a NewCreation,
}

#[async_trait]
impl FavoritesStore for RestBackend {
    async fn upsert_favorites(&self, rows: &[FavoriteRow]) -> Result<(), BackendError> {
        if rows.is_empty() {
            return Ok(());
        }
        let request = self
            .client
            .post(self.table_url(FAVORITES_TABLE))
            .query(&[("on_conflict", FAVORITES_CONFLICT_TARGET)])
            .header("Prefer", "resolution=merge-duplicates")
            .json(rows);
        self.send(request, FAVORITES_TABLE, write_failed).await?;
        tracing::debug!(rows = rows.len(), "favorites upserted");
        Ok(())
    }

    async fn delete_favorite(
        &self,
        user_id: UserId,
        item_id: &str,
        item_type: ContentType,
    ) -> Result<(), BackendError> {
        let request = self.client.delete(self.table_url(FAVORITES_TABLE)).query(&[
            ("user_id", eq(user_id)),
            ("item_id", eq(item_id)),
            ("item_type", eq(item_type.as_db_str())),
        ]);
        self.send(request, FAVORITES_TABLE, write_failed).await?;
        Ok(())
    }

    async fn list_favorites(&self, user_id: UserId) -> Result<Vec<FavoriteRow>, BackendError> {
        let request = self.client.get(self.table_url(FAVORITES_TABLE)).query(&[
            ("select", "user_id,item_id,item_type".to_string()),
            ("user_id", eq(user_id)),
        ]);
        self.read_rows(request, FAVORITES_TABLE).await
    }
}

#[async_trait]
impl CreationsStore for RestBackend {
    async fn list_creations(&self, user_id: UserId) -> Result<Vec<UserCreation>, BackendError> {
        let request = self.client.get(self.table_url(CREATIONS_TABLE)).query(&[
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("order", "created_at.desc".to_string()),
        ]);
        self.read_rows(request, CREATIONS_TABLE).await
    }

    async fn insert_creation(
        &self,
        user_id: UserId,
        creation: &NewCreation,
    ) -> Result<UserCreation, BackendError> {
        let body = CreationInsert { user_id, creation };
        let request = self.client.post(self.table_url(CREATIONS_TABLE)).json(&body);
        self.write_returning::<UserCreation>(request, CREATIONS_TABLE)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| write_failed(CREATIONS_TABLE, "insert returned no row".to_string()))
    }

    async fn update_creation(
        &self,
        user_id: UserId,
        id: Uuid,
        update: &CreationUpdate,
    ) -> Result<UserCreation, BackendError> {
        let request = self
            .client
            .patch(self.table_url(CREATIONS_TABLE))
            .query(&[("id", eq(id)), ("user_id", eq(user_id))])
            .json(update);
        self.write_returning::<UserCreation>(request, CREATIONS_TABLE)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound {
                table: CREATIONS_TABLE.to_string(),
                id: id.to_string(),
            })
    }

    async fn delete_creation(&self, user_id: UserId, id: Uuid) -> Result<(), BackendError> {
        let request = self
            .client
            .delete(self.table_url(CREATIONS_TABLE))
            .query(&[("id", eq(id)), ("user_id", eq(user_id))]);
        self.send(request, CREATIONS_TABLE, write_failed).await?;
        Ok(())
    }

    async fn get_public_creation(&self, id: Uuid) -> Result<Option<UserCreation>, BackendError> {
        let request = self.client.get(self.table_url(CREATIONS_TABLE)).query(&[
            ("select", "*".to_string()),
            ("id", eq(id)),
            ("is_public", eq(true)),
        ]);
        Ok(self
            .read_rows::<UserCreation>(request, CREATIONS_TABLE)
            .await?
            .into_iter()
            .next())
    }

    async fn search_public_creations(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<UserCreation>, BackendError> {
        let term = filter_safe(query.trim());
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let request = self.client.get(self.table_url(CREATIONS_TABLE)).query(&[
            ("select", "*".to_string()),
            ("is_public", eq(true)),
            (
                "or",
                format!(
                    "(title.ilike.*{t}*,description.ilike.*{t}*,tags.cs.{{{t}}})",
                    t = term
                ),
            ),
            ("limit", limit.to_string()),
        ]);
        self.read_rows(request, CREATIONS_TABLE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_safe_strips_expression_syntax() {
        assert_eq!(filter_safe("mac (and) cheese, please"), "mac and cheese please");
        assert_eq!(filter_safe("{vegan}*"), "vegan");
        assert_eq!(filter_safe("paneer"), "paneer");
    }

    #[test]
    fn test_access_token_swaps_bearer() {
        let backend = RestBackend::from_client(reqwest::Client::new(), "http://x/", "anon");
        assert!(!backend.has_access_token());
        backend.set_access_token(Some("jwt".to_string()));
        assert!(backend.has_access_token());
        backend.set_access_token(None);
        assert!(!backend.has_access_token());
        assert_eq!(backend.table_url("user_favorites"), "http://x/rest/v1/user_favorites");
    }
}
