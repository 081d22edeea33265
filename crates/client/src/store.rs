//! Low-level REST client for the store's table surface.
//!
//! The store exposes one endpoint per logical table
//! (`/rest/v1/{table}`) supporting equality-filtered selects with optional
//! ordering and relation embedding, insert/update with
//! `Prefer: return=representation`, and delete. [`TableClient`] wraps that
//! surface with [`reqwest`]; the typed entity mapping lives in
//! [`directory`](crate::directory).

use serde_json::Value;

use crate::error::StoreError;

/// Builder for a table select: projected columns, equality filters,
/// embed-presence filters and ordering.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    columns: String,
    eq: Vec<(String, String)>,
    not_null: Vec<String>,
    order: Vec<String>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self {
            columns: "*".into(),
            ..Default::default()
        }
    }

    /// Project specific columns, including embedded relations, e.g.
    /// `"id,proficiency_level,skills(name,category)"`.
    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    /// Add an equality filter on `column`.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.eq.push((column.into(), value.into()));
        self
    }

    /// Require an embedded relation to be present
    /// (`column=not.is.null`).
    pub fn embed_present(mut self, column: impl Into<String>) -> Self {
        self.not_null.push(column.into());
        self
    }

    /// Append an ascending order term; multiple calls order by the columns
    /// in sequence.
    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order.push(format!("{}.asc", column.into()));
        self
    }

    /// Render the builder as URL query pairs.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];
        for (column, value) in &self.eq {
            pairs.push((column.clone(), format!("eq.{value}")));
        }
        for column in &self.not_null {
            pairs.push((column.clone(), "not.is.null".to_string()));
        }
        if !self.order.is_empty() {
            pairs.push(("order".to_string(), self.order.join(",")));
        }
        pairs
    }
}

/// HTTP client for the store's table endpoints.
pub struct TableClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TableClient {
    /// Create a client for the store at `base_url` (no trailing slash
    /// required), authenticating with the project API key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    /// Create a client reusing an existing [`reqwest::Client`] (connection
    /// pooling across collaborators).
    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            api_key: api_key.into(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Attach the auth headers and dispatch. The bearer token is the
    /// session's access token when one exists, falling back to the API key.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, StoreError> {
        let token = bearer.unwrap_or(&self.api_key);
        request
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))
    }

    /// Equality-filtered select, returning raw row objects.
    pub async fn select(
        &self,
        table: &str,
        query: &SelectQuery,
        bearer: Option<&str>,
    ) -> Result<Vec<Value>, StoreError> {
        let request = self.http.get(self.table_url(table)).query(&query.to_query());
        let response = self.send(request, bearer).await?;
        let response = Self::ensure_success(response).await?;
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Insert one row and return it as represented by the store. `returning`
    /// selects the representation columns (embeds allowed).
    pub async fn insert(
        &self,
        table: &str,
        row: &Value,
        returning: &str,
        bearer: Option<&str>,
    ) -> Result<Value, StoreError> {
        let request = self
            .http
            .post(self.table_url(table))
            .query(&[("select", returning)])
            .header("Prefer", "return=representation")
            .json(row);
        let response = self.send(request, bearer).await?;
        let response = Self::ensure_success(response).await?;
        Self::single_row(response, table).await
    }

    /// Update rows matching `filter_column = filter_value` and return the
    /// updated row.
    pub async fn update(
        &self,
        table: &str,
        filter_column: &str,
        filter_value: &str,
        patch: &Value,
        bearer: Option<&str>,
    ) -> Result<Value, StoreError> {
        let request = self
            .http
            .patch(self.table_url(table))
            .query(&[(filter_column, format!("eq.{filter_value}"))])
            .header("Prefer", "return=representation")
            .json(patch);
        let response = self.send(request, bearer).await?;
        let response = Self::ensure_success(response).await?;
        Self::single_row(response, table).await
    }

    /// Delete rows matching `filter_column = filter_value`.
    pub async fn delete(
        &self,
        table: &str,
        filter_column: &str,
        filter_value: &str,
        bearer: Option<&str>,
    ) -> Result<(), StoreError> {
        let request = self
            .http
            .delete(self.table_url(table))
            .query(&[(filter_column, format!("eq.{filter_value}"))]);
        let response = self.send(request, bearer).await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    // ---- private helpers ----

    /// Map a non-success response into a [`StoreError`], keeping the
    /// store's message verbatim. Unique-violation answers (HTTP 409, or the
    /// store's duplicate-key code in the body) become
    /// [`StoreError::Conflict`].
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let message = extract_message(&body);

        if status.as_u16() == 409 || body.contains("23505") {
            return Err(StoreError::Conflict(message));
        }
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Representation responses come back as a one-element array.
    async fn single_row(response: reqwest::Response, table: &str) -> Result<Value, StoreError> {
        let mut rows = response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        if rows.is_empty() {
            tracing::warn!(table, "Write returned no representation row");
            return Err(StoreError::NotFound { entity: "row" });
        }
        Ok(rows.remove(0))
    }
}

/// Pull the `message` field out of a JSON error body, falling back to the
/// raw text.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}
