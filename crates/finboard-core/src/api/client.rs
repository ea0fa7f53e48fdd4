//! API client for the finboard REST backend.
//!
//! Every request carries the session's current bearer token. A 401 triggers
//! exactly one token refresh through the `SessionStore` followed by one
//! retry of the original request; a second 401 is returned to the caller
//! as `RejectedAfterRefresh` with the session left in place.
//! Nothing else is retried.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::ApiError;
use crate::auth::{AuthError, SessionStore};
use crate::models::{
    Balance, BankStatement, EntryKind, Investment, InvestmentInput, NewStatement, Note, NoteInput,
    Transaction, TransactionInput, TransactionRecord, User,
};

/// Whether a request has already been through the refresh-and-retry path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Initial,
    Retried,
}

/// Authenticated API client.
/// Clone is cheap - the connection pool and session are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<SessionStore>) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, session))
    }

    /// Share an existing connection pool
    pub fn with_client(client: Client, base_url: &str, session: Arc<SessionStore>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request built by `build`, refreshing the token once on 401.
    ///
    /// `build` is called once per attempt so the retried request picks up
    /// the replaced token.
    async fn send<F>(&self, build: F) -> Result<reqwest::Response, ApiError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = Attempt::Initial;

        loop {
            let token = self.session.access_token().await;
            let mut request = build(&self.client);
            if let Some(ref token) = token {
                request = request.bearer_auth(token);
            }

            let response = request.send().await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Self::check_response(response).await;
            }

            match attempt {
                Attempt::Retried => {
                    warn!(url = %response.url(), "Request rejected again after token refresh");
                    return Err(ApiError::RejectedAfterRefresh);
                }
                Attempt::Initial => {
                    debug!(url = %response.url(), "Request unauthorized, refreshing token");
                    match self.session.refresh_access_token(token.as_deref()).await {
                        Ok(_) => attempt = Attempt::Retried,
                        // Nothing to refresh with: the session is gone, surface the 401
                        Err(AuthError::MissingRefreshToken) => return Err(ApiError::Unauthorized),
                        Err(e) => return Err(ApiError::Session(e)),
                    }
                }
            }
        }
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let url = response.url().to_string();
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", url, e)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self.send(|client| client.get(&url).query(query)).await?;
        Self::parse(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self.send(|client| client.post(&url).json(body)).await?;
        Self::parse(response).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self.send(|client| client.put(&url).json(body)).await?;
        Self::parse(response).await
    }

    /// PUT whose response body is ignored
    async fn put_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let url = self.url(path);
        self.send(|client| client.put(&url).json(body)).await?;
        Ok(())
    }

    async fn delete(&self, path: &str, body: Option<&serde_json::Value>) -> Result<(), ApiError> {
        let url = self.url(path);
        self.send(|client| {
            let request = client.delete(&url);
            match body {
                Some(body) => request.json(body),
                None => request,
            }
        })
        .await?;
        Ok(())
    }

    // ===== Bank Statements =====

    /// Fetch credit/debit totals for a user
    pub async fn fetch_balance(&self, user_id: i64) -> Result<Balance> {
        self.get("bank-statements/balance", &[("userId", user_id.to_string())])
            .await
            .context("Failed to fetch balance")
    }

    /// Fetch a user's statements, optionally restricted to one dashboard card
    pub async fn fetch_statements(
        &self,
        user_id: i64,
        kind: Option<EntryKind>,
    ) -> Result<Vec<BankStatement>> {
        let mut query = vec![("userId", user_id.to_string())];
        if let Some(kind) = kind {
            query.push(("entryId", kind.id().to_string()));
        }
        let statements: Vec<BankStatement> = self
            .get("bank-statements", &query)
            .await
            .context("Failed to fetch transactions")?;
        debug!(count = statements.len(), "Fetched bank statements");
        Ok(statements)
    }

    pub async fn create_statement(&self, statement: &NewStatement) -> Result<BankStatement> {
        self.post("bank-statements", statement)
            .await
            .context("Failed to create transaction")
    }

    pub async fn delete_statement(&self, id: i64) -> Result<()> {
        self.delete(&format!("bank-statements/{}", id), None)
            .await
            .context("Failed to delete transaction")
    }

    // ===== Transactions =====

    pub async fn fetch_transactions(&self, user_id: Option<i64>) -> Result<Vec<Transaction>> {
        let query: Vec<(&str, String)> = user_id
            .map(|id| vec![("userId", id.to_string())])
            .unwrap_or_default();
        let records: Vec<TransactionRecord> = self
            .get("transactions", &query)
            .await
            .context("Failed to fetch transactions")?;
        Ok(records.into_iter().map(Transaction::from).collect())
    }

    pub async fn fetch_transaction(&self, id: i64) -> Result<Transaction> {
        let record: TransactionRecord = self
            .get(&format!("transactions/{}", id), &[])
            .await
            .context("Failed to fetch transaction")?;
        Ok(record.into())
    }

    pub async fn create_transaction(&self, input: &TransactionInput) -> Result<Transaction> {
        let record: TransactionRecord = self
            .post("transactions", input)
            .await
            .context("Failed to create transaction")?;
        Ok(record.into())
    }

    pub async fn update_transaction(&self, id: i64, input: &TransactionInput) -> Result<Transaction> {
        let record: TransactionRecord = self
            .put(&format!("transactions/{}", id), input)
            .await
            .context("Failed to update transaction")?;
        Ok(record.into())
    }

    pub async fn delete_transaction(&self, id: i64) -> Result<()> {
        self.delete(&format!("transactions/{}", id), None)
            .await
            .context("Failed to delete transaction")
    }

    // ===== Investments =====

    pub async fn fetch_investments(&self) -> Result<Vec<Investment>> {
        self.get("investments", &[])
            .await
            .context("Failed to fetch investments")
    }

    pub async fn create_investment(&self, input: &InvestmentInput) -> Result<Investment> {
        self.post("investments", input)
            .await
            .context("Failed to create investment")
    }

    pub async fn update_investment(&self, id: i64, input: &InvestmentInput) -> Result<Investment> {
        let input = InvestmentInput {
            id: Some(id),
            ..input.clone()
        };
        self.put(&format!("investments/{}", id), &input)
            .await
            .context("Failed to update investment")
    }

    pub async fn delete_investment(&self, id: i64) -> Result<()> {
        self.delete(&format!("investments/{}", id), None)
            .await
            .context("Failed to delete investment")
    }

    // ===== Notes =====

    pub async fn fetch_notes(&self) -> Result<Vec<Note>> {
        self.get("notes", &[]).await.context("Failed to fetch notes")
    }

    pub async fn create_note(&self, text: &str, due_date: Option<String>) -> Result<Note> {
        let input = NoteInput {
            note_id: None,
            note: text.to_string(),
            due_date,
        };
        self.post("notes/create", &input)
            .await
            .context("Failed to create note")
    }

    pub async fn update_note(&self, id: i64, text: &str, due_date: Option<String>) -> Result<Note> {
        let input = NoteInput {
            note_id: Some(id),
            note: text.to_string(),
            due_date,
        };
        self.put("notes/update", &input)
            .await
            .context("Failed to update note")
    }

    pub async fn delete_note(&self, id: i64) -> Result<()> {
        let body = serde_json::json!({ "noteId": id });
        self.delete("notes/delete", Some(&body))
            .await
            .context("Failed to delete note")
    }

    // ===== Users =====

    pub async fn fetch_user(&self, user_id: i64) -> Result<User> {
        self.get(&format!("users/{}", user_id), &[])
            .await
            .context("Failed to fetch user")
    }

    /// Replace the free-form metadata blob stored for a user
    pub async fn put_meta(&self, user_id: i64, meta: &serde_json::Value) -> Result<()> {
        let body = serde_json::json!({ "meta": meta });
        self.put_unit(&format!("users/{}/meta", user_id), &body)
            .await
            .context("Failed to update user metadata")
    }
}
