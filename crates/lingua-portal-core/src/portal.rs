//! Member portal operations: profile, password, subscription, payment
//! history and receipts. Everything here requires a signed-in session.

use chrono::{Duration, NaiveDate, SecondsFormat};
use tracing::{debug, info};

use crate::api::ApiError;
use crate::auth::AuthenticatedApi;
use crate::models::{
    PasswordChange, ProfileUpdate, ReceiptResponse, Subscription, SubscriptionResponse, Transaction,
    TransactionResponse,
};

const PROFILE_ENDPOINT: &str = "/user/profile";
const PASSWORD_ENDPOINT: &str = "/user/password";
const SUBSCRIPTION_ENDPOINT: &str = "/user/subscription";
const TRANSACTIONS_ENDPOINT: &str = "/transaction/list";
const RECEIPT_ENDPOINT: &str = "/receipt";
const LATEST_RECEIPT_ENDPOINT: &str = "/receipt/latest";

#[derive(Clone)]
pub struct MemberPortal {
    api: AuthenticatedApi,
}

impl MemberPortal {
    pub fn new(api: AuthenticatedApi) -> Self {
        Self { api }
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        self.api.put_json(PROFILE_ENDPOINT, update).await?;
        info!("Profile updated");
        Ok(())
    }

    /// Checked locally before anything is sent.
    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), ApiError> {
        change
            .validate()
            .map_err(|msg| ApiError::Validation(msg.to_string()))?;
        self.api.put_json(PASSWORD_ENDPOINT, &change.body()).await?;
        info!("Password updated");
        Ok(())
    }

    /// `None` when the subscription has no billing items.
    pub async fn fetch_subscription(&self) -> Result<Option<Subscription>, ApiError> {
        let response: SubscriptionResponse = self.api.get_json(SUBSCRIPTION_ENDPOINT).await?;
        Ok(response.to_subscription())
    }

    pub async fn list_transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        let response: TransactionResponse = self.api.get_json(TRANSACTIONS_ENDPOINT).await?;
        debug!(count = response.transactions.len(), "Fetched transactions");
        Ok(response.transactions)
    }

    /// Receipt for the UTC day containing a transaction.
    pub async fn receipt_url_for_day(&self, day: NaiveDate) -> Result<String, ApiError> {
        let endpoint = receipt_endpoint(day);
        let response: ReceiptResponse = self.api.get_json(&endpoint).await?;
        Ok(response.receipt.receipt_url)
    }

    pub async fn latest_receipt_url(&self) -> Result<String, ApiError> {
        let response: ReceiptResponse = self.api.get_json(LATEST_RECEIPT_ENDPOINT).await?;
        Ok(response.receipt.receipt_url)
    }
}

/// `[day 00:00 UTC, next day 00:00 UTC)` as ISO-8601 query parameters
fn receipt_endpoint(day: NaiveDate) -> String {
    let start = day.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let end = start + Duration::days(1);
    format!(
        "{}?startDate={}&endDate={}",
        RECEIPT_ENDPOINT,
        start.to_rfc3339_opts(SecondsFormat::Millis, true),
        end.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}
