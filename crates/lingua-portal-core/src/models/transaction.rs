use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Description shown for every billed period.
pub const SUBSCRIPTION_DESCRIPTION: &str = "Malay Course Training - Monthly Subscription";

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionResponse {
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub stripe_customer_id: Option<String>,
    #[serde(default)]
    pub stripe_subscription_id: Option<String>,
    #[serde(default)]
    pub stripe_invoice_id: Option<String>,
    #[serde(default)]
    pub stripe_payment_intent_id: Option<String>,
    pub amount: String,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub receipt_url: Option<String>,
    #[serde(default)]
    pub invoice_pdf_url: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub stripe_created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Failed,
}

/// Anything other than `succeeded` counts as failed.
impl FromStr for PaymentStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == "succeeded" {
            PaymentStatus::Success
        } else {
            PaymentStatus::Failed
        })
    }
}

impl PaymentStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentStatus::Success => "Success",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl Transaction {
    pub fn payment_status(&self) -> PaymentStatus {
        self.status.parse().unwrap_or(PaymentStatus::Failed)
    }

    /// Amount in minor currency units, 0 when the backend sends garbage.
    pub fn amount_minor(&self) -> i64 {
        self.amount.trim().parse().unwrap_or(0)
    }

    pub fn description(&self) -> &'static str {
        SUBSCRIPTION_DESCRIPTION
    }
}

/// Response of the receipt endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptResponse {
    pub receipt: Receipt,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Receipt {
    pub receipt_url: String,
}
