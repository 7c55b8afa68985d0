use serde::{Deserialize, Serialize};

/// Response of `GET /user/subscription`
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionResponse {
    #[serde(default)]
    pub success: bool,
    pub subscription: SubscriptionApi,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionApi {
    pub id: String,
    pub customer: String,
    pub status: SubscriptionStatus,
    pub currency: String,
    pub items: SubscriptionItems,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    pub current_period_start: i64,
    pub current_period_end: i64,
    pub price: SubscriptionPrice,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionPrice {
    pub unit_amount: i64,
    pub recurring: Recurring,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recurring {
    pub interval: BillingInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Incomplete,
    PastDue,
    Canceled,
    Unpaid,
}

impl SubscriptionStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Incomplete => "Incomplete",
            SubscriptionStatus::PastDue => "Past due",
            SubscriptionStatus::Canceled => "Canceled",
            SubscriptionStatus::Unpaid => "Unpaid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    Month,
    Year,
}

/// Flattened view of the member's subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    pub id: String,
    pub customer_id: String,
    pub status: SubscriptionStatus,
    /// Price in minor currency units
    pub amount: i64,
    pub currency: String,
    /// UNIX timestamp (seconds)
    pub current_period_start: i64,
    /// UNIX timestamp (seconds)
    pub current_period_end: i64,
    pub interval: BillingInterval,
}

impl SubscriptionResponse {
    /// Flatten using the first subscription item. `None` when the
    /// subscription carries no items.
    pub fn to_subscription(&self) -> Option<Subscription> {
        let sub = &self.subscription;
        let item = sub.items.data.first()?;
        Some(Subscription {
            id: sub.id.clone(),
            customer_id: sub.customer.clone(),
            status: sub.status,
            amount: item.price.unit_amount,
            currency: sub.currency.clone(),
            current_period_start: item.current_period_start,
            current_period_end: item.current_period_end,
            interval: item.price.recurring.interval,
        })
    }
}
