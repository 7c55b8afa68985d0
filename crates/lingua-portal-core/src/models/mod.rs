//! Data models for member portal entities.
//!
//! This module contains the data structures exchanged with the backend:
//!
//! - `User` and the login/profile request and response types
//! - `Subscription`: the member's current billing plan
//! - `Transaction`, `Receipt`: payment history
//! - `ContactForm`: public enquiry form

pub mod contact;
pub mod subscription;
pub mod transaction;
pub mod user;

pub use contact::{ContactForm, EnquiryProduct};
pub use subscription::{BillingInterval, Subscription, SubscriptionResponse, SubscriptionStatus};
pub use transaction::{PaymentStatus, Receipt, ReceiptResponse, Transaction, TransactionResponse};
pub use user::{LoginRequest, LoginResponse, PasswordChange, ProfileUpdate, User, UserQuery, UserResponse};
