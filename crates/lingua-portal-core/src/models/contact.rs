use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Products a visitor can enquire about on the public contact form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnquiryProduct {
    Malay,
    Culture,
    Company,
}

impl FromStr for EnquiryProduct {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "malay" => Ok(EnquiryProduct::Malay),
            "culture" => Ok(EnquiryProduct::Culture),
            "company" => Ok(EnquiryProduct::Company),
            other => Err(format!("Unknown product '{}' (expected malay, culture or company)", other)),
        }
    }
}

impl EnquiryProduct {

    /// Label sent to the form endpoint
    pub fn label(&self) -> &'static str {
        match self {
            EnquiryProduct::Malay => "Malay Conversation Training",
            EnquiryProduct::Culture => "Cultural Exchange Activities",
            EnquiryProduct::Company => "Company Training",
        }
    }
}

/// Public contact form submission. No authentication.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContactForm {
    pub email: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(rename = "phoneNo")]
    pub phone_no: String,
    /// Human readable label, empty when nothing was selected
    #[serde(rename = "enquiryProduct")]
    pub enquiry_product: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    pub fn set_product(&mut self, product: Option<EnquiryProduct>) {
        self.enquiry_product = product.map(|p| p.label().to_string()).unwrap_or_default();
    }

    /// Presence check on the fields the form marks as required.
    pub fn validate(&self) -> Result<(), String> {
        let missing: Vec<&str> = [
            ("email", &self.email),
            ("fullName", &self.full_name),
            ("subject", &self.subject),
            ("message", &self.message),
        ]
        .iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("Missing required fields: {}", missing.join(", ")))
        }
    }
}
