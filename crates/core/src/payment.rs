use serde::{Deserialize, Serialize};

/// How a buyer or member paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Cash,
    Check,
    Card,
    Transfer,
}

impl PaymentType {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentType::Cash => "cash",
            PaymentType::Check => "check",
            PaymentType::Card => "card",
            PaymentType::Transfer => "transfer",
        }
    }
}
