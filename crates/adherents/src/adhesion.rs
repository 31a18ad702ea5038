use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use membership_core::{AdhesionId, PaymentType};

/// Kind of membership paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdhesionType {
    Simple,
    /// Supporting membership (higher fee).
    Support,
}

/// One membership period. Valid for a year from `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adhesion {
    pub id: AdhesionId,
    pub kind: AdhesionType,
    pub date: NaiveDate,
    pub payment_type: Option<PaymentType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdhesion {
    pub kind: AdhesionType,
    pub date: NaiveDate,
    #[serde(default)]
    pub payment_type: Option<PaymentType>,
}

impl Adhesion {
    pub fn new(id: AdhesionId, input: NewAdhesion) -> Self {
        Self {
            id,
            kind: input.kind,
            date: input.date,
            payment_type: input.payment_type,
        }
    }

    /// Last day covered (one year after the adhesion date).
    pub fn end_date(&self) -> NaiveDate {
        self.date
            .checked_add_months(Months::new(12))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Traffic-light view of a member's situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdhesionStatus {
    /// Never joined.
    None,
    /// Membership expired.
    Red,
    /// Expires within a month.
    Orange,
    Green,
}

impl AdhesionStatus {
    /// Status given the most recent adhesion (if any) on `today`.
    pub fn of(latest: Option<&Adhesion>, today: NaiveDate) -> Self {
        let Some(adhesion) = latest else {
            return AdhesionStatus::None;
        };
        let end = adhesion.end_date();
        let warning = today
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        if end < today {
            AdhesionStatus::Red
        } else if end < warning {
            AdhesionStatus::Orange
        } else {
            AdhesionStatus::Green
        }
    }
}
