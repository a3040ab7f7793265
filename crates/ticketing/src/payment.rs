use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eventhub_core::{DomainError, DomainResult, Entity, PaymentId, TicketId, UserId};

use crate::literal::literal_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
}

literal_enum!(PaymentMethod, "payment method", {
    Cash => "cash",
    Card => "card",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Approved,
    Declined,
    OutOfBalance,
}

literal_enum!(PaymentStatus, "payment status", {
    Pending => "pending",
    Approved => "approved",
    Declined => "declined",
    OutOfBalance => "out_of_balance",
});

pub const CARD_NUMBER_MAX_DIGITS: usize = 16;

/// Card data attached to a card payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    card_number: String,
    exp_date: String,
}

impl CardDetails {
    /// `card_number`: 1..=16 ASCII digits. `exp_date`: `MM/YY`.
    pub fn new(card_number: impl Into<String>, exp_date: impl Into<String>) -> DomainResult<Self> {
        let card_number = card_number.into();
        let exp_date = exp_date.into();

        if card_number.is_empty()
            || card_number.len() > CARD_NUMBER_MAX_DIGITS
            || !card_number.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(DomainError::validation(format!(
                "card_number must be 1..={CARD_NUMBER_MAX_DIGITS} digits"
            )));
        }

        let month = match exp_date.as_bytes() {
            [m1, m2, b'/', y1, y2] if [m1, m2, y1, y2].iter().all(|b| b.is_ascii_digit()) => {
                (m1 - b'0') * 10 + (m2 - b'0')
            }
            _ => return Err(DomainError::validation("exp_date must be formatted MM/YY")),
        };
        if !(1..=12).contains(&month) {
            return Err(DomainError::validation("exp_date month must be 01..12"));
        }

        Ok(Self {
            card_number,
            exp_date,
        })
    }

    pub fn card_number(&self) -> &str {
        &self.card_number
    }

    pub fn exp_date(&self) -> &str {
        &self.exp_date
    }

    /// Last four digits, for display.
    pub fn last4(&self) -> &str {
        let start = self.card_number.len().saturating_sub(4);
        &self.card_number[start..]
    }
}

/// A payment made by a user for a ticket.
///
/// # Invariants
/// - `card` is present exactly when `method` is `card`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub ticket_id: TicketId,
    pub amount: i64,
    pub method: PaymentMethod,
    pub card: Option<CardDetails>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        id: PaymentId,
        user_id: UserId,
        ticket_id: TicketId,
        amount: i64,
        method: PaymentMethod,
        card: Option<CardDetails>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if amount < 0 {
            return Err(DomainError::validation("amount must be >= 0"));
        }
        match (method, &card) {
            (PaymentMethod::Card, None) => {
                return Err(DomainError::validation("card payments require card details"));
            }
            (PaymentMethod::Cash, Some(_)) => {
                return Err(DomainError::validation("cash payments must not carry card details"));
            }
            _ => {}
        }

        Ok(Self {
            id,
            user_id,
            ticket_id,
            amount,
            method,
            card,
            status: PaymentStatus::default(),
            created_at,
        })
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
