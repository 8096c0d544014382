use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one spin request. Only the most recently issued token is honoured.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(pub u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// The server-declared result of one spin request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Outcome {
    pub outcome_id: Option<String>,
    pub declared_loss: bool,
    pub request_token: RequestToken,
}

impl Outcome {
    pub fn prize(outcome_id: impl Into<String>, request_token: RequestToken) -> Self {
        Self {
            outcome_id: Some(outcome_id.into()),
            declared_loss: false,
            request_token,
        }
    }

    pub fn loss(request_token: RequestToken) -> Self {
        Self {
            outcome_id: None,
            declared_loss: true,
            request_token,
        }
    }

    pub fn unresolvable(request_token: RequestToken) -> Self {
        Self {
            outcome_id: None,
            declared_loss: false,
            request_token,
        }
    }
}

// === API Types ===

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpinStatus {
    Lose,
    Pending,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Prize {
    pub chance_id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SpinRequest {
    pub case_id: String,
    pub timestamp: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpinResponse {
    pub spin_id: String,
    pub status: SpinStatus,
    #[serde(default)]
    pub prize: Option<Prize>,
}

impl SpinResponse {
    pub fn into_outcome(self, request_token: RequestToken) -> Outcome {
        match (self.status, self.prize) {
            (SpinStatus::Lose, _) => Outcome::loss(request_token),
            (SpinStatus::Pending, Some(prize)) => Outcome::prize(prize.chance_id, request_token),
            (status, _) => {
                log::warn!(
                    "Spin {} returned status {:?} without a usable prize",
                    self.spin_id,
                    status
                );
                Outcome::unresolvable(request_token)
            }
        }
    }
}
