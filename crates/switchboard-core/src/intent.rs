//! The closed intent set and the JSON-framed LLM structured response (spec §3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    #[serde(rename = "INFORMATION")]
    Information,
    #[serde(rename = "SALES_INQUIRY")]
    SalesInquiry,
    #[serde(rename = "SUPPORT")]
    Support,
    #[serde(rename = "GENERAL_CHAT")]
    GeneralChat,
    #[serde(rename = "PLACE_ORDER")]
    PlaceOrder,
    #[serde(rename = "UPDATE_ORDER")]
    UpdateOrder,
    #[serde(rename = "CHECK_QUANTITY")]
    CheckQuantity,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Information => "INFORMATION",
            Self::SalesInquiry => "SALES_INQUIRY",
            Self::Support => "SUPPORT",
            Self::GeneralChat => "GENERAL_CHAT",
            Self::PlaceOrder => "PLACE_ORDER",
            Self::UpdateOrder => "UPDATE_ORDER",
            Self::CheckQuantity => "CHECK_QUANTITY",
        }
    }

    /// Intents that may trigger the order side-effect engine (§4.4).
    pub fn is_order_related(self) -> bool {
        matches!(self, Self::PlaceOrder | Self::UpdateOrder | Self::CheckQuantity)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "INFORMATION" => Self::Information,
            "SALES_INQUIRY" => Self::SalesInquiry,
            "SUPPORT" => Self::Support,
            "GENERAL_CHAT" => Self::GeneralChat,
            "PLACE_ORDER" => Self::PlaceOrder,
            "UPDATE_ORDER" => Self::UpdateOrder,
            "CHECK_QUANTITY" => Self::CheckQuantity,
            _ => return None,
        })
    }
}

/// `thinking` block of the structured LLM response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thinking {
    pub intent: String,
    pub persona: Option<String>,
    pub reasoning: Option<String>,
    pub language: String,
}

/// The complete JSON object the LLM is prompted to emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredResponse {
    pub thinking: Thinking,
    pub intent: String,
    pub language: String,
    pub final_answer: String,
}
