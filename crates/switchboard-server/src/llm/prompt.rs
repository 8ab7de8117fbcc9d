//! Builds the system and user prompts handed to the LLM, assembling
//! the retrieved context, recent scratch turns, and the tagged-JSON
//! response contract in one place.

use switchboard_scratch::{Role, Turn};

pub const RESPONSE_CONTRACT: &str = r#"You must reply with a single JSON object and nothing else, matching exactly this shape:
{"thinking":{"intent":"<INTENT>","persona":"<persona or null>","reasoning":"<short reasoning or null>","language":"<ISO 639-1>"},"intent":"<INTENT>","language":"<ISO 639-1>","final_answer":"<the reply shown to the user>"}
<INTENT> is one of: INFORMATION, SALES_INQUIRY, SUPPORT, GENERAL_CHAT, PLACE_ORDER, UPDATE_ORDER, CHECK_QUANTITY.
Do not wrap the JSON in markdown fences. Do not emit any text before or after the JSON object."#;

pub fn build_system_prompt(industry: Option<&str>, context: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are a multi-tenant conversational assistant speaking on behalf of a business.\n");
    if let Some(industry) = industry {
        prompt.push_str(&format!("The business operates in the {industry} industry.\n"));
    }
    prompt.push_str(RESPONSE_CONTRACT);
    if !context.is_empty() {
        prompt.push_str("\n\nRelevant retrieved context:\n");
        prompt.push_str(context);
    }
    prompt
}

pub fn build_user_message(history: &[Turn], message: &str) -> String {
    if history.is_empty() {
        return message.to_string();
    }

    let mut rendered = String::new();
    rendered.push_str("Conversation so far:\n");
    for turn in history {
        let speaker = match turn.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        rendered.push_str(&format!("{speaker}: {}\n", turn.content));
    }
    rendered.push_str(&format!("User: {message}"));
    rendered
}

/// Prompt used for the second, non-streaming call that extracts a
/// structured order payload once a turn's completion heuristic fires.
pub fn build_extraction_prompt(intent_schema_hint: &str, history: &[Turn]) -> (String, String) {
    let system = format!(
        "Extract a single JSON object matching this shape from the conversation below. Respond with only the JSON object, no prose, no markdown fences.\n{intent_schema_hint}"
    );

    let mut user = String::new();
    for turn in history {
        let speaker = match turn.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        user.push_str(&format!("{speaker}: {}\n", turn.content));
    }

    (system, user)
}

pub const PLACE_ORDER_SCHEMA_HINT: &str = r#"{"customer":{"name":"","phone":"","email":null,"address":null},"items":[{"name":"","quantity":1,"unitPrice":null,"description":null}],"delivery":{"method":"delivery|pickup","address":null,"notes":null},"payment":{"method":"cash|bank_transfer|credit_card|cod","timing":null},"notes":null}"#;

pub const UPDATE_ORDER_SCHEMA_HINT: &str = r#"{"order_code":"","changes":{"products":null,"customer":null,"delivery":null,"payment":null},"update_reason":null,"notes":null}"#;

pub const CHECK_QUANTITY_SCHEMA_HINT: &str = r#"{"products":[{"name":"","quantity_needed":1,"specifications":null}],"customer_contact":{"name":"","phone":null,"email":null},"contact_method":"email|sms","urgency":"normal|urgent","notes":null}"#;
