//! The order-intent completion heuristic (spec §4.4).

use switchboard_core::Intent;

const CONFIRMATION_TOKENS: &[&str] = &[
    "đồng ý", "xác nhận", "ok", "được", "đặt hàng", "confirm", "yes", "agree", "order", "place order",
];

const PLACE_ORDER_COMPLETION_PHRASES: &[&str] = &[
    "đơn hàng đã được xác nhận",
    "đã ghi nhận",
    "order confirmed",
    "successfully placed",
];

const UPDATE_ORDER_COMPLETION_PHRASES: &[&str] = &[
    "đơn hàng đã được cập nhật",
    "cập nhật thành công",
    "order updated",
    "update confirmed",
];

const CHECK_QUANTITY_COMPLETION_PHRASES: &[&str] = &[
    "yêu cầu đã được gửi",
    "sẽ kiểm tra",
    "request sent",
    "will check",
];

/// `true` iff the turn contains at least one confirmation token from the
/// user and at least one intent-appropriate completion phrase from the
/// assistant.
pub fn turn_is_complete(intent: Intent, user_message: &str, final_answer: &str) -> bool {
    if !intent.is_order_related() {
        return false;
    }

    let user_lower = user_message.to_lowercase();
    let has_confirmation = CONFIRMATION_TOKENS.iter().any(|t| user_lower.contains(t));
    if !has_confirmation {
        return false;
    }

    let answer_lower = final_answer.to_lowercase();
    let phrases = match intent {
        Intent::PlaceOrder => PLACE_ORDER_COMPLETION_PHRASES,
        Intent::UpdateOrder => UPDATE_ORDER_COMPLETION_PHRASES,
        Intent::CheckQuantity => CHECK_QUANTITY_COMPLETION_PHRASES,
        _ => return false,
    };

    phrases.iter().any(|p| answer_lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_order_completes_with_matching_pair() {
        assert!(turn_is_complete(
            Intent::PlaceOrder,
            "Vâng, tôi đồng ý đặt hàng",
            "Đơn hàng đã được xác nhận, cảm ơn bạn!"
        ));
    }

    #[test]
    fn place_order_english_pair_completes() {
        assert!(turn_is_complete(
            Intent::PlaceOrder,
            "Yes, please order it",
            "Your order confirmed, thank you."
        ));
    }

    #[test]
    fn missing_user_confirmation_is_incomplete() {
        assert!(!turn_is_complete(
            Intent::PlaceOrder,
            "What's the price?",
            "Order confirmed."
        ));
    }

    #[test]
    fn missing_assistant_phrase_is_incomplete() {
        assert!(!turn_is_complete(
            Intent::PlaceOrder,
            "I confirm, yes",
            "Let me check the warehouse for you."
        ));
    }

    #[test]
    fn non_order_intent_is_never_complete() {
        assert!(!turn_is_complete(
            Intent::GeneralChat,
            "yes confirm order",
            "order confirmed"
        ));
    }

    #[test]
    fn check_quantity_uses_its_own_phrase_set() {
        assert!(turn_is_complete(
            Intent::CheckQuantity,
            "ok please check",
            "Request sent, we will check stock."
        ));
    }
}
