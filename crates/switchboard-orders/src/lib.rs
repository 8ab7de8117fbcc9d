//! Intent-driven order side effects: completion heuristic, structured
//! extraction payloads, and backend dispatch (spec §4.4).

pub mod completion;
pub mod dispatch;
pub mod model;

pub use completion::turn_is_complete;
pub use dispatch::{dispatch_check_quantity, dispatch_place_order, dispatch_update_order};
pub use model::{
    CheckQuantityPayload, ContactMethod, Customer, CustomerContact, Delivery, DeliveryMethod,
    Financial, OrderChanges, OrderChannel, OrderItem, Payment, PaymentMethod, PlaceOrderPayload,
    QuantityCheckItem, UpdateOrderPayload, Urgency,
};
