pub mod bridge;
pub mod gateway;

pub use bridge::{CheckoutRedirect, ConfirmOutcome, PaymentBridge, HIRE_ID_METADATA_KEY};
pub use gateway::{
    CheckoutGateway, CheckoutSession, PaymentError, PaymentGateway, SessionRequest, SessionState,
    UnconfiguredGateway,
};
