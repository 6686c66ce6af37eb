//! Payment domain module.
//!
//! - `aggregate` - Payment aggregate and its transition methods
//! - `status` - PaymentStatus state machine and PaymentMethod
//! - `events` - Domain events published after persisted transitions
//! - `errors` - PaymentError taxonomy

mod aggregate;
mod errors;
pub mod events;
mod status;

pub use aggregate::Payment;
pub use errors::PaymentError;
pub use events::{
    PaymentAuthorized, PaymentCancelled, PaymentCaptured, PaymentCompleted, PaymentCreated,
    PaymentFailed, PaymentRefunded,
};
pub use status::{PaymentMethod, PaymentStatus};
