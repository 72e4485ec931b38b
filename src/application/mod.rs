//! Application services.
//!
//! The completion client owns outbound-call resilience (timeout, retry with
//! backoff); the two orchestrators layer policy on top of it. Retry policy
//! lives only in the client - orchestrators treat client success/failure as
//! final.

mod completion;
mod conversation;
mod sms_decision;

pub use completion::{CompletionClient, CompletionConfig, CompletionOutcome};
pub use conversation::{ConversationError, ConversationService};
pub use sms_decision::{SmsDecision, SmsDecisionService};
