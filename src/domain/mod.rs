//! Domain entities persisted and served by the API.

mod logs;
mod preference;
mod user;

pub use logs::{CallLog, ConversationLog, SmsDecisionKind, SmsLog};
pub use preference::UserPreference;
pub use user::User;
