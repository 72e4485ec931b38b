//! Shared handler state.

use std::sync::Arc;

use crate::application::{ConversationService, SmsDecisionService};
use crate::ports::{
    CallLogRepository, ConversationLogRepository, PreferenceRepository, SmsLogRepository,
    UserRepository,
};

/// Everything the HTTP handlers need, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub preferences: Arc<dyn PreferenceRepository>,
    pub conversation_logs: Arc<dyn ConversationLogRepository>,
    pub call_logs: Arc<dyn CallLogRepository>,
    pub sms_logs: Arc<dyn SmsLogRepository>,
    pub conversation: Arc<ConversationService>,
    pub sms_decision: Arc<SmsDecisionService>,
}
