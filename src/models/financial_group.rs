use serde::{Deserialize, Serialize};

use crate::services::onboarding::OnboardingStep;

/// The household record that owns the budget and gates onboarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialGroup {
    pub id: String,
    pub name: String,
    pub onboarding_step: OnboardingStep,
    pub onboarding_completed: bool,
    pub created_at: String,
}
