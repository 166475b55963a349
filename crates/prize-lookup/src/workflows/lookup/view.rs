use super::profile::{LookupResult, PrizeRecord, Profile};
use super::state::WorkflowState;
use serde::Serialize;

/// Shown when the winner follows the redeem action.
pub const REDEEM_NOTICE: &str = "Redirecionando para página de resgate...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    Pending,
    PrizeFound,
    NoPrize,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub name: String,
    pub cpf: String,
    pub location: String,
}

impl From<&Profile> for ProfileView {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.full_name.clone(),
            cpf: profile.formatted_identifier.clone(),
            location: profile.location.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrizeView {
    pub value: String,
    pub protocol: String,
    pub expiry: String,
    pub redeem_notice: &'static str,
}

impl From<&PrizeRecord> for PrizeView {
    fn from(prize: &PrizeRecord) -> Self {
        Self {
            value: prize.amount.formatted(),
            protocol: prize.protocol_code.clone(),
            expiry: prize.expiry_label(),
            redeem_notice: REDEEM_NOTICE,
        }
    }
}

/// Display-ready projection of a workflow state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupView {
    pub status: LookupStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize: Option<PrizeView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl LookupView {
    pub fn from_result(result: &LookupResult) -> Self {
        let status = if result.has_prize() {
            LookupStatus::PrizeFound
        } else {
            LookupStatus::NoPrize
        };
        Self {
            status,
            profile: Some(ProfileView::from(&result.profile)),
            prize: result.prize.as_ref().map(PrizeView::from),
            error: None,
        }
    }

    pub fn from_state(state: &WorkflowState) -> Self {
        match state {
            WorkflowState::Resolved(result) => Self::from_result(result),
            WorkflowState::Rejected(reason) => Self {
                status: LookupStatus::Rejected,
                profile: None,
                prize: None,
                error: Some(reason.user_message()),
            },
            _ => Self {
                status: LookupStatus::Pending,
                profile: None,
                prize: None,
                error: None,
            },
        }
    }
}
