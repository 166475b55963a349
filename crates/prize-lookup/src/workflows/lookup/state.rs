use super::identifier::{Identifier, ValidationError};
use super::profile::LookupResult;
use serde::Serialize;

pub const INVALID_IDENTIFIER_MESSAGE: &str = "CPF inválido. Verifique os dados digitados.";
pub const TRANSIENT_FAILURE_MESSAGE: &str = "Erro na consulta. Tente novamente.";

/// Loading copy rotated while a lookup is in flight.
pub const STATUS_MESSAGES: [&str; 4] = [
    "Verificando informações no banco de dados da Telesena",
    "Consultando sistema de prêmios...",
    "Validando dados do cliente...",
    "Processando consulta...",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RejectionReason {
    Invalid(ValidationError),
    TransientFailure,
}

impl RejectionReason {
    /// Text safe to show users. Validation detail is withheld.
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::Invalid(_) => INVALID_IDENTIFIER_MESSAGE,
            Self::TransientFailure => TRANSIENT_FAILURE_MESSAGE,
        }
    }
}

impl From<ValidationError> for RejectionReason {
    fn from(value: ValidationError) -> Self {
        Self::Invalid(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Idle,
    AwaitingValidation,
    Validating,
    Simulating {
        identifier: Identifier,
    },
    Resolved(LookupResult),
    Rejected(RejectionReason),
}

impl WorkflowState {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingValidation => "awaiting_validation",
            Self::Validating => "validating",
            Self::Simulating { .. } => "simulating",
            Self::Resolved(_) => "resolved",
            Self::Rejected(_) => "rejected",
        }
    }

    /// `Resolved` and `Rejected` end a run and accept the next submission.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved(_) | Self::Rejected(_))
    }

    pub const fn accepts_submission(&self) -> bool {
        matches!(self, Self::Idle | Self::Resolved(_) | Self::Rejected(_))
    }

    pub const fn is_in_flight(&self) -> bool {
        !self.accepts_submission()
    }
}

/// Notifications delivered to presentation adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    StateChanged { state: WorkflowState },
    StatusMessage { message: String },
    SubmissionIgnored { state: &'static str },
}
