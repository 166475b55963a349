//! CPF validation, deterministic prize derivation, and the lookup workflow that
//! sequences them behind a simulated backend call.

pub mod gateway;
pub mod identifier;
pub mod outcome;
pub mod profile;
pub mod router;
pub mod service;
pub mod state;
pub mod view;
pub mod workflow;

pub use gateway::{GatewayError, LookupGateway, SimulatedGateway};
pub use identifier::{
    is_submittable, mask_input, normalize, validate, Identifier, ValidationError,
    ValidationResult,
};
pub use outcome::has_prize;
pub use profile::{
    Campaign, LookupResult, PrizeAmount, PrizeRecord, Profile, ProfileGenerator, ReferenceData,
    ReferenceDataError, ReferenceList, CAMPAIGN_EXPIRY,
};
pub use router::{lookup_router, LookupRequest, MaskResponse};
pub use service::LookupService;
pub use state::{RejectionReason, WorkflowEvent, WorkflowState, STATUS_MESSAGES};
pub use view::{LookupStatus, LookupView, PrizeView, ProfileView, REDEEM_NOTICE};
pub use workflow::{LookupWorkflow, WorkflowError, WorkflowHandle, WorkflowSettings};
