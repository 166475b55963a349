use clap::Args;
use prize_lookup::config::AppConfig;
use prize_lookup::error::AppError;
use prize_lookup::telemetry;
use prize_lookup::workflows::lookup::{
    is_submittable, mask_input, LookupService, LookupView, WorkflowEvent, WorkflowState,
};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

#[derive(Args, Debug)]
pub(crate) struct LookupArgs {
    /// CPF to look up, with or without punctuation
    pub(crate) cpf: String,
    /// Override the simulated backend latency in milliseconds
    #[arg(long)]
    pub(crate) latency_ms: Option<u64>,
}

#[derive(Args, Debug)]
pub(crate) struct MaskArgs {
    /// Raw input as typed so far
    pub(crate) input: String,
}

pub(crate) async fn run_lookup(args: LookupArgs) -> Result<(), AppError> {
    let LookupArgs { cpf, latency_ms } = args;

    let mut config = AppConfig::load()?;
    if let Some(latency_ms) = latency_ms {
        config.lookup.latency = Duration::from_millis(latency_ms);
    }

    telemetry::init(&config.telemetry)?;

    let service = LookupService::simulated(&config.lookup)?;
    let session = service.session();
    let mut events = session.subscribe();
    session.submit(cpf).await?;

    let settled = loop {
        match events.recv().await {
            Ok(WorkflowEvent::StatusMessage { message }) => println!("... {message}"),
            Ok(WorkflowEvent::StateChanged { state }) if state.is_terminal() => break state,
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break session.state(),
        }
    };

    render_lookup(&settled);
    Ok(())
}

fn render_lookup(state: &WorkflowState) {
    let view = LookupView::from_state(state);

    if let Some(error) = view.error {
        println!("{error}");
        return;
    }

    if let Some(profile) = &view.profile {
        println!("{}", profile.name);
        println!("CPF: {}", profile.cpf);
        println!("{}", profile.location);
    }

    match &view.prize {
        Some(prize) => {
            println!("Prize found: R$ {}", prize.value);
            println!("Protocol: {}", prize.protocol);
            println!("Redeem by: {}", prize.expiry);
            println!("{}", prize.redeem_notice);
        }
        None => println!("No prize for this CPF."),
    }
}

pub(crate) fn run_mask(args: MaskArgs) {
    let masked = mask_input(&args.input);
    let ready = if is_submittable(&args.input) {
        "ready to search"
    } else {
        "incomplete"
    };
    println!("{masked} ({ready})");
}
