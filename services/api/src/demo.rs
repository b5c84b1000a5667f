use crate::infra::{
    in_memory_workflow, seeded_directory, seeded_user, ServiceWorkflow, MAX_SEEDED_CANDIDATES,
};
use campus_recruit::config::AppConfig;
use campus_recruit::error::AppError;
use campus_recruit::workflows::recruitment::{
    Actor, ApplicationFilter, ApplicationId, ApplicationStatus, PositionId, Role, StageRegistry,
    UserId,
};
use clap::Args;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of candidates applying to the sample position
    #[arg(
        long,
        default_value_t = 4,
        value_parser = clap::value_parser!(u64).range(1..=MAX_SEEDED_CANDIDATES)
    )]
    pub(crate) candidates: u64,
    /// How many of them HR approves before the stage advance
    #[arg(long, default_value_t = 2)]
    pub(crate) approve: u64,
    /// Comment posted on every application carried to the next stage
    #[arg(long)]
    pub(crate) global_comment: Option<String>,
}

pub(crate) fn run_stages() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let registry = config.recruitment.registry();
    render_stages(&registry);
    Ok(())
}

fn render_stages(registry: &StageRegistry) {
    println!("Recruitment pipeline ({} stages)", registry.len());
    for stage in registry.active() {
        let next = registry
            .next_stage(stage)
            .map(|next| next.name.as_str())
            .unwrap_or("-");
        println!(
            "  {:>2}. {} (id {}) -> {}",
            stage.order, stage.name, stage.id, next
        );
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        candidates,
        approve,
        global_comment,
    } = args;

    let config = AppConfig::load()?;
    let workflow = in_memory_workflow(config.recruitment.registry(), seeded_directory(candidates)?);
    let hr = Actor {
        id: UserId(1),
        role: Role::Hr,
        display_name: "HR desk".to_string(),
    };

    println!("Recruitment workflow demo");
    render_stages(workflow.stages());

    let position = workflow.open_position(&hr, "Assistant Professor", "Computer Science", None)?;
    println!(
        "\nOpened position {} '{}' ({}) | status {}",
        position.id,
        position.title,
        position.department,
        position.status.label()
    );

    let mut applications = Vec::new();
    for n in 1..=candidates {
        let applicant = Actor {
            id: seeded_user(n),
            role: Role::Candidate,
            display_name: format!("Candidate {n}"),
        };
        let detail = workflow.apply(&applicant, position.id)?;
        applications.push(detail.id);
    }
    for id in applications.iter().take(approve as usize) {
        workflow.approve(&hr, *id)?;
    }

    let statistics = workflow.stage_statistics(position.id)?;
    println!(
        "- Stage '{}': {} active | {} approved | {} pending | can proceed: {}",
        statistics.current_stage.name,
        statistics.total_active,
        statistics.approved_current_stage,
        statistics.pending_approval,
        statistics.can_proceed_to_next
    );

    match workflow.advance_stage(&hr, position.id, global_comment.as_deref()) {
        Ok(advance) => println!("- Advance: {}", advance.summary()),
        Err(err) => {
            println!("- Advance refused: {err}");
            return Ok(());
        }
    }

    render_applications(&workflow, position.id, &applications)?;
    Ok(())
}

fn render_applications(
    workflow: &ServiceWorkflow,
    position: PositionId,
    applications: &[ApplicationId],
) -> Result<(), AppError> {
    println!("\nApplications after the advance");
    for id in applications {
        let detail = workflow.detail(*id)?;
        let latest = detail
            .comments
            .first()
            .map(|comment| comment.content.as_str())
            .unwrap_or("-");
        println!(
            "  - #{} candidate {} | stage {} | {} | latest note: {}",
            detail.id, detail.candidate, detail.current_stage_name, detail.status, latest
        );
    }

    let rejected = workflow
        .applications(position, ApplicationFilter::Only(ApplicationStatus::Rejected))?
        .len();
    let active = workflow
        .applications(position, ApplicationFilter::Active)?
        .len();
    println!("Active: {active} | Rejected: {rejected}");
    Ok(())
}
