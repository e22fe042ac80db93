use chrono::Utc;
use clap::{Args, Subcommand};
use hunter_core::evaluation;

use super::{CmdResult, Context};

#[derive(Subcommand)]
pub enum EvaluateAction {
    /// Record height and weight
    Submit {
        /// Height in cm
        #[arg(long)]
        height: String,
        /// Weight in kg
        #[arg(long)]
        weight: String,
    },
    /// List past evaluations, newest first
    List,
}

#[derive(Args)]
pub struct ReevaluateArgs {
    /// Low, Moderate or High
    #[arg(long)]
    strength: String,
    /// Low, Moderate or High
    #[arg(long)]
    endurance: String,
}

pub fn run(action: EvaluateAction, json: bool) -> CmdResult {
    let ctx = Context::open(json)?;
    let owner = ctx.session.require_user()?;

    match action {
        EvaluateAction::Submit { height, weight } => {
            let record = evaluation::submit_evaluation(&ctx.db, owner, &height, &weight, Utc::now())?;
            ctx.print(&record, || {
                format!(
                    "Evaluation recorded: {} cm, {} kg",
                    record.height_cm, record.weight_kg
                )
            })?;
        }
        EvaluateAction::List => {
            let records = ctx.db.evaluations(owner)?;
            ctx.print(&records, || {
                if records.is_empty() {
                    return "No evaluations yet.".to_string();
                }
                records
                    .iter()
                    .map(|r| {
                        format!(
                            "{}  {} cm  {} kg",
                            r.recorded_at.format("%Y-%m-%d %H:%M"),
                            r.height_cm,
                            r.weight_kg
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
    }
    Ok(())
}

pub fn reevaluate(args: ReevaluateArgs, json: bool) -> CmdResult {
    let ctx = Context::open(json)?;
    let owner = ctx.session.require_user()?;
    let re = evaluation::submit_reevaluation(
        &ctx.db,
        owner,
        &args.strength,
        &args.endurance,
        Utc::now(),
    )?;
    ctx.print(&re, || {
        format!(
            "Re-evaluation complete. Strength: {} | Endurance: {}",
            re.strength_level.rank(),
            re.endurance_level.rank()
        )
    })
}
