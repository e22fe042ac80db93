use chrono::Utc;
use clap::{Args, Subcommand};
use hunter_core::account::{self, Registration};

use super::{CmdResult, Context};

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(long)]
    email: String,
    /// At least 6 characters
    #[arg(long)]
    password: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    age: String,
    /// Height in cm
    #[arg(long)]
    height: String,
    /// Weight in kg
    #[arg(long)]
    weight: String,
    /// Activity level, e.g. "low", "moderate", "high"
    #[arg(long)]
    activity: String,
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Create an account and sign in
    Register(RegisterArgs),
    /// Sign in
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
}

pub fn run(action: UserAction, json: bool) -> CmdResult {
    let mut ctx = Context::open(json)?;
    let now = Utc::now();

    match action {
        UserAction::Register(args) => {
            let form = Registration {
                email: args.email,
                password: args.password,
                name: args.name,
                age: args.age,
                height: args.height,
                weight: args.weight,
                activity: args.activity,
            };
            let id = account::register(&ctx.db, &mut ctx.session, &form, now)?;
            ctx.save_session()?;
            ctx.print(&serde_json::json!({ "user_id": id }), || {
                format!("Welcome, Hunter. Account {id} created.")
            })?;
        }
        UserAction::Login { email, password } => {
            let id = account::login(&ctx.db, &mut ctx.session, &email, &password, now)?;
            ctx.save_session()?;
            ctx.print(&serde_json::json!({ "user_id": id }), || {
                "Signed in.".to_string()
            })?;
        }
        UserAction::Logout => {
            account::logout(&mut ctx.session);
            ctx.save_session()?;
            ctx.print(&serde_json::json!({ "user_id": null }), || {
                "Signed out.".to_string()
            })?;
        }
        UserAction::Whoami => {
            let id = ctx.session.require_user()?;
            let Some(user) = ctx.db.user(id)? else {
                return Err(format!("user {id} no longer exists").into());
            };
            ctx.print(&user, || {
                let mut text = format!(
                    "{} <{}>\nage {} | {} cm | {} kg | activity {}\nlevel {} | xp {} | points {}",
                    user.name,
                    user.email,
                    user.age,
                    user.height_cm,
                    user.weight_kg,
                    user.activity,
                    user.progress.level,
                    user.progress.xp,
                    user.progress.points,
                );
                if let Some(re) = &user.reevaluation {
                    text.push_str(&format!(
                        "\nstrength {} ({}) | endurance {} ({})",
                        re.strength_level.as_str(),
                        re.strength_level.rank(),
                        re.endurance_level.as_str(),
                        re.endurance_level.rank(),
                    ));
                }
                text
            })?;
        }
    }
    Ok(())
}
