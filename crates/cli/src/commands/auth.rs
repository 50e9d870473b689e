//! Authentication commands.

use clap::Subcommand;

use clementine_client::Context;
use clementine_core::{LoginRequest, RegisterRequest};

use super::print_json;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Verify credentials against the backend
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Register a new customer account
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Show the identity of the current session
    Whoami,
}

pub async fn run(ctx: &Context, action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let storefront = ctx.storefront();
    match action {
        AuthAction::Login { email, password } => {
            let user = storefront.login(&LoginRequest { email, password }).await?;
            print_json(&user)?;
        }
        AuthAction::Register {
            first_name,
            last_name,
            email,
            password,
        } => {
            let user = storefront
                .register(&RegisterRequest {
                    first_name,
                    last_name,
                    email,
                    password,
                })
                .await?;
            print_json(&user)?;
        }
        AuthAction::Whoami => match storefront.current_user() {
            Some(user) => print_json(&user)?,
            None => println!("anonymous"),
        },
    }
    Ok(())
}
