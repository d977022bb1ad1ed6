use std::io::{self, Write};

use anyhow::{Result, bail};
use clap::Args;
use client::App;
use colored::Colorize;
use rpassword::prompt_password;
use shared::models::LoginRequest;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email; prompted for when omitted
    #[arg(long, short)]
    pub email: Option<String>,
}

pub async fn login(app: &App, args: LoginArgs) -> Result<()> {
    let email = match args.email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = prompt_password("Password: ")?;
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }

    if !app.session.login(&LoginRequest { email, password }).await {
        bail!("login failed: {}", app.session.error());
    }
    print_session(app);
    Ok(())
}

pub fn logout(app: &App) {
    let was_authenticated = app.session.is_authenticated();
    app.session.logout();
    if was_authenticated {
        println!("Logged out.");
    } else {
        println!("No active session.");
    }
}

pub fn status(app: &App) {
    if app.session.check_auth() {
        print_session(app);
    } else {
        println!("{}", "Not logged in.".yellow());
    }
}

fn print_session(app: &App) {
    let user = app.session.user().unwrap_or_default();
    println!(
        "{} {}",
        "Logged in as".green(),
        user.display_name().unwrap_or("unknown user")
    );
    if let Some(email) = user.get_str("email") {
        println!("email: {email}");
    }
    if app.storage.is_persistent() {
        println!("session stored in {}", app.config.storage_dir.display());
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim().to_string();
    if trimmed.is_empty() {
        bail!("input must not be empty");
    }
    Ok(trimmed)
}
