use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::{debug, info, warn};

use lingua_portal_core::auth::AuthPhase;
use lingua_portal_core::models::{ContactForm, EnquiryProduct, PasswordChange, ProfileUpdate};
use lingua_portal_core::utils::{format_amount, format_iso_date, format_unix_date, truncate_string};
use lingua_portal_core::{ApiClient, ApiError, AuthSession, AuthenticatedApi, Config, MemberPortal, SessionStore};

use crate::Command;

/// Width of the description column in the transaction list
const DESCRIPTION_WIDTH: usize = 40;

const SHELL_PROMPT: &str = "portal> ";

/// A command line entered inside `shell`
#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

pub struct App {
    pub config: Config,
    pub api: ApiClient,
    pub session: Arc<AuthSession>,
    pub portal: MemberPortal,
}

impl App {
    /// Create the application, restoring any stored session
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        debug!(backend = ?config.token_backend, api = %config.api_base_url(), "Config loaded");

        let store = SessionStore::from_config(&config).context("Failed to open token storage")?;
        let api = ApiClient::new(&config).context("Failed to create API client")?;
        let session = Arc::new(AuthSession::new(api.clone(), store));
        let portal = MemberPortal::new(AuthenticatedApi::new(session.clone()));

        Ok(Self {
            config,
            api,
            session,
            portal,
        })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Login { email, remember } => self.login_interactive(email, remember).await,
            Command::Logout => {
                self.session.logout().await;
                println!("Logged out.");
                Ok(())
            }
            Command::Whoami => {
                self.whoami();
                Ok(())
            }
            Command::Refresh => self.refresh_profile().await,
            Command::Profile {
                full_name,
                age,
                phone,
                wechat,
            } => {
                let update = ProfileUpdate {
                    full_name,
                    age,
                    phone_number: phone,
                    wechat_id: wechat,
                };
                self.portal.update_profile(&update).await.map_err(user_error)?;
                println!("Profile updated successfully");
                Ok(())
            }
            Command::Password => self.change_password().await,
            Command::Subscription => self.show_subscription().await,
            Command::Transactions => self.show_transactions().await,
            Command::Receipt { latest, date } => self.show_receipt(latest, date).await,
            Command::Contact {
                email,
                name,
                phone,
                product,
                subject,
                message,
            } => {
                let mut form = ContactForm {
                    email,
                    full_name: name,
                    phone_no: phone,
                    subject,
                    message,
                    ..Default::default()
                };
                let product = product
                    .as_deref()
                    .map(str::parse::<EnquiryProduct>)
                    .transpose()
                    .map_err(anyhow::Error::msg)?;
                form.set_product(product);
                self.submit_contact(&form).await
            }
            Command::Shell => self.run_shell().await,
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Prompt for any missing credentials and log in
    pub async fn login_interactive(&mut self, email: Option<String>, remember: bool) -> Result<()> {
        let email = match email {
            Some(email) => email,
            None => Self::prompt_email(self.config.last_username.as_deref())?,
        };
        let password = rpassword::prompt_password("Password: ")?;

        if email.is_empty() || password.is_empty() {
            return Err(anyhow::anyhow!("Email and password required"));
        }

        println!("Authenticating...");
        match self.session.login(&email, &password, remember).await {
            Ok(user) => {
                println!("Welcome, {}!", user.display_name());
                if !remember {
                    println!("Session will end when this process exits (use --remember to stay logged in).");
                }

                self.config.last_username = Some(email);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                Ok(())
            }
            Err(e) => {
                let message = self
                    .session
                    .state()
                    .error
                    .unwrap_or_else(|| e.to_string());
                self.session.clear_error();
                Err(anyhow::anyhow!("Login failed: {}", message))
            }
        }
    }

    fn prompt_email(last: Option<&str>) -> Result<String> {
        match last {
            Some(last) => print!("Email [{}]: ", last),
            None => print!("Email: "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        Ok(match (input.is_empty(), last) {
            (true, Some(last)) => last.to_string(),
            _ => input.to_string(),
        })
    }

    pub fn whoami(&self) {
        let state = self.session.state();
        match (state.phase(), state.user) {
            (AuthPhase::Authenticated, Some(user)) if user.is_placeholder() => {
                println!("Logged in (restored session). Run `refresh` to load your profile.");
            }
            (AuthPhase::Authenticated, Some(user)) => {
                println!("Logged in as {} <{}>", user.display_name(), user.email);
                if !user.created_at.is_empty() {
                    println!("Member since {}", format_iso_date(&user.created_at));
                }
            }
            _ => println!("Not logged in."),
        }
    }

    async fn refresh_profile(&self) -> Result<()> {
        let user = self.session.refresh_profile().await.map_err(user_error)?;
        println!("Profile loaded for {} <{}>", user.display_name(), user.email);
        Ok(())
    }

    async fn change_password(&self) -> Result<()> {
        let change = PasswordChange {
            current_password: rpassword::prompt_password("Current password: ")?,
            new_password: rpassword::prompt_password("New password: ")?,
            confirm_password: rpassword::prompt_password("Confirm new password: ")?,
        };
        self.portal.change_password(&change).await.map_err(user_error)?;
        println!("Password updated successfully");
        Ok(())
    }

    // =========================================================================
    // Portal
    // =========================================================================

    async fn show_subscription(&self) -> Result<()> {
        let Some(sub) = self.portal.fetch_subscription().await.map_err(user_error)? else {
            println!("No active subscription items.");
            return Ok(());
        };

        println!("Subscription {}", sub.id);
        println!("  Status:   {}", sub.status.display_name());
        println!(
            "  Price:    {} / {:?}",
            format_amount(sub.amount, &sub.currency),
            sub.interval
        );
        println!(
            "  Period:   {} to {}",
            format_unix_date(sub.current_period_start),
            format_unix_date(sub.current_period_end)
        );
        Ok(())
    }

    async fn show_transactions(&self) -> Result<()> {
        let transactions = self.portal.list_transactions().await.map_err(user_error)?;
        if transactions.is_empty() {
            println!("No transactions yet.");
            return Ok(());
        }

        for t in &transactions {
            println!(
                "{:<12} {:<width$} {:>14}  {}",
                format_iso_date(&t.created_at),
                truncate_string(t.description(), DESCRIPTION_WIDTH),
                format_amount(t.amount_minor(), &t.currency),
                t.payment_status().display_name(),
                width = DESCRIPTION_WIDTH
            );
        }
        Ok(())
    }

    async fn show_receipt(&self, latest: bool, date: Option<NaiveDate>) -> Result<()> {
        let url = match (latest, date) {
            (_, Some(day)) => self.portal.receipt_url_for_day(day).await,
            _ => self.portal.latest_receipt_url().await,
        }
        .map_err(user_error)?;
        println!("{}", url);
        Ok(())
    }

    async fn submit_contact(&self, form: &ContactForm) -> Result<()> {
        self.api.submit_contact_form(form).await.map_err(|e| match e {
            ApiError::Validation(msg) => anyhow::anyhow!(msg),
            other => anyhow::anyhow!("Failed to submit form. Please try again. {}", other),
        })?;
        println!("Form submitted successfully!");
        Ok(())
    }

    // =========================================================================
    // Shell
    // =========================================================================

    /// Interactive loop. Logins without `--remember` last until it exits.
    async fn run_shell(&mut self) -> Result<()> {
        info!("Shell started");
        println!("Type a command (`help` for a list, `quit` to exit).");

        let stdin = io::stdin();
        loop {
            print!("{}", SHELL_PROMPT);
            io::stdout().flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }
            let words: Vec<&str> = line.split_whitespace().collect();
            match words.as_slice() {
                [] => continue,
                ["quit"] | ["exit"] => break,
                _ => {}
            }

            let parsed = match ShellLine::try_parse_from(words.iter().copied()) {
                Ok(parsed) => parsed,
                Err(e) => {
                    let _ = e.print();
                    continue;
                }
            };
            if matches!(parsed.command, Command::Shell) {
                println!("Already in the shell.");
                continue;
            }

            if let Err(e) = Box::pin(self.run(parsed.command)).await {
                eprintln!("Error: {:#}", e);
            }
        }

        info!("Shell finished");
        Ok(())
    }
}

/// Turn an API error into a message fit for the terminal
fn user_error(e: ApiError) -> anyhow::Error {
    match e {
        ApiError::MissingToken => anyhow::anyhow!("Not logged in. Run `login` first."),
        ApiError::SessionExpired => anyhow::anyhow!("Session expired. Please log in again."),
        ApiError::Network(ref err) if err.is_timeout() => {
            anyhow::anyhow!("Connection timed out. Please try again.")
        }
        ApiError::Network(ref err) if err.is_connect() => {
            anyhow::anyhow!("Unable to connect to server. Check your internet connection.")
        }
        other => anyhow::Error::new(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_line_parses_subcommands() {
        let parsed = ShellLine::try_parse_from(["receipt", "--date", "2025-06-01"]).unwrap();
        match parsed.command {
            Command::Receipt { latest, date } => {
                assert!(!latest);
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 1));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(ShellLine::try_parse_from(["receipt", "--latest", "--date", "2025-06-01"]).is_err());
        assert!(ShellLine::try_parse_from(["bogus"]).is_err());
    }

    #[test]
    fn test_user_error_messages() {
        assert_eq!(
            user_error(ApiError::MissingToken).to_string(),
            "Not logged in. Run `login` first."
        );
        assert_eq!(
            user_error(ApiError::SessionExpired).to_string(),
            "Session expired. Please log in again."
        );
        assert_eq!(
            user_error(ApiError::Validation("New passwords do not match".to_string())).to_string(),
            "New passwords do not match"
        );
    }
}
