//! Command handlers.
//!
//! `App` owns the configuration, the session store and the API client for
//! one invocation. Handlers print results to stdout; diagnostics go through
//! `tracing`.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate, Utc};
use finboard_core::api::{ApiClient, AuthClient, RegisterRequest};
use finboard_core::auth::{AuthError, AuthState, SessionStore};
use finboard_core::models::{EntryKind, InvestmentInput, NewStatement, NoteStatus, TransactionInput};
use finboard_core::summary::recent_statements;
use finboard_core::utils::{format_currency, normalize_date, truncate_string};
use finboard_core::{ApiError, Config, DashboardSummary, GoalProgress, RecordFilter};
use futures::future::try_join3;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cli::{Command, InvestmentsCommand, NotesCommand, StatementsCommand, TransactionsCommand};

/// Width of the description column in listings
const DESCRIPTION_WIDTH: usize = 32;

const ENV_PASSWORD: &str = "FINBOARD_PASSWORD";

pub struct App {
    config: Config,
    auth: AuthClient,
    sessions: Arc<SessionStore>,
    api: ApiClient,
    state_rx: watch::Receiver<AuthState>,
}

impl App {
    pub fn new(mut config: Config, api_url: Option<String>) -> Result<Self> {
        if let Some(url) = api_url {
            config.api_base_url = url;
        }

        let auth = AuthClient::new(&config.api_base_url, config.request_timeout())?;
        let store = config.token_store()?;
        let sessions = Arc::new(SessionStore::new(auth.clone(), store));
        let api = ApiClient::new(&config.api_base_url, config.request_timeout(), Arc::clone(&sessions))?;
        let state_rx = sessions.subscribe();

        Ok(Self {
            config,
            auth,
            sessions,
            api,
            state_rx,
        })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        // A stale persisted session is logged out here and reported below
        if self.sessions.is_authenticated().await && !self.sessions.validate_token().await {
            debug!("Stored access token no longer valid");
        }

        let result = match command {
            Command::Login { email } => self.login(email).await,
            Command::Logout => self.logout().await,
            Command::Status => self.status().await,
            Command::Register { email, name } => self.register(email, name).await,
            Command::Dashboard { recent } => self.dashboard(recent).await,
            Command::Statements(cmd) => self.statements(cmd).await,
            Command::Transactions(cmd) => self.transactions(cmd).await,
            Command::Investments(cmd) => self.investments(cmd).await,
            Command::Notes(cmd) => self.notes(cmd).await,
            Command::Profile => self.profile().await,
            Command::Goal { set } => self.goal(set).await,
        };

        self.report_forced_logout(result.as_ref().err());
        result
    }

    /// Tell the user to sign in again when the session was torn down underneath a command
    fn report_forced_logout(&mut self, err: Option<&anyhow::Error>) {
        let lost = matches!(self.state_rx.has_changed(), Ok(true))
            && *self.state_rx.borrow_and_update() == AuthState::Anonymous;
        let rejected = err
            .and_then(ApiError::find)
            .is_some_and(ApiError::is_session_lost);

        if lost || rejected {
            eprintln!("Your session has expired. Run `finboard login` to sign in again.");
        }
    }

    async fn require_user(&self) -> Result<i64> {
        self.sessions
            .user_id()
            .await
            .ok_or_else(|| anyhow!("Not signed in. Run `finboard login` first."))
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    async fn login(&mut self, email: Option<String>) -> Result<()> {
        if self.sessions.is_authenticated().await {
            let session = self.sessions.session().await;
            println!("Already signed in (user {}).", session.user_id.unwrap_or_default());
            return Ok(());
        }

        let email = match email.or_else(|| self.config.last_email.clone()) {
            Some(email) => email,
            None => prompt_line("Email: ")?,
        };
        if email.trim().is_empty() {
            return Err(anyhow!("Valid email is required"));
        }

        let password = match std::env::var(ENV_PASSWORD) {
            Ok(password) if !password.is_empty() => password,
            _ => rpassword::prompt_password("Password: ")?,
        };
        if password.trim().is_empty() {
            return Err(anyhow!("Password is required"));
        }

        match self.sessions.login(email.trim(), &password).await {
            Ok(session) => {
                self.config.last_email = Some(email.trim().to_string());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.state_rx.borrow_and_update();
                println!("Login successful (user {}).", session.user_id.unwrap_or_default());
                Ok(())
            }
            Err(AuthError::InvalidCredentials(message)) => Err(anyhow!(message)),
            Err(AuthError::Network(e)) => {
                warn!(error = %e, "Login request failed");
                Err(anyhow!("Unable to connect to server. Check your internet connection."))
            }
            Err(e) => Err(anyhow!("Login failed: {}", e)),
        }
    }

    async fn logout(&mut self) -> Result<()> {
        self.sessions.logout().await;
        // Requested by the user, not a forced logout
        self.state_rx.borrow_and_update();
        println!("Signed out.");
        Ok(())
    }

    async fn status(&self) -> Result<()> {
        let session = self.sessions.session().await;
        if !session.is_authenticated {
            println!("Not signed in.");
            return Ok(());
        }

        println!("Signed in as user {}", session.user_id.unwrap_or_default());
        match self.sessions.check_token().await {
            Ok(claims) => {
                if let Some(ref email) = claims.email {
                    println!("Email: {}", email);
                }
                println!("Access token expires in {} min", claims.seconds_until_expiry() / 60);
            }
            Err(e) => println!("Access token: {}", e),
        }
        println!(
            "Refresh token: {}",
            if session.refresh_token.is_some() { "present" } else { "missing" }
        );
        Ok(())
    }

    async fn register(&self, email: String, name: String) -> Result<()> {
        if name.trim().is_empty() {
            return Err(anyhow!("Name is required"));
        }
        let password = match std::env::var(ENV_PASSWORD) {
            Ok(password) if !password.is_empty() => password,
            _ => rpassword::prompt_password("Choose a password: ")?,
        };

        let response = self
            .auth
            .register(&RegisterRequest {
                email,
                password,
                name: Some(name),
            })
            .await?;

        info!(user_id = ?response.user.as_ref().map(|u| u.id), "Registration successful");
        println!("Registration successful. Run `finboard login` to sign in.");
        Ok(())
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    async fn dashboard(&self, recent: usize) -> Result<()> {
        let user_id = self.require_user().await?;

        let (balance, statements, user) = try_join3(
            self.api.fetch_balance(user_id),
            self.api.fetch_statements(user_id, None),
            self.api.fetch_user(user_id),
        )
        .await?;

        let summary = DashboardSummary::from_statements(&statements);

        println!("Balance:        {:>14}", format_currency(balance.balance));
        println!("Total credits:  {:>14}", format_currency(balance.total_credits));
        println!("Total debits:   {:>14}", format_currency(balance.total_debits));
        println!();
        for kind in EntryKind::ALL {
            println!("{:<16}{:>14}", kind.label(), format_currency(summary.total_for(kind)));
        }

        if let Some(progress) = user
            .savings_goal()
            .and_then(|goal| GoalProgress::new(balance.balance, goal))
        {
            println!();
            print_goal(&progress);
        }

        if recent > 0 && !statements.is_empty() {
            println!();
            println!("Recent activity:");
            for statement in recent_statements(&statements, recent) {
                println!(
                    "  {:<10}  {:<width$}  {:>12}",
                    normalize_date(&statement.date),
                    truncate_string(&statement.description, DESCRIPTION_WIDTH),
                    format_currency(statement.signed_value()),
                    width = DESCRIPTION_WIDTH,
                );
            }
        }
        Ok(())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    async fn statements(&self, command: StatementsCommand) -> Result<()> {
        let user_id = self.require_user().await?;

        match command {
            StatementsCommand::List { card, filter } => {
                let statements = self
                    .api
                    .fetch_statements(user_id, card.map(EntryKind::from))
                    .await?;
                let filter = RecordFilter::from(filter);
                let rows = filter.apply(&statements);

                for s in &rows {
                    println!(
                        "{:>6}  {:<10}  {:<14}  {:<7}  {:<width$}  {:>12}",
                        s.id,
                        normalize_date(&s.date),
                        s.kind().map(|k| k.label()).unwrap_or("Other"),
                        s.entry_type.label(),
                        truncate_string(&s.description, DESCRIPTION_WIDTH),
                        format_currency(s.signed_value()),
                        width = DESCRIPTION_WIDTH,
                    );
                }
                println!("{} of {} entries", rows.len(), statements.len());
            }
            StatementsCommand::Add {
                card,
                side,
                amount,
                description,
            } => {
                let statement = NewStatement::new(
                    user_id,
                    card.into(),
                    side.into(),
                    amount,
                    &description,
                    Utc::now().to_rfc3339(),
                );
                let created = self.api.create_statement(&statement).await?;
                println!("Created entry {}.", created.id);
            }
            StatementsCommand::Delete { id } => {
                self.api.delete_statement(id).await?;
                println!("Deleted entry {}.", id);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    async fn transactions(&self, command: TransactionsCommand) -> Result<()> {
        let user_id = self.require_user().await?;

        match command {
            TransactionsCommand::List { filter } => {
                let transactions = self.api.fetch_transactions(Some(user_id)).await?;
                let filter = RecordFilter::from(filter);
                let rows = filter.apply(&transactions);

                for t in &rows {
                    println!(
                        "{:>6}  {:<10}  {:<width$}  {:>12}",
                        t.id,
                        t.date,
                        truncate_string(&t.description, DESCRIPTION_WIDTH),
                        format_currency(t.signed_amount()),
                        width = DESCRIPTION_WIDTH,
                    );
                }
                println!("{} of {} transactions", rows.len(), transactions.len());
            }
            TransactionsCommand::Add {
                side,
                amount,
                description,
                date,
                category,
            } => {
                let input = TransactionInput {
                    user_id: Some(user_id),
                    category_id: category,
                    date: Some(date.unwrap_or_else(today).format("%Y-%m-%d").to_string()),
                    description: Some(description),
                    amount: Some(amount),
                    kind: Some(side.into()),
                };
                let created = self.api.create_transaction(&input).await?;
                println!("Created transaction {}.", created.id);
            }
            TransactionsCommand::Show { id } => {
                let t = self.api.fetch_transaction(id).await?;
                println!("Transaction {}", t.id);
                println!("Date:        {}", t.date);
                println!("Description: {}", t.description);
                println!("Amount:      {}", format_currency(t.signed_amount()));
                if let Some(category) = t.category_id {
                    println!("Category:    {}", category);
                }
            }
            TransactionsCommand::Update {
                id,
                side,
                amount,
                description,
                date,
            } => {
                let input = TransactionInput {
                    date: date.map(|d| d.format("%Y-%m-%d").to_string()),
                    description,
                    amount,
                    kind: side.map(Into::into),
                    ..Default::default()
                };
                let updated = self.api.update_transaction(id, &input).await?;
                println!("Updated transaction {}.", updated.id);
            }
            TransactionsCommand::Delete { id } => {
                self.api.delete_transaction(id).await?;
                println!("Deleted transaction {}.", id);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Investments
    // =========================================================================

    async fn investments(&self, command: InvestmentsCommand) -> Result<()> {
        match command {
            InvestmentsCommand::List { filter } => {
                let investments = self.api.fetch_investments().await?;
                let filter = RecordFilter::from(filter);
                let rows = filter.apply(&investments);

                for i in &rows {
                    println!(
                        "{:>6}  {:<10}  {:<16}  {:>12}  {:>7.2}%  {:>12}",
                        i.id,
                        normalize_date(&i.date),
                        truncate_string(i.category_name.as_deref().unwrap_or("-"), 16),
                        format_currency(i.amount),
                        i.return_percentage,
                        format_currency(i.projected_value()),
                    );
                }
                println!("{} of {} investments", rows.len(), investments.len());
            }
            InvestmentsCommand::Add {
                amount,
                return_percentage,
                description,
                category,
                date,
            } => {
                let user_id = self.require_user().await?;
                let input = InvestmentInput {
                    user_id: Some(user_id),
                    category_id: category,
                    date: Some(date.unwrap_or_else(today).format("%Y-%m-%d").to_string()),
                    description,
                    amount: Some(amount),
                    return_percentage: Some(return_percentage),
                    ..Default::default()
                };
                let created = self.api.create_investment(&input).await?;
                println!("Created investment {}.", created.id);
            }
            InvestmentsCommand::Update {
                id,
                amount,
                return_percentage,
                description,
                date,
            } => {
                let input = InvestmentInput {
                    date: date.map(|d| d.format("%Y-%m-%d").to_string()),
                    description,
                    amount,
                    return_percentage,
                    ..Default::default()
                };
                let updated = self.api.update_investment(id, &input).await?;
                println!("Updated investment {}.", updated.id);
            }
            InvestmentsCommand::Delete { id } => {
                self.api.delete_investment(id).await?;
                println!("Deleted investment {}.", id);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Notes
    // =========================================================================

    async fn notes(&self, command: NotesCommand) -> Result<()> {
        let due = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());

        match command {
            NotesCommand::List => {
                let notes = self.api.fetch_notes().await?;
                if notes.is_empty() {
                    println!("No notes.");
                }
                let now = Local::now();
                for note in notes {
                    let id = note.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
                    let status = note.status(&now);
                    let marker = match status {
                        NoteStatus::Normal => String::new(),
                        _ => format!(" [{}]", status.label()),
                    };
                    match note.due_date {
                        Some(ref date) => println!(
                            "{:>6}  {}  (due {}){}",
                            id,
                            note.text,
                            normalize_date(date),
                            marker
                        ),
                        None => println!("{:>6}  {}", id, note.text),
                    }
                }
            }
            NotesCommand::Add { text, due: date } => {
                let note = self.api.create_note(&text, due(date)).await?;
                println!("Created note {}.", note.id.unwrap_or_default());
            }
            NotesCommand::Edit { id, text, due: date } => {
                self.api.update_note(id, &text, due(date)).await?;
                println!("Updated note {}.", id);
            }
            NotesCommand::Delete { id } => {
                self.api.delete_note(id).await?;
                println!("Deleted note {}.", id);
            }
        }
        Ok(())
    }

    async fn profile(&self) -> Result<()> {
        let user_id = self.require_user().await?;
        let user = self.api.fetch_user(user_id).await?;

        println!("[{}] {}", user.initials(), user.name);
        println!("Email: {}", user.email);
        if let Some(ref created) = user.created_at {
            println!("Member since: {}", normalize_date(created));
        }
        Ok(())
    }

    async fn goal(&self, set: Option<f64>) -> Result<()> {
        let user_id = self.require_user().await?;
        let user = self.api.fetch_user(user_id).await?;

        let goal = match set {
            Some(goal) => {
                if !goal.is_finite() || goal <= 0.0 {
                    return Err(anyhow!("Goal must be a positive amount"));
                }
                self.api
                    .put_meta(user_id, &user.meta_with_savings_goal(goal))
                    .await?;
                info!(goal, "Savings goal updated");
                goal
            }
            None => match user.savings_goal() {
                Some(goal) => goal,
                None => {
                    println!("No savings goal set. Use `finboard goal --set <amount>`.");
                    return Ok(());
                }
            },
        };

        let balance = self.api.fetch_balance(user_id).await?;
        if let Some(progress) = GoalProgress::new(balance.balance, goal) {
            print_goal(&progress);
        }
        Ok(())
    }
}

fn print_goal(progress: &GoalProgress) {
    println!(
        "Savings goal:   {}% of {} ({} to go)",
        progress.rounded_percentage(),
        format_currency(progress.goal),
        format_currency(progress.remaining()),
    );
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
