use std::sync::Arc;

use anyhow::Context;
use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;

use dietplan_client::api::{ApiClient, UserApi};
use dietplan_client::auth::{
    LoginAlert, PasswordResetFlow, ResetStep, SessionManager, SignupFlow, SignupStep,
};
use dietplan_client::cli::{Command, CommandParser, USAGE};
use dietplan_client::client::Client;
use dietplan_client::config::ClientConfig;
use dietplan_client::error::FlowError;
use dietplan_client::navigation::{Navigator, Route, Terminal};
use dietplan_client::forms::StepForm;
use dietplan_client::profile::model::{CUISINES, Goal, RESTRICTION_TAGS};
use dietplan_client::profile::{
    BodyStep, CuisineStep, GoalStep, ProfileWizard, RestrictionsStep, SubmissionOrchestrator,
    WizardStep,
};
use dietplan_client::store::Storage;

/// Line-based prompts on stderr, answers from stdin.
struct Prompter {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompter {
    fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn ask(&mut self, label: &str) -> anyhow::Result<String> {
        eprint!("{label}: ");
        let line = self
            .lines
            .next_line()
            .await?
            .context("input closed")?;
        Ok(line.trim().to_string())
    }

    async fn confirm(&mut self, label: &str) -> anyhow::Result<bool> {
        let answer = self.ask(&format!("{label} [y/N]")).await?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }

    /// Ask for each field in turn. `None` if the user typed `back`.
    async fn fields(
        &mut self,
        names: &[&'static str],
    ) -> anyhow::Result<Option<Vec<(&'static str, String)>>> {
        let mut answers = Vec::with_capacity(names.len());
        for name in names {
            let answer = self.ask(name).await?;
            if answer.eq_ignore_ascii_case("back") {
                return Ok(None);
            }
            answers.push((*name, answer));
        }
        Ok(Some(answers))
    }
}

/// Prints terminal screens; other routes are just logged.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        match &route {
            Route::Terminal(Terminal::Success { email }) => {
                println!("\nYour diet plan is ready, {email}.");
            }
            Route::Terminal(Terminal::Failure { reason, .. }) => {
                println!("\nWe couldn't prepare your plan: {reason}");
                println!("Run `dietplan onboard` to try again.");
            }
            other => tracing::debug!(route = other.name(), "Navigate"),
        }
    }
}

struct App {
    config: ClientConfig,
    storage: Storage,
    api: Arc<ApiClient>,
    session: Arc<SessionManager>,
    navigator: Arc<TerminalNavigator>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let command = CommandParser::parse(std::env::args().skip(1));
    let Client {
        config,
        storage,
        api,
        session,
        ..
    } = Client::from_env()?;
    let app = App {
        config,
        storage,
        api,
        session,
        navigator: Arc::new(TerminalNavigator),
    };
    let mut prompt = Prompter::stdin();

    match command {
        Command::Status => status(&app).await,
        Command::Login { remember_me } => login(&app, &mut prompt, remember_me).await,
        Command::Signup => signup(&app, &mut prompt).await,
        Command::Logout => {
            app.session.logout().await;
            println!("Logged out.");
            Ok(())
        }
        Command::ResetPassword => reset_password(&app, &mut prompt).await,
        Command::Onboard { email } => onboard(&app, &mut prompt, email).await,
        Command::Profile { email } => profile(&app, &mut prompt, email).await,
        Command::Help => {
            println!("{USAGE}");
            Ok(())
        }
        Command::Unknown(other) => {
            eprintln!("Unknown command: {other}\n\n{USAGE}");
            std::process::exit(2);
        }
    }
}

async fn status(app: &App) -> anyhow::Result<()> {
    let state = app.session.restore().await;
    match app.session.user().await {
        Some(user) => println!("{state}: {} <{}>", user.display_name(), user.email),
        None => println!("{state}"),
    }
    if !app.storage.has_seen_onboarding().await {
        println!("New here? Try `dietplan signup`.");
    }
    Ok(())
}

async fn login(app: &App, prompt: &mut Prompter, remember_me: bool) -> anyhow::Result<()> {
    loop {
        let email = prompt.ask("email").await?;
        let password = SecretString::from(prompt.ask("password").await?);
        match app
            .session
            .login(&email, password, dietplan_client::api::auth::DEFAULT_ROLE, remember_me)
            .await
        {
            Ok(user) => {
                println!("Welcome back, {}!", user.display_name());
                return Ok(());
            }
            Err(e) => {
                let alert = LoginAlert::from_session_error(&e);
                eprintln!("{alert}");
                if !prompt.confirm("Try again?").await? {
                    return Ok(());
                }
            }
        }
    }
}

async fn signup(app: &App, prompt: &mut Prompter) -> anyhow::Result<()> {
    let mut flow = SignupFlow::new(app.api.clone(), app.session.clone(), app.config.otp_length);
    while flow.step() != SignupStep::Done {
        let names: Vec<&'static str> = flow.form().field_names().collect();
        let Some(answers) = prompt.fields(&names).await? else {
            return Ok(());
        };
        for (name, value) in answers {
            flow.set(name, &value);
        }
        match flow.next().await {
            Ok(Route::VerifyEmail { email }) => {
                println!("We've sent a {}-digit code to {email}.", app.config.otp_length);
            }
            Ok(Route::Wizard { .. }) => {
                println!("Email verified. Run `dietplan onboard` to build your plan.");
            }
            Ok(_) => {}
            Err(FlowError::Invalid(rejection)) => eprintln!("{}", rejection.alert),
            Err(FlowError::AlreadyRegistered(email)) => {
                eprintln!("{email} already has an account. Try `dietplan login`.");
                return Ok(());
            }
            Err(FlowError::Session(e)) => {
                eprintln!("{}", LoginAlert::from_session_error(&e));
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn reset_password(app: &App, prompt: &mut Prompter) -> anyhow::Result<()> {
    let mut flow =
        PasswordResetFlow::resume(app.api.clone(), app.storage.clone(), app.config.otp_length)
            .await;
    if let Some(email) = flow.email() {
        println!("Continuing password reset for {email}.");
    }

    while flow.step() != ResetStep::Done {
        if flow.step() == ResetStep::Code {
            let answer = prompt.ask("code (or `resend`)").await?;
            if answer.eq_ignore_ascii_case("resend") {
                match flow.resend().await {
                    Ok(()) => println!("A new code is on its way."),
                    Err(e) => eprintln!("{e}"),
                }
                continue;
            }
            flow.set(PasswordResetFlow::CODE, &answer);
        } else {
            let names: Vec<&'static str> = flow.form().field_names().collect();
            let Some(answers) = prompt.fields(&names).await? else {
                return Ok(());
            };
            for (name, value) in answers {
                flow.set(name, &value);
            }
        }

        match flow.next().await {
            Ok(Route::ResetVerify { email }) => println!(
                "Code sent to {email}. You can request another in {}.",
                flow.timer().label(tokio::time::Instant::now())
            ),
            Ok(Route::Login) => println!("Password updated. Run `dietplan login`."),
            Ok(_) => {}
            Err(FlowError::Invalid(rejection)) => eprintln!("{}", rejection.alert),
            Err(FlowError::Rejected(message)) => eprintln!("{message}"),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn onboard(app: &App, prompt: &mut Prompter, email: Option<String>) -> anyhow::Result<()> {
    let email = match email {
        Some(email) => email,
        None => {
            app.session.restore().await;
            match app.session.user().await {
                Some(user) => user.email,
                None => prompt.ask("email").await?,
            }
        }
    };
    let mut wizard = ProfileWizard::new(&email)?;
    println!("Building a profile for {email}. Type `back` to return to the previous screen.");

    while !wizard.step().is_terminal() {
        let screen = match wizard.step() {
            WizardStep::Body => body_screen(&mut wizard, prompt).await?,
            WizardStep::Cuisine => cuisine_screen(&mut wizard, prompt).await?,
            WizardStep::Restrictions => restrictions_screen(&mut wizard, prompt).await?,
            WizardStep::Goal => goal_screen(&mut wizard, prompt).await?,
            WizardStep::Ready => break,
        };
        if screen == Screen::Back {
            wizard.back();
        }
    }

    let profile = wizard.finish()?;
    let orchestrator = SubmissionOrchestrator::new(
        app.api.clone(),
        app.navigator.clone(),
        app.config.completion_delay,
    );

    let mut updates = orchestrator.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(update) = updates.recv().await {
            eprintln!("[{:>3.0}%] {}", update.progress * 100.0, update.phase);
        }
    });

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = orchestrator.submit(profile, &token).await;
    drop(orchestrator);
    let _ = printer.await;

    match result {
        Ok(report) => {
            println!(
                "BMI {:.1} ({}), {:.0} kcal/day",
                report.plan.bmi, report.plan.bmi_category, report.plan.calories
            );
            let plan = &report.plan.diet_plan;
            for (meal, items) in [
                ("Breakfast", &plan.breakfast),
                ("Lunch", &plan.lunch),
                ("Dinner", &plan.dinner),
                ("Snacks", &plan.snacks),
            ] {
                let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
                println!("  {meal}: {}", names.join(", "));
            }
            Ok(())
        }
        Err(e) => {
            tracing::debug!(error = %e, "Submission ended without a plan");
            Ok(())
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Screen {
    Advanced,
    Back,
}

/// Ask for one field of a form, offering the current value. An empty answer
/// keeps it; `None` means the user typed `back`.
async fn ask_field(
    prompt: &mut Prompter,
    form: &StepForm,
    name: &str,
) -> anyhow::Result<Option<String>> {
    let current = form.value(name);
    let label = if current.is_empty() {
        name.to_string()
    } else {
        format!("{name} [{current}]")
    };
    let answer = prompt.ask(&label).await?;
    if answer.eq_ignore_ascii_case("back") {
        return Ok(None);
    }
    Ok(Some(if answer.is_empty() {
        current.to_string()
    } else {
        answer
    }))
}

/// Once a screen has been submitted, every edit is re-checked as it is made.
fn show_field_error(form: &StepForm, name: &str) {
    if let Some(error) = form.error(name) {
        eprintln!("  {error}");
    }
}

async fn body_screen(wizard: &mut ProfileWizard, prompt: &mut Prompter) -> anyhow::Result<Screen> {
    println!("\nGender: Male/Female. Activity: sedentary, light, moderate, active.");
    let mut step = BodyStep::from_draft(wizard.draft());
    let names = [
        BodyStep::GENDER,
        BodyStep::AGE,
        BodyStep::WEIGHT,
        BodyStep::HEIGHT,
        BodyStep::ACTIVITY,
    ];
    loop {
        for name in names {
            let Some(value) = ask_field(prompt, step.form(), name).await? else {
                return Ok(Screen::Back);
            };
            step.set(name, &value);
            show_field_error(step.form(), name);
        }
        match step.submit() {
            Ok(body) => {
                wizard.apply_body(body)?;
                return Ok(Screen::Advanced);
            }
            Err(rejection) => eprintln!("{}", rejection.alert),
        }
    }
}

async fn cuisine_screen(
    wizard: &mut ProfileWizard,
    prompt: &mut Prompter,
) -> anyhow::Result<Screen> {
    println!("\nCuisines: {}", CUISINES.join(", "));
    let mut step = CuisineStep::from_draft(wizard.draft());
    loop {
        let Some(answer) = ask_field(prompt, step.form(), CuisineStep::CUISINE).await? else {
            return Ok(Screen::Back);
        };
        step.select(&answer);
        show_field_error(step.form(), CuisineStep::CUISINE);
        match step.submit() {
            Ok(cuisine) => {
                wizard.apply_cuisine(cuisine)?;
                return Ok(Screen::Advanced);
            }
            Err(rejection) => eprintln!("{}", rejection.alert),
        }
    }
}

async fn restrictions_screen(
    wizard: &mut ProfileWizard,
    prompt: &mut Prompter,
) -> anyhow::Result<Screen> {
    println!("\nCommon restrictions: {}", RESTRICTION_TAGS.join(", "));
    let mut step = RestrictionsStep::from_draft(wizard.draft());
    let tags = prompt.ask("tags to toggle (comma separated)").await?;
    if tags.eq_ignore_ascii_case("back") {
        return Ok(Screen::Back);
    }
    for tag in tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if step.toggle(tag).is_none() {
            eprintln!("{tag} is not a listed tag; add it as a custom ingredient");
        }
    }
    loop {
        let Some(custom) =
            ask_field(prompt, step.form(), RestrictionsStep::CUSTOM).await?
        else {
            return Ok(Screen::Back);
        };
        step.set_custom(&custom);
        show_field_error(step.form(), RestrictionsStep::CUSTOM);
        match step.submit() {
            Ok(restrictions) => {
                wizard.apply_restrictions(restrictions)?;
                return Ok(Screen::Advanced);
            }
            Err(rejection) => eprintln!("{}", rejection.alert),
        }
    }
}

async fn goal_screen(wizard: &mut ProfileWizard, prompt: &mut Prompter) -> anyhow::Result<Screen> {
    println!("\nGoals: {}", Goal::LABELS.join(", "));
    let mut step = GoalStep::from_draft(wizard.draft());
    loop {
        let Some(answer) = ask_field(prompt, step.form(), GoalStep::GOAL).await? else {
            return Ok(Screen::Back);
        };
        step.select(&answer);
        show_field_error(step.form(), GoalStep::GOAL);
        match step.submit() {
            Ok(goal) => {
                wizard.apply_goal(goal)?;
                return Ok(Screen::Advanced);
            }
            Err(rejection) => eprintln!("{}", rejection.alert),
        }
    }
}

async fn profile(app: &App, prompt: &mut Prompter, email: Option<String>) -> anyhow::Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt.ask("email").await?,
    };
    match app.api.get_user_details(&email).await {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Err(e) => {
            app.session.handle_api_error(&e).await;
            Err(e.into())
        }
    }
}
