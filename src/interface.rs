use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api::{resolve_credential, CompletionClient, GenerationParams, MODELS, OPENAI_KEY_VAR};
use crate::chat;
use crate::config::AppConfig;
use crate::dashboard::{self, DashboardState};
use crate::dataset::{self, format_count, MuseumQuery};
use crate::error::AppError;
use crate::logger::{Logger, SessionMetrics};
use crate::roles::{RoleSelection, ROLE_PRESETS};
use crate::session::{Role, Session};
use crate::weather::{WeatherClient, WEATHER_KEY_VAR};
use colored::*;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::hint::Hinter;
use rustyline::{CompletionType, Config, Context, Editor, Helper, Highlighter, Validator};

/// Available slash commands for tab-completion.
const COMMANDS: &[&str] = &[
    "/help", "/quit", "/exit", "/roles", "/role", "/prompt", "/card", "/model",
    "/temperature", "/tokens", "/key", "/weatherkey", "/reset", "/history", "/json",
    "/stats", "/museums", "/weather",
];

/// Rustyline helper providing slash-command tab-completion and inline hints.
#[derive(Helper, Validator, Highlighter)]
struct CommandCompleter;

impl Hinter for CommandCompleter {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        // Only hint when cursor is at end and line starts with '/'
        if pos != line.len() || !line.starts_with('/') || line.contains(' ') {
            return None;
        }

        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && **cmd != line)
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        if !prefix.starts_with('/') || prefix.contains(' ') {
            return Ok((0, vec![]));
        }

        let matches: Vec<Pair> = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

// ── Command parsing ──────────────────────────────────────────────────

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Roles,
    Role(String),
    Prompt(String),
    Card,
    Model(String),
    Temperature(String),
    Tokens(String),
    Key(String),
    WeatherKey(String),
    Reset,
    History,
    Json,
    Stats,
    Museums { rows: Option<String>, location: Option<String> },
    Weather(String),
    Ask(String),
    Unknown(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if !line.starts_with('/') {
        return Command::Ask(line.to_string());
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim().to_string()),
        None => (line, String::new()),
    };

    match name {
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        "/roles" => Command::Roles,
        "/role" => Command::Role(rest),
        "/prompt" => Command::Prompt(rest),
        "/card" => Command::Card,
        "/model" => Command::Model(rest),
        "/temperature" => Command::Temperature(rest),
        "/tokens" => Command::Tokens(rest),
        "/key" => Command::Key(rest),
        "/weatherkey" => Command::WeatherKey(rest),
        "/reset" => Command::Reset,
        "/history" => Command::History,
        "/json" => Command::Json,
        "/stats" => Command::Stats,
        "/museums" => {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let rows = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
            let location = parts.next().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
            Command::Museums { rows, location }
        }
        "/weather" => Command::Weather(rest),
        other => Command::Unknown(other.to_string()),
    }
}

// ── Display helpers ──────────────────────────────────────────────────

pub fn print_banner() {
    println!("{}", "====================================".bright_cyan());
    println!("{}", "    🎭 ROLE-BASED CREATIVE CHATBOT   ".bright_cyan().bold());
    println!("{}", "====================================".bright_cyan());
    println!("{}", " Pick a creative role, ask a question, get role-specific guidance.".bright_white());
    println!("{}\n", " Type /help for commands or /quit to exit".dimmed());
}

fn print_help() {
    println!("\n{}", "Available Commands:".bright_cyan().bold());
    println!("  {}       - Exit the program", "/quit, /exit".green());
    println!("  {}              - Show this help", "/help".green());
    println!("  {}             - List role presets", "/roles".green());
    println!("  {}          - Select a role preset (restores its default text)", "/role <n>".green());
    println!("  {}     - Edit the role description (system prompt)", "/prompt <text>".green());
    println!("  {}              - Show the role card", "/card".green());
    println!("  {}      - Choose the model ({})", "/model <name>".green(), MODELS.join(", "));
    println!("  {}   - Set creativity (0.0 - 1.2)", "/temperature <x>".green());
    println!("  {}        - Set max tokens (100 - 1500)", "/tokens <n>".green());
    println!("  {}        - Use an OpenAI API key for this session", "/key <key>".green());
    println!("  {} - Use a weather API key for this session", "/weatherkey <key>".green());
    println!("  {}             - Reset the conversation", "/reset".green());
    println!("  {}           - Show the conversation, newest first", "/history".green());
    println!("  {}              - Dump the conversation as JSON", "/json".green());
    println!("  {}             - Show session statistics", "/stats".green());
    println!("  {} - Show museum sample data", "/museums [rows] [location]".green());
    println!("  {}     - Current weather for a city", "/weather <city>".green());
    println!("\n  {}", "Anything else is sent to the assistant.".dimmed());
    println!();
}

fn print_roles(selection: &RoleSelection) {
    println!("\n{}", "Role presets:".bright_cyan().bold());
    for (i, preset) in ROLE_PRESETS.iter().enumerate() {
        let marker = if i == selection.index() { "●".green() } else { "○".dimmed() };
        println!("  {} {}. {}", marker, i + 1, preset.label.bright_white());
    }
    println!();
}

fn print_role_card(selection: &RoleSelection) {
    println!("\n{}", "━━━━━━━━━━━━━━ Role Card ━━━━━━━━━━━━━━".bright_magenta().bold());
    println!("{} {}", "Role:".bold(), selection.label().bright_white());
    if selection.is_edited() {
        println!("{}", "(edited)".dimmed());
    }
    println!("{}", selection.system_prompt().bright_blue());
    println!("\n{}", "Tips".bold());
    println!("  - Be specific with context (location, medium, constraints).");
    println!("  - Ask for examples or step-by-step instructions when you need practical guidance.");
    println!("  - You can edit the role prompt to make the assistant stricter or more playful.");
    println!("{}", "Do not paste secret documents. Keep API keys private.".dimmed());
    println!("{}\n", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_magenta());
}

fn print_transcript(session: &Session, selection: &RoleSelection) {
    if session.transcript().next().is_none() {
        println!("{}", "No conversation yet.".yellow());
        return;
    }
    println!("\n{}", "Conversation (most recent first):".bright_cyan().bold());
    for msg in session.transcript() {
        match msg.role {
            Role::User => println!("\n{} {}", "You:".bright_blue().bold(), msg.content),
            Role::Assistant => println!(
                "\n{} {}",
                format!("{} (assistant):", selection.label()).bright_green().bold(),
                msg.content
            ),
            Role::System => {}
        }
    }
    println!();
}

fn print_error(err: &AppError) {
    if err.is_warning() {
        println!("{} {}", "⚠️ ".yellow(), err.to_string().yellow());
    } else {
        println!("{} {}", "✗".red().bold(), err.to_string().red());
    }
}

fn print_museums(query: &MuseumQuery) {
    let rows = dataset::museums(query.rows, &query.location);
    println!("\n{}", "━━━━━━━━━━ Recommended Museums ━━━━━━━━━━".bright_cyan().bold());
    println!(
        "{:<28} {:>6} {:>12}  {}",
        "Name".bold(),
        "Rating".bold(),
        "Visitors".bold(),
        "Location".bold()
    );
    for r in &rows {
        println!("{:<28} {:>6.1} {:>12}  {}", r.name, r.rating, format_count(r.visitor_count), r.location);
    }

    println!("\n{}", "Annual visitors".bold());
    for bar in dataset::visitor_chart(&rows) {
        let width = (bar.percent / 100.0 * 30.0).round() as usize;
        println!("{:<28} {} {}", bar.label, "█".repeat(width).bright_cyan(), format_count(bar.value).dimmed());
    }
    println!();
}

/// Start a spinner animation in a background thread.
/// Returns an `Arc<AtomicBool>`: set it to `false` to stop the spinner.
fn start_spinner(message: &str) -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    let msg = message.to_string();

    std::thread::spawn(move || {
        let frames = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
        let mut i = 0;
        while running_clone.load(Ordering::Relaxed) {
            print!("\r{} {} ", frames[i % frames.len()].to_string().cyan(), msg.dimmed());
            let _ = io::stdout().flush();
            std::thread::sleep(std::time::Duration::from_millis(80));
            i += 1;
        }
        print!("\r{}\r", " ".repeat(msg.len() + 4));
        let _ = io::stdout().flush();
    });

    running
}

fn stop_spinner(handle: &Arc<AtomicBool>) {
    handle.store(false, Ordering::Relaxed);
    // Give the spinner thread time to clear the line
    std::thread::sleep(std::time::Duration::from_millis(100));
}

// ── REPL ─────────────────────────────────────────────────────────────

/// Everything one terminal session owns.
struct Repl {
    completion: CompletionClient,
    weather: WeatherClient,
    session: Session,
    selection: RoleSelection,
    params: GenerationParams,
    typed_key: Option<String>,
    typed_weather_key: Option<String>,
    default_city: String,
    museum_rows: usize,
    logger: Option<Logger>,
    metrics: SessionMetrics,
}

impl Repl {
    fn new(config: &AppConfig) -> Self {
        let logger = match Logger::new(&config.log_dir) {
            Ok(l) => Some(l),
            Err(e) => {
                println!("{} {}", "⚠️  Logging disabled:".yellow(), e);
                None
            }
        };
        Self {
            completion: CompletionClient::new(&config.api_url),
            weather: WeatherClient::new(&config.weather_api_url),
            session: Session::new(),
            selection: RoleSelection::preset(config.default_role),
            params: config.generation_params(),
            typed_key: None,
            typed_weather_key: None,
            default_city: config.default_city.clone(),
            museum_rows: config.museum_rows,
            logger,
            metrics: SessionMetrics::new(),
        }
    }

    fn log(&self, f: impl FnOnce(&Logger) -> anyhow::Result<()>) {
        if let Some(logger) = &self.logger {
            let _ = f(logger);
        }
    }

    /// Handle one line. Returns `false` when the user asked to quit.
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => return false,
            Command::Help => print_help(),
            Command::Roles => print_roles(&self.selection),
            Command::Role(choice) => match RoleSelection::from_user_choice(&choice) {
                Ok(selection) => {
                    self.selection = selection;
                    println!("{} {}", "✓ Role:".green(), self.selection.label().bright_white());
                }
                Err(e) => print_error(&e),
            },
            Command::Prompt(text) => {
                if text.is_empty() {
                    println!("{}", self.selection.system_prompt().bright_blue());
                } else {
                    self.selection.set_instructions(&text);
                    println!("{}", "✓ Role description updated. /reset to apply it to the conversation.".green());
                }
            }
            Command::Card => print_role_card(&self.selection),
            Command::Model(name) => match self.params.set_model(&name) {
                Ok(()) => println!("{} {}", "✓ Model:".green(), self.params.model().bright_white()),
                Err(e) => print_error(&e),
            },
            Command::Temperature(value) => {
                let result = value
                    .parse::<f32>()
                    .map_err(|_| AppError::validation(format!("'{}' is not a number", value)))
                    .and_then(|t| self.params.set_temperature(t));
                match result {
                    Ok(()) => println!("{} {}", "✓ Temperature:".green(), self.params.temperature()),
                    Err(e) => print_error(&e),
                }
            }
            Command::Tokens(value) => {
                let result = value
                    .parse::<u32>()
                    .map_err(|_| AppError::validation(format!("'{}' is not a whole number", value)))
                    .and_then(|n| self.params.set_max_tokens(n));
                match result {
                    Ok(()) => println!("{} {}", "✓ Max tokens:".green(), self.params.max_tokens()),
                    Err(e) => print_error(&e),
                }
            }
            Command::Key(key) => {
                self.typed_key = Some(key).filter(|k| !k.is_empty());
                println!("{}", "✓ API key set for this session.".green());
            }
            Command::WeatherKey(key) => {
                self.typed_weather_key = Some(key).filter(|k| !k.is_empty());
                println!("{}", "✓ Weather API key set for this session.".green());
            }
            Command::Reset => {
                chat::reset(&mut self.session, &self.selection);
                self.log(|l| l.log_reset(self.selection.label()));
                println!("{}", "✓ Conversation reset.".green());
            }
            Command::History => print_transcript(&self.session, &self.selection),
            Command::Json => {
                println!("{}", self.session.to_json(self.selection.system_prompt()).dimmed());
            }
            Command::Stats => self.metrics.display(),
            Command::Museums { rows, location } => {
                let rows = match rows.map(|r| r.parse::<usize>()) {
                    None => self.museum_rows,
                    Some(Ok(n)) => n,
                    Some(Err(_)) => {
                        print_error(&AppError::validation("Row count must be a whole number"));
                        return true;
                    }
                };
                let mut query = MuseumQuery::with_defaults(rows, &self.default_city);
                if let Some(location) = location {
                    query.location = location;
                }
                print_museums(&query);
            }
            Command::Weather(city) => {
                let city = if city.is_empty() { self.default_city.clone() } else { city };
                self.show_weather(&city).await;
            }
            Command::Ask(text) => self.ask(&text).await,
            Command::Unknown(name) => {
                println!("{} {}. Type /help for commands.", "Unknown command:".yellow(), name);
            }
        }
        true
    }

    async fn ask(&mut self, text: &str) {
        let credential = resolve_credential(self.typed_key.as_deref(), OPENAI_KEY_VAR);
        if credential.is_some() && !text.trim().is_empty() {
            self.log(|l| l.log_api_request(self.selection.label(), self.params.model(), text));
        }

        let spinner = start_spinner("Generating...");
        let result = chat::generate(
            &mut self.session,
            &self.selection,
            text,
            &self.params,
            credential.as_deref(),
            &self.completion,
        )
        .await;
        stop_spinner(&spinner);

        self.metrics.record_completion(&result);
        match &result {
            Ok(reply) => {
                self.log(|l| l.log_api_response(reply));
                println!(
                    "\n{} {}\n",
                    format!("{} (assistant):", self.selection.label()).bright_green().bold(),
                    reply
                );
            }
            Err(e) => {
                self.log(|l| l.log_error(&e.to_string()));
                print_error(e);
            }
        }
    }

    async fn show_weather(&mut self, city: &str) {
        let key = resolve_credential(self.typed_weather_key.as_deref(), WEATHER_KEY_VAR);
        let spinner = start_spinner("Fetching weather...");
        let snapshot = self.weather.fetch(city, key.as_deref()).await;
        stop_spinner(&spinner);

        self.metrics.weather_lookups += 1;
        self.log(|l| l.log_weather(city, snapshot.is_some()));

        match snapshot {
            Some(w) => {
                println!("\n{} {}", "Weather in".bright_cyan().bold(), city.bright_white().bold());
                println!("  {} {:.1} °C", "Temperature:".dimmed(), w.temperature);
                println!("  {}    {:.0} %", "Humidity:".dimmed(), w.humidity);
                println!("  {} {:.1} mm", "Precipitation:".dimmed(), w.precipitation);
                println!("  {}     {}\n", "Weather:".dimmed(), w.condition.bright_white());
            }
            None => println!(
                "{}",
                "⚠️  No weather data. Check the city name and your weather API key (/weatherkey or OPENWEATHER_API_KEY)."
                    .yellow()
            ),
        }
    }
}

/// Interactive REPL entry point.
pub async fn start_repl(config: &AppConfig) {
    print_banner();

    let mut repl = Repl::new(config);
    println!(
        "{} {} {}",
        "✓ Role:".green(),
        repl.selection.label().bright_white(),
        format!("(model {}, temperature {}, max tokens {})", repl.params.model(), repl.params.temperature(), repl.params.max_tokens()).dimmed()
    );
    println!("{} {}", "✓ Endpoint:".green(), repl.completion.api_url().dimmed());
    if resolve_credential(None, OPENAI_KEY_VAR).is_none() {
        println!("{}", "⚠️  No OPENAI_API_KEY found. Use /key <key> before asking.".yellow());
    }

    let rl_config = Config::builder()
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(100)
        .build();
    let mut rl = match Editor::with_config(rl_config) {
        Ok(rl) => rl,
        Err(e) => {
            println!("{} {}", "✗ Failed to create line editor:".red().bold(), e);
            return;
        }
    };
    rl.set_helper(Some(CommandCompleter));

    loop {
        let readline = rl.readline(&"> ".bright_cyan().bold().to_string());
        let line = match readline {
            Ok(line) => line.trim().to_string(),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                println!("{} {}", "✗ Input error:".red(), e);
                continue;
            }
        };

        if line.is_empty() {
            continue;
        }

        if !repl.handle(parse_command(&line)).await {
            break;
        }
    }

    println!("Goodbye!");
    println!("\n{}", "Session ended.".bright_cyan());
    repl.metrics.display();
}

/// Run the REPL with the web dashboard serving in the background.
pub async fn start_repl_with_dashboard(config: &AppConfig) {
    let state = Arc::new(DashboardState::new(config));
    let port = config.dashboard_port;
    tokio::spawn(async move {
        if let Err(e) = dashboard::start_dashboard(state, port).await {
            println!("{} {}", "✗ Dashboard stopped:".red().bold(), e);
        }
    });
    println!(
        "{} {}",
        "✓ Dashboard:".green(),
        format!("http://127.0.0.1:{port}").bright_white()
    );

    start_repl(config).await;
}
