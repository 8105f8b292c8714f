use aria::builder::LLMBackend;
use aria::chat::{ChatMessage, ChatRole};
use aria::config::{resolve_api_key, Settings, API_KEY_ENV};
use aria::error::LLMError;
use aria::memory::{JsonFileStore, MemoryCategory, MemoryPersistence, SharedMemory, TranscriptLimits};
use aria::persona::PersonaConfig;
use aria::secret_store::SecretStore;
use aria::session::{Session, SessionFactory};
use aria::LLMProvider;
use clap::Parser;
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use spinners::{Spinner, Spinners};
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Command line arguments for the ARIA CLI
#[derive(Parser)]
#[clap(
    name = "aria",
    about = "Personal AI assistant that remembers what matters to you",
    allow_hyphen_values = true
)]
struct CliArgs {
    /// Command to execute (chat, set, get, delete, default, check, serve)
    #[arg(index = 1)]
    command: Option<String>,

    /// Secret key for set/get/delete, backend for default, or a one-shot message for chat
    #[arg(index = 2)]
    key: Option<String>,

    /// Secret value for set
    #[arg(index = 3)]
    value: Option<String>,

    /// Backend to use (openai or demo)
    #[arg(long)]
    backend: Option<String>,

    /// Model name to use
    #[arg(long)]
    model: Option<String>,

    /// API key for the provider
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long)]
    base_url: Option<String>,

    /// Temperature setting (0.0-2.0)
    #[arg(long)]
    temperature: Option<f32>,

    /// Maximum tokens in the response
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Memory JSON file
    #[arg(long)]
    memory_file: Option<PathBuf>,

    /// Persona JSON file
    #[arg(long)]
    persona_file: Option<PathBuf>,

    /// Retry transient failures with backoff
    #[arg(long)]
    resilient: bool,

    /// Port for the serve command
    #[arg(long)]
    port: Option<u16>,

    /// Bearer token required by the serve command
    #[arg(long)]
    auth_key: Option<String>,
}

/// Settings from the environment with command line overrides applied
fn settings(args: &CliArgs) -> Result<Settings, LLMError> {
    let mut settings = Settings::from_env();
    let stored_backend = SecretStore::new()
        .ok()
        .and_then(|store| store.get_default_backend().cloned());
    if let Some(name) = args.backend.clone().or(stored_backend) {
        settings.backend = LLMBackend::from_str(&name)?;
    }
    if let Some(model) = &args.model {
        settings.model = model.clone();
    }
    if let Some(t) = args.temperature {
        settings.temperature = t;
    }
    if let Some(mt) = args.max_tokens {
        settings.max_tokens = mt;
    }
    if let Some(timeout) = args.timeout {
        settings.timeout_seconds = timeout;
    }
    if let Some(path) = &args.memory_file {
        settings.memory_file = path.clone();
    }
    if let Some(path) = &args.persona_file {
        settings.persona_file = path.clone();
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    Ok(settings)
}

/// Builds the provider; returns it with whether a credential was found
fn build_provider(
    args: &CliArgs,
    settings: &Settings,
) -> Result<(Arc<dyn LLMProvider>, bool), LLMError> {
    let mut builder = settings.provider_builder().resilient(args.resilient);
    let key = resolve_api_key(args.api_key.clone());
    let configured = key.is_some() || settings.backend == LLMBackend::Demo;
    if let Some(key) = key {
        builder = builder.api_key(key);
    }
    if let Some(url) = &args.base_url {
        builder = builder.base_url(url);
    }
    Ok((Arc::from(builder.build()?), configured))
}

fn print_error(e: &LLMError) {
    eprintln!("{} {}", "Error:".bright_red(), e);
    eprintln!("{} {}", "Hint:".bright_yellow(), e.hint());
}

fn rule() {
    println!("{}", "─".repeat(50).bright_black());
}

fn print_history(session: &Session, name: &str) {
    if session.transcript().is_empty() {
        println!("{} No conversation yet.", "!".bright_yellow());
        return;
    }
    println!("{}", "Conversation".bright_cyan());
    for message in session.transcript().iter() {
        let speaker = match message.role {
            ChatRole::User => "You".bright_blue(),
            ChatRole::Assistant => name.bright_green(),
            ChatRole::System => "System".bright_black(),
        };
        println!("{speaker}: {}", message.content);
    }
}

/// The message of a one-shot `chat`, if one was given
fn one_shot_message(args: &CliArgs) -> Option<String> {
    match args.command.as_deref() {
        Some("chat") => args.key.clone(),
        _ => None,
    }
}

async fn print_memory(session: &Session) {
    let store = session.memory().read().await;
    println!("{}", "What I remember".bright_cyan());
    for category in MemoryCategory::ALL {
        let count = store.count(category);
        println!("{} ({})", category.label().bright_green(), count);
        for fact in store.recent(category, 3) {
            println!(
                "  {} {}",
                fact.timestamp.format("%Y-%m-%d").to_string().bright_black(),
                fact.content
            );
        }
    }
    let topics = store.top_topics(5);
    if !topics.is_empty() {
        println!("{}", "Frequent topics".bright_green());
        for (topic, count) in topics {
            println!("  {topic} ({count}x)");
        }
    }
}

/// Sends a one-word request and explains any failure
async fn check(provider: &dyn LLMProvider) -> bool {
    let messages = [ChatMessage::user().content("Hello").build()];
    let mut sp = Spinner::new(Spinners::Dots12, "Checking API...".bright_magenta().to_string());
    let result = provider.chat(&messages).await;
    sp.stop();
    print!("\r\x1B[K");
    match result {
        Ok(response) => {
            println!(
                "{} {} answered: {}",
                "✓".bright_green(),
                provider.model(),
                response.text().unwrap_or_default()
            );
            true
        }
        Err(e) => {
            print_error(&e);
            false
        }
    }
}

/// Main entry point for the ARIA CLI
///
/// Handles secret management, the API check, the HTTP server and the
/// interactive chat loop.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    aria::init_logging();
    let args = CliArgs::parse();

    match args.command.as_deref() {
        Some("set") => {
            if let (Some(key), Some(value)) = (args.key.as_deref(), args.value.as_deref()) {
                let mut store = SecretStore::new()?;
                store.set(key, value)?;
                println!("{} Secret '{}' has been set.", "✓".bright_green(), key);
                return Ok(());
            }
            eprintln!("{} Usage: aria set <key> <value>", "Error:".bright_red());
            return Ok(());
        }
        Some("get") => {
            if let Some(key) = args.key.as_deref() {
                let store = SecretStore::new()?;
                match store.get(key) {
                    Some(value) => println!("{}: {}", key, value),
                    None => println!("{} Secret '{}' not found", "!".bright_yellow(), key),
                }
                return Ok(());
            }
            eprintln!("{} Usage: aria get <key>", "Error:".bright_red());
            return Ok(());
        }
        Some("delete") => {
            if let Some(key) = args.key.as_deref() {
                let mut store = SecretStore::new()?;
                store.delete(key)?;
                println!("{} Secret '{}' has been deleted.", "✓".bright_green(), key);
                return Ok(());
            }
            eprintln!("{} Usage: aria delete <key>", "Error:".bright_red());
            return Ok(());
        }
        Some("default") => {
            let mut store = SecretStore::new()?;
            match args.key.as_deref() {
                Some(backend) => {
                    let _ = LLMBackend::from_str(backend)?;
                    store.set_default_backend(backend)?;
                    println!("{} Default backend set to {}", "✓".bright_green(), backend);
                }
                None => match store.get_default_backend() {
                    Some(backend) => println!("Default backend: {}", backend),
                    None => println!("{} No default backend set", "!".bright_yellow()),
                },
            }
            return Ok(());
        }
        Some("check") | Some("chat") | Some("serve") | None => {}
        Some(other) => {
            eprintln!(
                "{} Unknown command '{}' (chat, set, get, delete, default, check, serve)",
                "Error:".bright_red(),
                other
            );
            return Ok(());
        }
    }

    let settings = settings(&args)?;
    let (provider, configured) = build_provider(&args, &settings)?;
    if !configured {
        eprintln!(
            "{} No API key found. Set {} or run `aria set {} <key>`, or use --backend demo.",
            "!".bright_yellow(),
            API_KEY_ENV,
            API_KEY_ENV
        );
    }

    if args.command.as_deref() == Some("check") {
        if !check(provider.as_ref()).await {
            std::process::exit(1);
        }
        return Ok(());
    }

    let persistence: Arc<dyn MemoryPersistence> =
        Arc::new(JsonFileStore::new(settings.memory_file.clone()));
    let memory = SharedMemory::new(persistence.load().await);
    let persona = PersonaConfig::load(&settings.persona_file);
    let factory = SessionFactory::new(provider, persona, memory)
        .with_limits(TranscriptLimits::new(settings.ceiling))
        .with_recall_per_category(settings.recall_per_category)
        .with_persistence(persistence);

    if args.command.as_deref() == Some("serve") {
        #[cfg(feature = "api")]
        {
            let mut server = aria::api::Server::new(aria::api::SessionRegistry::new(factory))
                .with_api_configured(configured);
            if let Some(key) = args.auth_key.clone() {
                server = server.with_auth_key(key);
            }
            let addr = format!("0.0.0.0:{}", settings.port);
            println!("{} http://localhost:{}", "ARIA API on".bright_cyan(), settings.port);
            server.run(&addr).await?;
            return Ok(());
        }
        #[cfg(not(feature = "api"))]
        return Err("aria was built without the api feature".into());
    }

    let mut session = factory.create();

    let is_pipe = !io::stdin().is_terminal();
    let one_shot = one_shot_message(&args);
    if is_pipe || one_shot.is_some() {
        let message = match one_shot {
            Some(v) => v,
            None => {
                let mut input = String::new();
                io::stdin().read_to_string(&mut input)?;
                input
            }
        };
        match session.submit(&message).await {
            Ok(reply) => println!("{}", reply.text),
            Err(e) => print_error(&e),
        }
        return Ok(());
    }

    let name = session.persona().persona.name.clone();
    println!("{}", format!("{name} - Personal AI Assistant").bright_cyan());
    println!("Model: {}", session.model().bright_green());
    println!(
        "{}",
        "Commands: 'memory', 'history', 'model [name]', 'clear', 'reset', 'quit'".bright_black()
    );
    rule();

    let mut rl = DefaultEditor::new()?;

    loop {
        io::stdout().flush()?;
        let readline = rl.readline("> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let lowered = trimmed.to_lowercase();
                if lowered == "model" || lowered.starts_with("model ") {
                    let requested = trimmed.get("model".len()..).unwrap_or_default().trim();
                    if requested.is_empty() {
                        println!("Model: {}", session.model().bright_green());
                        continue;
                    }
                    let mut switched = settings.clone();
                    switched.model = requested.to_string();
                    match build_provider(&args, &switched) {
                        Ok((next, _)) => {
                            session.set_provider(next);
                            println!("{} Switched to {}", "✓".bright_green(), requested);
                        }
                        Err(e) => print_error(&e),
                    }
                    continue;
                }

                match lowered.as_str() {
                    "quit" | "exit" | "bye" => {
                        println!("{}", "👋 Goodbye!".bright_cyan());
                        break;
                    }
                    "memory" => {
                        print_memory(&session).await;
                        rule();
                        continue;
                    }
                    "history" => {
                        print_history(&session, &name);
                        rule();
                        continue;
                    }
                    "clear" => {
                        session.clear();
                        println!("{} Conversation cleared, memory kept.", "✓".bright_green());
                        continue;
                    }
                    "reset" => {
                        let answer = rl.readline("Forget everything? Type 'yes' to confirm: ")?;
                        if answer.trim().eq_ignore_ascii_case("yes") {
                            session.reset().await;
                            println!("{} Memory reset.", "✓".bright_green());
                        } else {
                            println!("{} Reset cancelled.", "!".bright_yellow());
                        }
                        continue;
                    }
                    _ => {}
                }

                let mut sp =
                    Spinner::new(Spinners::Dots12, "Thinking...".bright_magenta().to_string());

                match session.submit(trimmed).await {
                    Ok(reply) => {
                        sp.stop();
                        print!("\r\x1B[K");
                        println!("{} {}", format!("> {name}:").bright_green(), reply.text);
                        if !reply.learned.is_empty() {
                            println!(
                                "{}",
                                format!("(noted {} thing(s) about you)", reply.learned.len())
                                    .bright_black()
                            );
                        }
                        rule();
                    }
                    Err(e) => {
                        sp.stop();
                        print!("\r\x1B[K");
                        print_error(&e);
                        rule();
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\n{}", "👋 Goodbye!".bright_cyan());
                break;
            }
            Err(err) => {
                eprintln!("{} {:?}", "Error:".bright_red(), err);
                break;
            }
        }
    }

    Ok(())
}
