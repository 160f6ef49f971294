//! neurohub CLI client
//!
//! A command-line client that talks to the neurohub daemon over HTTP.
//! Uses rustyline for readline-style editing and history.

use clap::Parser;
use rustyline::Editor;
use rustyline::history::FileHistory;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Execution envelope returned by the daemon
#[derive(Debug, Deserialize)]
struct ExecutionResult {
    success: bool,
    message: String,
}

#[derive(Debug, Serialize)]
struct WorkflowBody<'a> {
    script: &'a str,
}

#[derive(Debug, Serialize)]
struct CommandBody<'a> {
    command: &'a str,
}

/// CLI arguments
#[derive(Debug, Parser)]
#[command(name = "neurohub-cli")]
#[command(about = "neurohub daemon CLI client")]
struct Args {
    /// Daemon base URL
    #[arg(short, long, default_value = "http://127.0.0.1:8765")]
    target: String,

    /// Request timeout in seconds (workflows may run for 300s)
    #[arg(long, default_value = "330")]
    timeout: u64,

    /// History file path
    #[arg(long)]
    history_file: Option<PathBuf>,
}

/// CLI configuration
#[derive(Debug, Clone)]
struct Config {
    target: String,
    timeout_secs: u64,
    history_file: PathBuf,
}

impl Config {
    fn from_args(args: Args) -> Self {
        let history_file = args.history_file.unwrap_or_else(|| {
            dirs::home_dir()
                .map(|p| p.join(".neurohub_history"))
                .unwrap_or_else(|| PathBuf::from(".neurohub_history"))
        });

        Self {
            target: args.target.trim_end_matches('/').to_string(),
            timeout_secs: args.timeout,
            history_file,
        }
    }
}

/// One parsed REPL line
#[derive(Debug, PartialEq, Eq)]
enum Action<'a> {
    Workflow(&'a str),
    Install(&'a str),
    Run(&'a str),
    Resources,
    Help,
}

const HELP: &str = "\
Commands:
  workflow <script>        run a script from the workflows directory
  install <command line>   run a 'sudo apt install ...' command
  run <command line>       run an ad-hoc command
  resources                print the resource catalog
  help                     show this message";

/// Parse a trimmed, non-empty input line
fn parse_line(line: &str) -> Result<Action<'_>, String> {
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let arg = |what: &str| {
        if rest.is_empty() {
            Err(format!("'{verb}' needs {what}"))
        } else {
            Ok(rest)
        }
    };

    match verb {
        "workflow" => arg("a script name").map(Action::Workflow),
        "install" => arg("a command line").map(Action::Install),
        "run" => arg("a command line").map(Action::Run),
        "resources" => Ok(Action::Resources),
        "help" | "?" => Ok(Action::Help),
        other => Err(format!("unknown command '{other}', type 'help'")),
    }
}

/// Main client state
struct Client {
    http: reqwest::Client,
    config: Config,
}

impl Client {
    fn new(config: Config) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.target, path)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> reqwest::Result<ExecutionResult> {
        self.http
            .post(self.url(path))
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    async fn resources(&self) -> reqwest::Result<serde_json::Value> {
        self.http
            .get(self.url("/api/resources"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// Run one action and render its output
    async fn handle(&self, action: Action<'_>) -> reqwest::Result<String> {
        let result = match action {
            Action::Workflow(script) => {
                self.post("/api/run-workflow", &WorkflowBody { script }).await?
            }
            Action::Install(command) => {
                self.post("/api/install-tool", &CommandBody { command }).await?
            }
            Action::Run(command) => self.post("/api/run-command", &CommandBody { command }).await?,
            Action::Resources => {
                let catalog = self.resources().await?;
                return Ok(serde_json::to_string_pretty(&catalog).unwrap_or_default());
            }
            Action::Help => return Ok(HELP.to_string()),
        };

        if result.success {
            Ok(result.message)
        } else {
            Ok(format!("[error] {}", result.message))
        }
    }
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    let config = Config::from_args(args);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async { run_client(config).await })
}

async fn run_client(config: Config) -> io::Result<()> {
    let client = Client::new(config.clone()).map_err(io::Error::other)?;

    let mut rl: Editor<(), FileHistory> = Editor::new().map_err(io::Error::other)?;

    if config.history_file.exists()
        && let Err(e) = rl.load_history(&config.history_file)
    {
        eprintln!("[warning] Failed to load history: {}", e);
    }

    println!("neurohub-cli v{}", env!("CARGO_PKG_VERSION"));
    println!("Target: {}", client.config.target);
    println!("Type 'help' for commands. Ctrl+D to quit.");
    println!();

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(input);

                let action = match parse_line(input) {
                    Ok(action) => action,
                    Err(e) => {
                        println!("[error] {}", e);
                        continue;
                    }
                };

                print!("[waiting...]");
                io::stdout().flush()?;

                let rendered = client.handle(action).await;
                print!("\r");
                match rendered {
                    Ok(text) => println!("{}", text),
                    Err(e) => println!("[error] {}", e),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("[error] Readline error: {}", e);
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(&config.history_file) {
        eprintln!("[warning] Failed to save history: {}", e);
    }

    println!("\nGoodbye!");
    Ok(())
}
