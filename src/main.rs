use std::io::{BufRead, Write};
use std::process::ExitCode;

use askmodel::config::Config;
use askmodel::dispatch::GenerationProvider;
use askmodel::dispatch::http::HttpDispatch;
use askmodel::observer::TracingObserver;
use askmodel::requester::AnswerRequester;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("ASKMODEL_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    // Load .env next to the binary first, then fall back to the CWD search.
    let exe_env = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(".env")))
        .filter(|path| path.exists());
    match exe_env {
        Some(path) => {
            dotenvy::from_path(&path).ok();
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let list_models = args.iter().any(|a| a == "--list-models" || a == "-l");

    let config = Config::load()?;
    let credentials = config.credentials()?.clone();
    let provider = HttpDispatch::new(config.base_url.clone(), credentials, config.timeout)?;

    if list_models {
        match provider.list_models().await {
            Ok(names) => {
                let mut out = std::io::stdout().lock();
                for name in names {
                    writeln!(out, "{name}")?;
                }
            }
            Err(e) => println!("Could not list models: {e}"),
        }
        return Ok(ExitCode::SUCCESS);
    }

    let question = match read_question(&args)? {
        Some(q) => q,
        None => {
            eprintln!("Empty question. Aborting.");
            return Ok(ExitCode::FAILURE);
        }
    };

    let requester = AnswerRequester::new(provider).with_observer(TracingObserver);
    let request = config.to_request(&question)?;

    match requester.answer(&request).await {
        Ok(result) => {
            println!("{}", result.text);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!("answer failed: {e}");
            eprintln!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Question from the remaining arguments, or one line from stdin.
fn read_question(args: &[String]) -> anyhow::Result<Option<String>> {
    let joined = args
        .iter()
        .filter(|a| *a != "--list-models" && *a != "-l")
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");

    let question = if args.is_empty() {
        eprint!("Type your question for the model: ");
        std::io::stderr().flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        line
    } else {
        joined
    };

    let question = question.trim();
    Ok((!question.is_empty()).then(|| question.to_string()))
}
