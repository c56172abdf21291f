use eyre::WrapErr;
use std::io::{self, BufRead, Write};

/// Initializes a tracing Subscriber for logging
pub fn subscriber() {
    tracing_subscriber::FmtSubscriber::builder()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

/// Loads a dotenv file, if any, before the CLI arguments are parsed.
///
/// A missing `.env` is not an error; a malformed one is ignored as well
/// since the tools must keep working in environments without it.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Prompts for a line of input on stdout and reads it from stdin.
pub fn prompt_line(msg: &str) -> eyre::Result<String> {
    print!("{msg}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).wrap_err("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

/// Securely reads a secret from stdin without echoing, or returns the
/// fallback value which was provided via the environment.
pub fn read_secret(prompt: &str, fallback: Option<String>) -> eyre::Result<String> {
    match fallback {
        Some(secret) => Ok(secret),
        None => rpassword::prompt_password(prompt).wrap_err("failed to read secret from stdin"),
    }
}
