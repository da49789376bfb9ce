//! Rotate the signing key for one key set.
//!
//! Reads a rotation request as JSON from stdin, runs the rotation against AWS and writes the JSON
//! response to stdout. Exits non-zero when the rotation fails.
//!
//! ```text
//! echo '{"keyAlias":"token-signer", ...}' | jwks-rotate
//! ```

use std::process::ExitCode;

use jwks_rotate::handler;
use jwks_rotate::Config;
use tokio::io::{self, AsyncReadExt, AsyncWriteExt};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const LOG_LEVEL_VAR: &str = "JWKS_LOG_LEVEL";

#[tokio::main]
async fn main() -> ExitCode {
    let level = std::env::var(LOG_LEVEL_VAR)
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    let subscriber =
        FmtSubscriber::builder().with_max_level(level).with_writer(std::io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber).expect("set default subscriber");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("invalid configuration: {e}");
            println!("{}", e.to_json());
            return ExitCode::FAILURE;
        }
    };

    let mut body = Vec::new();
    if let Err(e) = io::stdin().read_to_end(&mut body).await {
        tracing::error!("unable to read request: {e}");
        return ExitCode::FAILURE;
    }
    let body = if body.iter().all(u8::is_ascii_whitespace) { None } else { Some(body.as_slice()) };

    let sdk_config = jwks_rotate_aws::load_sdk_config().await;
    let rotator = jwks_rotate_aws::rotator(&sdk_config, config);
    let response = handler::handle(&rotator, body).await;

    let mut stdout = io::stdout();
    let written = async {
        stdout.write_all(response.body.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await
    };
    if let Err(e) = written.await {
        tracing::error!("unable to write response: {e}");
        return ExitCode::FAILURE;
    }

    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        tracing::error!(status = response.status_code, "rotation failed");
        ExitCode::FAILURE
    }
}
