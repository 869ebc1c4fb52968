use chrono::Utc;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;
use wallet_confirm::{
    challenge::build_challenge,
    config::AppConfig,
    session::token_from_url,
    token::{self, format_time_remaining},
    VerificationClient,
};

/// Decodes a verification token and shows what the confirmation flow
/// would see: claims, expiry, and the exact challenge message.
#[derive(Parser, Debug)]
#[command(name = "inspect_token")]
#[command(about = "Inspect a wallet verification token or confirmation URL")]
struct Args {
    /// Raw token or full confirmation URL
    token: String,

    /// Configuration file path (used for --check-health)
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Also probe the backend health endpoint
    #[arg(long)]
    check_health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging();

    let raw = if args.token.contains("://") {
        let url = Url::parse(&args.token)?;
        token_from_url(&url)
            .ok_or_else(|| anyhow::anyhow!("URL carries no token query parameter"))?
    } else {
        args.token.clone()
    };

    let claims = token::parse(&raw)?;
    let now = Utc::now();

    println!("Subject UUID: {}", claims.subject_uuid);
    println!("Account ID:   {}", claims.account_id);
    match claims.expires_at_time() {
        Some(at) => println!("Expires at:   {} ({})", at, claims.expires_at),
        None => println!("Expires at:   {} (out of range)", claims.expires_at),
    }
    println!(
        "Remaining:    {}",
        format_time_remaining(claims.time_remaining(now))
    );
    if claims.is_expired(now) {
        println!("Status:       EXPIRED - the backend will reject this token");
    } else {
        println!("Status:       valid");
    }
    println!("Challenge:    {:?}", build_challenge(&claims));

    if args.check_health {
        let config = AppConfig::load(&args.config)?;
        let client = VerificationClient::new(&config);
        let healthy = client.check_health().await;
        println!(
            "Backend:      {} ({})",
            if healthy { "healthy" } else { "unreachable" },
            client.base_url()
        );
    }

    Ok(())
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wallet_confirm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
