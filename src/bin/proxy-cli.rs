use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use rewrite_proxy::rewrite::{is_fetchable_url, rewrite_html, rewrite_url, to_proxy_url};

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Operator CLI for the rewriting proxy", long_about = None)]
struct Cli {
    /// Base address of a running proxy.
    #[arg(short, long, default_value = "http://localhost:8080")]
    proxy: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a single reference would be rewritten
    RewriteUrl {
        /// Reference as it appears in the document
        raw: String,
        /// Absolute URL of the document
        #[arg(short, long)]
        base: String,
    },
    /// Rewrite a local HTML file (or stdin) offline
    RewriteHtml {
        /// Absolute URL the document was served from
        #[arg(short, long)]
        base: String,
        /// HTML file; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Fetch a target through the running proxy
    Fetch {
        /// Absolute http(s) URL to fetch
        target: String,
        /// Print response headers
        #[arg(short = 'i', long)]
        include_headers: bool,
    },
    /// Check proxy health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let proxy = cli.proxy.trim_end_matches('/');

    match cli.command {
        Commands::RewriteUrl { raw, base } => {
            if !is_fetchable_url(&base) {
                eprintln!("Warning: base '{}' is not an absolute http(s) URL", base);
            }
            println!("{}", rewrite_url(&raw, &base));
        }
        Commands::RewriteHtml { base, file } => {
            let html = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            print!("{}", rewrite_html(&html, &base));
        }
        Commands::Fetch { target, include_headers } => {
            if !is_fetchable_url(&target) {
                eprintln!("Error: '{}' is not an absolute http(s) URL", target);
                std::process::exit(2);
            }
            let client = reqwest::Client::new();
            let res = client
                .get(format!("{}{}", proxy, to_proxy_url(&target)))
                .send()
                .await?;

            eprintln!("{}", res.status());
            if include_headers {
                for (name, value) in res.headers() {
                    eprintln!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
                }
                eprintln!();
            }
            let body = res.bytes().await?;
            print!("{}", String::from_utf8_lossy(&body));
        }
        Commands::Health => {
            let res = reqwest::get(format!("{}/health", proxy)).await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
