use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use api_gateway::http::build_dispatcher;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the DMS API gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:80")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the gateway answers
    Ping,
    /// Ask the gateway to refresh its service registry
    Refresh {
        /// Change index to announce
        #[arg(long)]
        index: u64,
        /// Header carrying the index
        #[arg(long, default_value = "X-Consul-Index")]
        header: String,
    },
    /// Print the compiled route table
    Routes,
    /// Show which route a request would dispatch to
    Match {
        method: String,
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Ping => {
            let res = client.get(format!("{}/ping", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Refresh { index, header } => {
            let mut headers = HeaderMap::new();
            headers.insert(
                HeaderName::try_from(header.as_str())?,
                HeaderValue::from_str(&index.to_string())?,
            );
            let res = client
                .post(format!("{}/events/types/consul-change", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Routes => {
            let dispatcher = build_dispatcher()?;
            for route in dispatcher.routes() {
                println!(
                    "{:<7} {:<60} {:<13} {}",
                    route.method.as_str(),
                    route.pattern.as_str(),
                    route.domain.as_str(),
                    route.handler.name
                );
            }
        }
        Commands::Match { method, path } => {
            let dispatcher = build_dispatcher()?;
            let method = method.to_ascii_uppercase().parse::<axum::http::Method>()?;
            match dispatcher.dispatch(&method, &path) {
                Some(matched) => {
                    println!("route:     {} {}", matched.route.method, matched.route.pattern);
                    println!("domain:    {}", matched.route.domain);
                    println!("operation: {}", matched.route.handler.name);
                    for (name, value) in &matched.params {
                        println!("param:     {} = {}", name, value);
                    }
                }
                None => {
                    eprintln!("No route for {} {}", method, path);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
