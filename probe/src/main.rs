use std::process;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use reqres_core::{ApiClient, ApiError, Body, ClientConfig, HttpMethod, HttpResponse, SchemaValidator};
use tracing_subscriber::EnvFilter;

/// reqres-probe — send one request and show what came back
#[derive(Parser, Debug)]
#[command(name = "reqres-probe", version, about = "Probe a ReqRes-style JSON API")]
struct Cli {
    /// HTTP method: GET, POST, PUT or DELETE
    method: String,

    /// Path relative to the base URL, or an absolute URL
    path: String,

    /// Base URL (defaults to REQRES_BASE_URL or https://reqres.in/api)
    #[arg(long)]
    base_url: Option<String>,

    /// Send `x-api-key`
    #[arg(long)]
    api_key: Option<String>,

    /// Send `Authorization: Bearer <token>`
    #[arg(long)]
    bearer_token: Option<String>,

    /// Timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Query parameter as key=value (repeatable)
    #[arg(short = 'q', long = "query")]
    query: Vec<String>,

    /// Header as name:value (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// JSON request body
    #[arg(short = 'd', long = "data")]
    data: Option<String>,

    /// Validate the response body against this JSON Schema file
    #[arg(long)]
    schema: Option<String>,

    /// Print response headers
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("{} {}", "✖".red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), ApiError> {
    let method = parse_method(&cli.method)?;
    let client = ApiClient::new(config(cli)?);

    let mut builder = client.request(method, &cli.path);
    for pair in &cli.query {
        let (k, v) = split_pair(pair, '=')?;
        builder = builder.query(k, v);
    }
    for pair in &cli.headers {
        let (k, v) = split_pair(pair, ':')?;
        builder = builder.header(k, v.trim());
    }
    if let Some(data) = &cli.data {
        let body: serde_json::Value =
            serde_json::from_str(data).map_err(|e| ApiError::InvalidRequest(format!("--data is not JSON: {e}")))?;
        builder = builder.json(&body);
    }

    let response = builder.send()?;
    print_response(&response, cli.verbose);

    if let Some(path) = &cli.schema {
        let validator = SchemaValidator::from_file(path)?;
        let body = response
            .parsed_body()
            .ok_or_else(|| ApiError::DeserializationError("response body is not JSON".to_string()))?;
        validator.validate(body)?;
        println!("{} body matches {}", "✔".green().bold(), path.bold());
    }
    Ok(())
}

fn config(cli: &Cli) -> Result<ClientConfig, ApiError> {
    let mut config = match &cli.base_url {
        Some(url) => ClientConfig::from_lookup(|key| {
            if key == "REQRES_BASE_URL" {
                Some(url.clone())
            } else {
                std::env::var(key).ok()
            }
        })?,
        None => ClientConfig::from_env()?,
    };
    if let Some(key) = &cli.api_key {
        config = config.with_api_key(key.clone());
    }
    if let Some(token) = &cli.bearer_token {
        config = config.with_bearer_token(token.clone());
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

fn parse_method(raw: &str) -> Result<HttpMethod, ApiError> {
    match raw.to_ascii_uppercase().as_str() {
        "GET" => Ok(HttpMethod::Get),
        "POST" => Ok(HttpMethod::Post),
        "PUT" => Ok(HttpMethod::Put),
        "DELETE" => Ok(HttpMethod::Delete),
        other => Err(ApiError::InvalidRequest(format!("unsupported method {other}"))),
    }
}

fn split_pair(raw: &str, sep: char) -> Result<(&str, &str), ApiError> {
    raw.split_once(sep)
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest(format!("expected name{sep}value, got {raw:?}")))
}

fn print_response(response: &HttpResponse, verbose: bool) {
    let status = response.status().to_string();
    let status = if response.is_success() {
        status.green().bold()
    } else if response.is_client_error() {
        status.yellow().bold()
    } else {
        status.red().bold()
    };
    println!("{} {}", "HTTP".bold(), status);

    if verbose {
        for (name, value) in response.headers() {
            println!("{}: {}", name.dimmed(), value);
        }
        println!();
    }

    match response.json_or_text() {
        Body::Json(value) => match serde_json::to_string_pretty(value) {
            Ok(pretty) => println!("{pretty}"),
            Err(_) => println!("{}", response.text()),
        },
        Body::Text(text) if text.is_empty() => {}
        Body::Text(text) => println!("{text}"),
    }
}
