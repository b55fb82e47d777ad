use crate::errors::FgtError;
use crate::managers::context::RequestContext;
use crate::managers::policy::MovePosition;
use crate::managers::session::{Outcome, Session};
use crate::services::config::FgtConfig;
use crate::services::filter::{Combinator, FilterSpec};
use crate::services::logger::Logger;
use crate::utils::color::normalize_color;
use crate::utils::country::is_valid_country_code;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fgt-api",
    version,
    about = "FortiGate REST API client using token authentication"
)]
pub struct Cli {
    #[command(flatten)]
    target: TargetArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct TargetArgs {
    #[arg(long, global = true, value_name = "PATH", help = "Config file (default: FGT_CONFIG_PATH or ~/.config/fgt-api/config.json)")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Firewall hostname or address")]
    host: Option<String>,

    #[arg(long, global = true, help = "API token (or FGT_TOKEN)")]
    token: Option<String>,

    #[arg(long, global = true)]
    port: Option<i64>,

    #[arg(long, global = true, value_delimiter = ',', value_name = "VDOM[,VDOM...]")]
    vdom: Vec<String>,

    #[arg(long, global = true, conflicts_with = "vdom", help = "Query across all vdoms")]
    global: bool,

    #[arg(long, global = true, help = "Send the token as access_token instead of a header")]
    query_token: bool,

    #[arg(long, global = true, help = "Verify the firewall's TLS certificate")]
    verify_tls: bool,

    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[arg(long, global = true, value_delimiter = ',', value_name = "FIELD[,FIELD...]")]
    format: Vec<String>,

    #[arg(long, global = true)]
    with_meta: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Firewall address objects (cmdb)
    #[command(subcommand)]
    Address(AddressCommand),
    /// Firewall policies (cmdb + monitor)
    #[command(subcommand)]
    Policy(PolicyCommand),
    /// Firmware information (monitor)
    Firmware,
    /// Check a geography country code
    Country { code: String },
    /// Normalize a color index into 0-32
    Color { value: String },
}

#[derive(Subcommand, Debug)]
enum AddressCommand {
    List,
    Get { name: String },
    Add {
        #[arg(long, help = "Address object as JSON")]
        json: String,
    },
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum PolicyCommand {
    List,
    Get { id: u64 },
    Add {
        #[arg(long, help = "Policy definition as JSON")]
        json: String,
    },
    /// Terms after the first take an `and:` or `or:` prefix, e.g. `name==a or:name==b`
    Search {
        #[arg(required = true)]
        terms: Vec<String>,
    },
    Move {
        id: u64,
        #[arg(long, conflicts_with = "after", required_unless_present = "after")]
        before: Option<u64>,
        #[arg(long)]
        after: Option<u64>,
    },
    Delete { id: u64 },
    Stats,
}

pub async fn run() -> Result<(), FgtError> {
    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Country { code } => {
            print_json(&serde_json::json!({
                "code": code,
                "valid": is_valid_country_code(&code),
            }));
            return Ok(());
        }
        Command::Color { value } => {
            let parsed =
                serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
            print_json(&serde_json::json!({ "color": normalize_color(&parsed) }));
            return Ok(());
        }
        Command::Address(command) => run_address(&mut connect(&cli.target)?, command).await?,
        Command::Policy(command) => run_policy(&mut connect(&cli.target)?, command).await?,
        Command::Firmware => connect(&cli.target)?.firmware().await?,
    };
    report(outcome)
}

fn connect(target: &TargetArgs) -> Result<Session, FgtError> {
    let context = build_context(target)?;
    Ok(Session::connect(Logger::new("fgt"), context))
}

fn build_context(target: &TargetArgs) -> Result<RequestContext, FgtError> {
    let mut config = match target.config.as_deref() {
        Some(path) => {
            let mut config = FgtConfig::load_from_path(path)?;
            config.apply_env()?;
            config
        }
        None => FgtConfig::load()?,
    };
    if let Some(host) = target.host.as_ref() {
        config.host = Some(host.clone());
    }
    if let Some(token) = target.token.as_ref() {
        config.token = Some(token.clone());
    }
    if let Some(port) = target.port {
        config.port = port;
    }
    if !target.vdom.is_empty() {
        config.vdom = Some(target.vdom.join(","));
        config.global = false;
    }
    if target.global {
        config.global = true;
    }
    if target.verify_tls {
        config.cert_verify = true;
    }
    if let Some(timeout_ms) = target.timeout_ms {
        config.timeout_ms = timeout_ms;
    }

    let mut context = config.into_context()?;
    if target.query_token {
        context.use_query_auth();
    }
    if !target.format.is_empty() {
        context.set_format(&target.format)?;
    }
    if target.with_meta {
        context.set_with_meta(true);
    }
    Ok(context)
}

async fn run_address(session: &mut Session, command: AddressCommand) -> Result<Outcome, FgtError> {
    match command {
        AddressCommand::List => session.show_addresses().await,
        AddressCommand::Get { name } => session.get_address(&name).await,
        AddressCommand::Add { json } => session.add_address(parse_json_arg(&json)?).await,
        AddressCommand::Delete { name } => session.delete_address(&name).await,
    }
}

async fn run_policy(session: &mut Session, command: PolicyCommand) -> Result<Outcome, FgtError> {
    match command {
        PolicyCommand::List => session.show_policies().await,
        PolicyCommand::Get { id } => session.get_policy(id).await,
        PolicyCommand::Add { json } => session.add_policy(parse_json_arg(&json)?).await,
        PolicyCommand::Search { terms } => session.search_policies(&parse_search_terms(&terms)).await,
        PolicyCommand::Move { id, before, after } => {
            let (position, reference) = match (before, after) {
                (Some(reference), _) => (MovePosition::Before, reference),
                (None, Some(reference)) => (MovePosition::After, reference),
                (None, None) => {
                    return Err(FgtError::invalid_config("move needs --before or --after"))
                }
            };
            session.move_policy(id, reference, position).await
        }
        PolicyCommand::Delete { id } => session.delete_policy(id).await,
        PolicyCommand::Stats => session.policy_stats().await,
    }
}

fn parse_json_arg(raw: &str) -> Result<Value, FgtError> {
    serde_json::from_str(raw)
        .map_err(|err| FgtError::invalid_config(format!("--json is not valid JSON: {}", err)))
}

/// `and:`/`or:` prefixes pick the combinator; an unprefixed term carries none.
pub fn parse_search_terms<S: AsRef<str>>(terms: &[S]) -> FilterSpec {
    let mut spec = FilterSpec::new();
    for raw in terms {
        let raw = raw.as_ref();
        let split = raw
            .split_once(':')
            .filter(|(prefix, _)| matches!(prefix.to_ascii_lowercase().as_str(), "and" | "or"));
        match split {
            Some((prefix, term)) => spec.insert(term, Combinator::parse(prefix)),
            None => spec.insert(raw, Combinator::None),
        }
    }
    spec
}

fn report(outcome: Outcome) -> Result<(), FgtError> {
    match outcome {
        Outcome::Response(response) => {
            eprintln!("HTTP {}", response.status);
            match response.json() {
                Some(value) => print_json(&value),
                None => println!("{}", response.body),
            }
            Ok(())
        }
        Outcome::NoResponse(err) => Err(err),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_search_terms, Cli};
    use crate::services::filter::{compile_filter, FilterMode};
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_terms_map_prefixes_to_combinators() {
        let spec = parse_search_terms(&["name==a", "or:name==b", "AND:action==accept", "x:y"]);
        let compiled = compile_filter(&spec, FilterMode::Lenient).expect("compile");
        assert_eq!(
            compiled.as_deref(),
            Some("filter=name==a,filter=name==b&filter=action==accept")
        );
    }
}
