//! `tag-bidder`: render partner request URLs and decode VAST answers from files.
//!
//! ```text
//! tag-bidder render --config partner.toml --request bid_request.json [--imp N]
//! tag-bidder render --partner spotx --request bid_request.json
//! tag-bidder decode --response vast.xml --request bid_request.json [--imp N] [--currency USD]
//! tag-bidder partners
//! ```

mod observability;

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use tag_bidder::{
    BidderRegistry, Result, TagBidder, TagBidderConfig, TagBidderError, VastDecoder,
    openrtb::BidRequest, vast::DEFAULT_CURRENCY,
};
use tracing::debug;

use crate::observability::{LogFormat, init_observability};

/// Tag bidder request renderer and VAST decoder.
#[derive(Debug, Parser)]
#[command(name = "tag-bidder", version, about)]
struct Cli {
    /// Log format; defaults to the `LOG_FORMAT` environment variable.
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the partner request URL of every impression.
    Render {
        /// Partner TOML configuration.
        #[arg(long, required_unless_present = "partner", conflicts_with = "partner")]
        config: Option<PathBuf>,

        /// Built-in partner name.
        #[arg(long)]
        partner: Option<String>,

        /// OpenRTB bid request JSON.
        #[arg(long)]
        request: PathBuf,

        /// Only print the URL of this impression position.
        #[arg(long)]
        imp: Option<usize>,
    },

    /// Decode a VAST response and print the bid as JSON.
    Decode {
        /// VAST response body.
        #[arg(long)]
        response: PathBuf,

        /// OpenRTB bid request JSON the response answers.
        #[arg(long)]
        request: PathBuf,

        /// Impression position the response answers.
        #[arg(long, default_value_t = 0)]
        imp: usize,

        /// Currency assumed when the response names none.
        #[arg(long, default_value = DEFAULT_CURRENCY)]
        currency: String,
    },

    /// List built-in partners.
    Partners,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_observability(cli.log_format.unwrap_or_else(LogFormat::from_env), cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Render { config, partner, request, imp } => {
            let bidder = load_bidder(config.as_deref(), partner.as_deref())?;
            let request = read_request(&request)?;
            for uri in render(&bidder, &request, imp)? {
                println!("{uri}");
            }
        }
        Command::Decode { response, request, imp, currency } => {
            let request = read_request(&request)?;
            let body = fs::read(&response).map_err(|e| read_error(&response, &e))?;
            println!("{}", decode(&request, &body, imp, &currency)?);
        }
        Command::Partners => {
            for name in BidderRegistry::with_builtin()?.names() {
                println!("{name}");
            }
        }
    }
    Ok(())
}

fn load_bidder(config: Option<&Path>, partner: Option<&str>) -> Result<TagBidder> {
    if let Some(path) = config {
        return TagBidder::new(TagBidderConfig::from_file(path)?);
    }
    let name = partner.unwrap_or_default();
    BidderRegistry::with_builtin()?
        .get(name)
        .cloned()
        .ok_or_else(|| TagBidderError::InvalidInput(format!("unknown partner: {name}")))
}

fn render(bidder: &TagBidder, request: &BidRequest, imp: Option<usize>) -> Result<Vec<String>> {
    let requests = bidder.make_requests(request)?;
    let uris: Vec<String> = requests
        .into_iter()
        .filter(|data| imp.is_none_or(|index| index == data.imp_index))
        .map(|data| data.uri)
        .collect();

    match imp {
        Some(index) if uris.is_empty() => Err(TagBidderError::InvalidImpressionIndex(index)),
        _ => Ok(uris),
    }
}

fn decode(request: &BidRequest, body: &[u8], imp: usize, currency: &str) -> Result<String> {
    let imp_id = &request.imp.get(imp).ok_or(TagBidderError::InvalidImpressionIndex(imp))?.id;
    let bid = VastDecoder::new().with_default_currency(currency).decode(body, imp_id)?;
    serde_json::to_string_pretty(&bid)
        .map_err(|e| TagBidderError::InvalidInput(format!("cannot serialise bid: {e}")))
}

fn read_request(path: &Path) -> Result<BidRequest> {
    debug!(path = %path.display(), "reading bid request");
    let json = fs::read_to_string(path).map_err(|e| read_error(path, &e))?;
    BidRequest::from_json(&json)
}

fn read_error(path: &Path, error: &std::io::Error) -> TagBidderError {
    TagBidderError::InvalidInput(format!("cannot read {}: {error}", path.display()))
}

#[cfg(test)]
#[allow(
    clippy::unreachable,
    reason = "test code uses unreachable for expected-path assertions"
)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    const REQUEST: &str = r#"{"id":"r","imp":[{"id":"a","tagid":"x"},{"id":"b","tagid":"y"}]}"#;

    fn bidder() -> TagBidder {
        TagBidder::new(TagBidderConfig::new("acme", "https://ads.acme.test/vast?t=%%tagid%%")).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render() {
        let cli = Cli::try_parse_from([
            "tag-bidder", "render", "--config", "p.toml", "--request", "r.json", "--imp", "1",
        ])
        .unwrap();
        let Command::Render { config, partner, imp, .. } = cli.command else {
            unreachable!("render subcommand expected");
        };
        assert_eq!(config, Some(PathBuf::from("p.toml")));
        assert_eq!(partner, None);
        assert_eq!(imp, Some(1));
    }

    #[test]
    fn test_render_requires_config_or_partner() {
        assert!(Cli::try_parse_from(["tag-bidder", "render", "--request", "r.json"]).is_err());
        assert!(
            Cli::try_parse_from([
                "tag-bidder", "render", "--config", "p.toml", "--partner", "spotx", "--request", "r.json",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_parse_decode_defaults() {
        let cli = Cli::try_parse_from([
            "tag-bidder", "--log-format", "json", "decode", "--response", "v.xml", "--request", "r.json",
        ])
        .unwrap();
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        let Command::Decode { imp, currency, .. } = cli.command else {
            unreachable!("decode subcommand expected");
        };
        assert_eq!(imp, 0);
        assert_eq!(currency, "USD");
    }

    #[test]
    fn test_render_all_and_one() {
        let request = BidRequest::from_json(REQUEST).unwrap();
        assert_eq!(
            render(&bidder(), &request, None).unwrap(),
            vec!["https://ads.acme.test/vast?t=x", "https://ads.acme.test/vast?t=y"]
        );
        assert_eq!(render(&bidder(), &request, Some(1)).unwrap(), vec!["https://ads.acme.test/vast?t=y"]);
        assert!(matches!(
            render(&bidder(), &request, Some(4)),
            Err(TagBidderError::InvalidImpressionIndex(4))
        ));
    }

    #[test]
    fn test_decode_prints_json() {
        let request = BidRequest::from_json(REQUEST).unwrap();
        let body = br#"<VAST version="3.0"><Ad><InLine><Pricing>1.5</Pricing></InLine></Ad></VAST>"#;

        let json = decode(&request, body, 1, "EUR").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["imp_id"], "b");
        assert_eq!(value["currency"], "EUR");
        assert_eq!(value["ext"]["vast_version"], "3.0");
    }

    #[test]
    fn test_decode_unknown_impression() {
        let request = BidRequest::from_json(REQUEST).unwrap();
        assert!(matches!(decode(&request, b"<VAST/>", 7, "USD"), Err(TagBidderError::InvalidImpressionIndex(7))));
    }

    #[test]
    fn test_load_builtin_partner() {
        assert_eq!(load_bidder(None, Some("spotx")).unwrap().name(), "spotx");
        assert!(matches!(load_bidder(None, Some("nope")), Err(TagBidderError::InvalidInput(_))));
    }
}
