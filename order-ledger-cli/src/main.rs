//! order-ledger: query products, customers and orders kept in an Excel workbook

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use is_terminal::IsTerminal;

use order_ledger::cli;
use order_ledger::config::Config;

#[derive(Parser)]
#[command(name = "order-ledger")]
#[command(about = "Query product, customer and order records kept in an Excel workbook")]
#[command(version)]
struct Cli {
    /// Workbook to load instead of prompting for a path
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Config file (default: <config dir>/order-ledger/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Cli::parse();

    if args.no_color || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let config = Config::load(args.config.as_deref())?;
    let initial_file = args.file.or_else(|| config.default_file.clone());

    cli::run(&config, initial_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_args() {
        let args = Cli::try_parse_from(["order-ledger", "-f", "orders.xlsx", "--no-color"]).unwrap();
        assert_eq!(args.file, Some(PathBuf::from("orders.xlsx")));
        assert_eq!(args.config, None);
        assert!(args.no_color);
    }
}
