use anyhow::Result;
use clap::Parser;
use hashchain_core::Chain;
use std::io::{self, Write};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "hashchain")]
#[command(about = "Builds a small hash chain, tampers with one block and re-verifies it")]
struct Cli {
    /// Block whose transactions get overwritten after the first verification
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    tamper_index: i64,

    /// Replacement transactions (repeat the flag for several)
    #[arg(long = "tamper-with", default_value = "100 sCoin to Bob")]
    tamper_with: Vec<String>,

    /// Print the chain as JSON instead of labelled lines
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut out = io::stdout().lock();

    let mut chain = Chain::new();
    chain.append(vec![
        "10 sCoin Alice to Bob".to_string(),
        "15 sCoin Bob to Charlie".to_string(),
    ]);
    chain.append(vec![
        "8 sCoin Bob to Alice".to_string(),
        "1 sCoin Charlie to Alice".to_string(),
    ]);

    print_chain(&mut out, &chain, cli.json)?;
    print_validity(&mut out, &chain)?;

    match chain.tamper(cli.tamper_index, cli.tamper_with) {
        Ok(()) => info!(index = cli.tamper_index, "tampered with block"),
        Err(err) => error!("error modifying chain: {err}"),
    }

    print_validity(&mut out, &chain)?;
    Ok(())
}

fn print_chain(out: &mut impl Write, chain: &Chain, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, chain)?;
        writeln!(out)?;
    } else {
        write!(out, "{chain}")?;
    }
    Ok(())
}

fn print_validity(out: &mut impl Write, chain: &Chain) -> Result<()> {
    let verdict = if chain.verify() { "valid" } else { "invalid" };
    writeln!(out, "Blockchain is {verdict}.")?;
    Ok(())
}
