//! Link a small product line given on the command line.
//!
//! Each `--module` is `NAME: ENTRY...`, where an entry is `+sym:type@cond`
//! (export) or `-sym:type@cond` (import). The condition defaults to `true`
//! and must not contain spaces:
//!
//! ```text
//! cargo run --example link -- \
//!     --module 'main.c: -send:int +main:int' \
//!     --module 'net.c: +send:int@NET' \
//!     --module 'stub.c: +send:int@!NET&&STUB'
//! ```

use clap::Parser;
use color_eyre::eyre::{bail, eyre};
use log::info;

use varlink::condition::BddOracle;
use varlink::ctype::CType;
use varlink::interface::Interface;
use varlink::reference::Ref;
use varlink::signature::{Position, Signature};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Module description, repeatable.
    #[arg(short, long = "module", value_name = "SPEC")]
    modules: Vec<String>,

    /// Global feature model the composition must not narrow.
    #[clap(long, value_name = "EXPR")]
    global: Option<String>,

    /// BDD size (in bits).
    #[clap(long, value_name = "INT", default_value = "20", value_parser = clap::value_parser!(u32).range(..=31))]
    size: u32,

    /// Enable debug logging.
    #[clap(short, long)]
    verbose: bool,
}

const SAMPLE: &[&str] = &[
    "main.c: -send:int -log:int +main:int",
    "net.c: +send:int@NET -log:int@NET",
    "stub.c: +send:int@!NET",
    "log.c: +log:int@LOG +log:long@!LOG",
];

fn parse_type(s: &str) -> CType {
    match s {
        "void" => CType::Void,
        "char" => CType::Char,
        "int" => CType::Int,
        "long" => CType::Long,
        "float" => CType::Float,
        "double" => CType::Double,
        _ => CType::Unknown(s.to_string()),
    }
}

fn parse_module(oracle: &BddOracle, spec: &str) -> color_eyre::Result<Interface<Ref, CType>> {
    let (file, entries) = spec
        .split_once(':')
        .ok_or_else(|| eyre!("missing ':' after the module name in {:?}", spec))?;
    let file = file.trim();

    let mut imports = Vec::new();
    let mut exports = Vec::new();
    for (column, entry) in entries.split_whitespace().enumerate() {
        let (is_export, rest) = if let Some(rest) = entry.strip_prefix('+') {
            (true, rest)
        } else if let Some(rest) = entry.strip_prefix('-') {
            (false, rest)
        } else {
            bail!("entry {:?} must start with '+' or '-'", entry);
        };
        let (decl, cond) = rest.split_once('@').unwrap_or((rest, "true"));
        let (name, ty) = decl
            .split_once(':')
            .ok_or_else(|| eyre!("entry {:?} has no type", entry))?;
        let condition = oracle.parse(cond)?;
        let position = Position::new(file, 1, column as u32 + 1);
        let sig = Signature::new(name, condition, parse_type(ty), vec![position]);
        if is_export {
            exports.push(sig);
        } else {
            imports.push(sig);
        }
    }

    Ok(Interface::new(oracle, imports, exports))
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.verbose {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Info
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let oracle = BddOracle::new(args.size as usize);

    let specs: Vec<String> = if args.modules.is_empty() {
        SAMPLE.iter().map(|s| s.to_string()).collect()
    } else {
        args.modules.clone()
    };
    let modules = specs
        .iter()
        .map(|spec| parse_module(&oracle, spec))
        .collect::<color_eyre::Result<Vec<_>>>()?;

    for (spec, module) in specs.iter().zip(&modules) {
        if !module.is_wellformed(&oracle) {
            info!("module {:?} is not well-formed on its own", spec);
        }
    }

    let compatible = Interface::is_compatible_to_all(&oracle, &modules);
    println!("compatible: {}", compatible);

    let linked = Interface::link_all(&oracle, &modules);
    println!("{}", linked.describe(&oracle));
    println!("stats: {:?}", linked.stats());
    println!("well-formed: {}", linked.is_wellformed(&oracle));
    println!("complete: {}", linked.is_complete(&oracle));
    println!("fully configured: {}", linked.is_fully_configured(&oracle));
    println!(
        "valid configurations: {} over {} options",
        oracle.count_configurations(linked.feature_model()),
        oracle.num_options()
    );
    if let Some(config) = oracle.witness(linked.feature_model()) {
        println!("example configuration: {:?}", config);
    }

    if let Some(global) = &args.global {
        let global = oracle.parse(global)?;
        println!(
            "compatible with global feature model: {}",
            linked.compatible_with_global_feature_model(&oracle, &global)
        );
    }

    info!("oracle = {:?}", oracle);

    Ok(())
}
