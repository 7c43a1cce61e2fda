//! `mrtest`: offline companion to the test station
//!
//! Validates module scripts before they are uploaded to a station and renders the results file a
//! station leaves behind.

use anyhow::{ anyhow, Context };
use clap::{ Arg, ArgAction, ArgMatches, Command };
use std::path::{ Path, PathBuf };

use microrack_tester::{
    board::ModuleId,
    results::{ Report, SavedResults },
    Registry,
    StationConfig,
};

const DEFAULT_CONFIG: &str = "station.toml";
const DEFAULT_MODULES: &str = "modules.txt";
const DEFAULT_RESULTS: &str = "results";

fn cli() -> Command
{
    Command::new("mrtest")
        .about("Microrack test station tools")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_name("FILE")
                .help("Station configuration (defaults apply when the file does not exist)"),
        )
        .arg(
            Arg::new("modules")
                .long("modules")
                .short('m')
                .global(true)
                .value_name("FILE")
                .help("Module script, overrides the configuration"),
        )
        .subcommand(Command::new("check").about("Parse the module script and list its modules"))
        .subcommand(
            Command::new("show")
                .about("Print the operations of one module")
                .arg(Arg::new("id").required(true).value_parser(clap::value_parser!(u8)).help("Module ID (0-31)")),
        )
        .subcommand(
            Command::new("report")
                .about("Render a saved results file against the module script")
                .arg(Arg::new("results").value_name("FILE").help("Results file"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the per-operation report as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<StationConfig>
{
    let path = matches.get_one::<String>("config").map(PathBuf::from);

    match path {
        Some(path) => StationConfig::load(&path).with_context(|| format!("loading {}", path.display())),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            StationConfig::load(DEFAULT_CONFIG).with_context(|| format!("loading {}", DEFAULT_CONFIG))
        },
        None => {
            log::debug!("No {}, using default station configuration", DEFAULT_CONFIG);
            Ok(StationConfig::default())
        },
    }
}

fn load_registry(matches: &ArgMatches, config: &StationConfig) -> anyhow::Result<Registry>
{
    let path = matches
        .get_one::<String>("modules")
        .map(PathBuf::from)
        .or_else(|| config.modules.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODULES));

    Registry::load(&path).with_context(|| format!("loading {}", path.display()))
}

fn check(registry: &Registry)
{
    for module in registry.iter() {
        println!("{:>2} {:<20} {} operation(s)", module.id, module.name, module.operations.len());
    }

    println!("{} module(s) OK", registry.len());
}

fn show(registry: &Registry, raw_id: u8) -> anyhow::Result<()>
{
    let id = ModuleId::new(raw_id).ok_or_else(|| anyhow!("module IDs are 5 bits, {} is out of range", raw_id))?;
    let module = registry.lookup(id).ok_or_else(|| anyhow!("no module with ID {}", id))?;

    println!("module {} {}", module.id, module.name);

    for op in module.operations.iter() {
        println!("{}", op);
    }

    Ok(())
}

fn report(registry: &Registry, config: &StationConfig, matches: &ArgMatches) -> anyhow::Result<()>
{
    let path = matches
        .get_one::<String>("results")
        .map(PathBuf::from)
        .or_else(|| config.results.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS));
    let saved = SavedResults::load(&path).with_context(|| format!("loading {}", path.display()))?;
    let module = registry
        .iter()
        .find(|module| module.name == saved.module_name)
        .ok_or_else(|| anyhow!("results are for '{}', which is not in the module script", saved.module_name))?;

    if saved.results.len() != module.operations.len() {
        log::warn!(
            "{} has {} operation(s) but the results file has {} line(s)",
            module.name, module.operations.len(), saved.results.len()
        );
    }

    let report = Report::new(module, &saved.results);

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report.entries())?);
    }
    else {
        println!("{}\n\n{}", report, report.listing());
    }

    Ok(())
}

fn main() -> anyhow::Result<()>
{
    env_logger::init();
    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    let registry = load_registry(&matches, &config)?;

    match matches.subcommand() {
        Some(("check", _)) => check(&registry),
        Some(("show", sub)) => {
            let id = sub.get_one::<u8>("id").copied().ok_or_else(|| anyhow!("missing module ID"))?;
            show(&registry, id)?;
        },
        Some(("report", sub)) => report(&registry, &config, sub)?,
        _ => unreachable!("clap requires a subcommand"),
    }

    Ok(())
}
