use std::process;
use clap::{Args, Parser, Subcommand};
use regex::Regex;
use thiserror::Error;
use rems_inventory::error::{IndexError, InventoryError};
use rems_inventory::inventory::{GeneratorConfig, Inventory, DEFAULT_RECOMMENDATIONS};
use rems_inventory::model::GeoPoint;
use rems_inventory::ordered_index::OrderedIndex;

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid key {0:?}")]
    InvalidKey(String),
    #[error("invalid coordinates {0:?}, expected LAT,LON")]
    InvalidPoint(String),
    #[error(transparent)]
    Regex(#[from] regex::Error),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

#[derive(Parser, Debug)]
#[command(name = "rems", about = "Real-estate inventory backed by hand-rolled data structures")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build an ordered index from integer keys and print it in order.
    Index {
        #[arg(name = "keys", required = true, allow_negative_numbers = true)]
        keys: Vec<String>,
        #[arg(long, short, allow_negative_numbers = true)]
        delete: Vec<String>,
    },
    /// Generate an inventory and print selected entities.
    Demo {
        #[command(flatten)]
        generate: GenerateArgs,
        #[arg(long)]
        property: Option<u32>,
        #[arg(long)]
        client: Option<u32>,
        #[arg(long)]
        agent: Option<u32>,
    },
    /// Recommend properties matching a client's requirements, closest first.
    Recommend {
        #[command(flatten)]
        generate: GenerateArgs,
        #[arg(long)]
        client: u32,
        #[arg(long, allow_hyphen_values = true)]
        near: String,
        #[arg(long, default_value_t = DEFAULT_RECOMMENDATIONS)]
        limit: usize,
    },
    /// List the properties closest to a property by great-circle distance.
    Nearest {
        #[command(flatten)]
        generate: GenerateArgs,
        #[arg(long)]
        property: u32,
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long, default_value_t = 100)]
    properties: u32,
    #[arg(long, default_value_t = 100)]
    clients: u32,
    #[arg(long, default_value_t = 10)]
    agents: u32,
    #[arg(long)]
    seed: Option<u64>,
}

impl From<&GenerateArgs> for GeneratorConfig {
    fn from(args: &GenerateArgs) -> Self {
        GeneratorConfig{
            properties: args.properties,
            clients: args.clients,
            agents: args.agents,
            seed: args.seed,
        }
    }
}

fn parse_keys(args: &[String]) -> Result<Vec<i64>, CliError> {
    let re_separator = Regex::new(r"[,\s]+")?;
    let mut keys = Vec::new();
    for arg in args {
        for key in re_separator.split(arg).filter(|k| !k.is_empty()) {
            keys.push(key.parse().map_err(|_| CliError::InvalidKey(key.to_string()))?);
        }
    }
    Ok(keys)
}

fn parse_point(s: &str) -> Result<GeoPoint, CliError> {
    let re_point = Regex::new(r"(?x)
                               ^\s*(?P<LAT>[+-]?[0-9]+(?:\.[0-9]+)?)
                               \s*,\s*
                               (?P<LON>[+-]?[0-9]+(?:\.[0-9]+)?)\s*$")?;
    let invalid = || CliError::InvalidPoint(s.to_string());
    let captures = re_point.captures(s).ok_or_else(invalid)?;
    let latitude: f64 = captures["LAT"].parse().map_err(|_| invalid())?;
    let longitude: f64 = captures["LON"].parse().map_err(|_| invalid())?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(invalid());
    }
    Ok(GeoPoint::new(latitude, longitude))
}

fn run_index(keys: &[String], delete: &[String]) -> Result<(), CliError> {
    let mut index = OrderedIndex::new(|k: &i64| *k);
    for key in parse_keys(keys)? {
        index.insert(key)?;
    }
    for key in parse_keys(delete)? {
        if index.delete(&key).is_none() {
            log::info!("key {} not present", key);
        }
    }

    let ordered = index.iter().map(|k| k.to_string()).collect::<Vec<_>>();
    println!("ordered: {}", ordered.join(" "));
    println!("height: {}", index.height());
    println!("len: {}", index.len());
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Index{keys, delete} => run_index(&keys, &delete)?,
        Command::Demo{generate, property, client, agent} => {
            let inventory = Inventory::generate(&GeneratorConfig::from(&generate))?;
            println!("{} properties, {} clients, {} agents",
                     generate.properties, generate.clients, generate.agents);
            if let Some(id) = property {
                println!();
                println!("{}", inventory.property(id)?);
            }
            if let Some(id) = client {
                println!();
                println!("{}", inventory.client(id)?);
            }
            if let Some(id) = agent {
                println!();
                println!("{}", inventory.agent(id)?);
            }
        },
        Command::Recommend{generate, client, near, limit} => {
            let near = parse_point(&near)?;
            let inventory = Inventory::generate(&GeneratorConfig::from(&generate))?;
            println!("{}", inventory.client(client)?);
            for p in inventory.recommend_properties(client, &near, limit)? {
                println!();
                println!("{}", p);
                println!("Distance: {:.2} km", near.distance_km(&p.position));
            }
        },
        Command::Nearest{generate, property, count} => {
            let inventory = Inventory::generate(&GeneratorConfig::from(&generate))?;
            for (id, km) in inventory.nearest_properties(property, count)? {
                println!("{}\t{:.2} km", id, km);
            }
        },
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let _r = env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .format_target(false)
        .format_timestamp(None)
        .try_init();

    if let Err(e) = run(cli) {
        eprintln!("rems: {}", e);
        process::exit(1);
    }
}


#[test]
fn test_parse_keys() {
    let args = vec!["5,3 8".to_string(), "-1".to_string(), " 4, ".to_string()];
    assert_eq!(parse_keys(&args).unwrap(), vec![5, 3, 8, -1, 4]);
    assert!(matches!(parse_keys(&["x1".to_string()]), Err(CliError::InvalidKey(k)) if k == "x1"));
}

#[test]
fn test_parse_point() {
    assert_eq!(parse_point("40.2,-74.7").unwrap(), GeoPoint::new(40.2, -74.7));
    assert_eq!(parse_point(" -33.86 , 151.2 ").unwrap(), GeoPoint::new(-33.86, 151.2));
    assert!(parse_point("40.2").is_err());
    assert!(parse_point("95,0").is_err());
}

#[test]
fn test_cli_parses() {
    let cli = Cli::try_parse_from(["rems", "index", "5", "3", "--delete", "5"]).unwrap();
    match cli.command {
        Command::Index{keys, delete} => {
            assert_eq!(keys, vec!["5", "3"]);
            assert_eq!(delete, vec!["5"]);
        },
        _ => panic!("unexpected command"),
    }
}
