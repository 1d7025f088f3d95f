// schemaforge command line tool
//
// Loads a JSON model file and prints either the Avro-style schema of a record
// or fake instances of it as JSON lines.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use schemaforge::{
    BuilderConfig, FakeGenerator, GeneratorConfig, JsonModel, RecordRegistry, SchemaBuilder, Value,
};

#[derive(Parser, Debug)]
#[command(name = "schemaforge")]
#[command(about = "Schema trees and fake instances from record models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the schema of a record.
    Schema {
        /// JSON model file declaring the records.
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        record: String,
        /// Accept union defaults matching any member, not only the first.
        #[arg(long, default_value_t = false)]
        relaxed_unions: bool,
    },
    /// Print fake instances of a record, one JSON document per line.
    Fake {
        /// JSON model file declaring the records.
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        record: String,
        /// Seed for reproducible output; entropy when absent.
        #[arg(long)]
        seed: Option<u64>,
        /// JSON file with generator settings.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Pin a top-level field, as `field=<json>`. Repeatable.
        #[arg(long = "set", value_name = "FIELD=JSON")]
        overrides: Vec<String>,
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    try_main().map_err(|err| {
        eprintln!("{err:#}");
        err
    })
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Schema {
            model,
            record,
            relaxed_unions,
        } => run_schema(&model, &record, relaxed_unions),
        Command::Fake {
            model,
            record,
            seed,
            config,
            overrides,
            count,
        } => run_fake(&model, &record, seed, config.as_deref(), &overrides, count),
    }
}

fn load_model(path: &Path) -> Result<JsonModel> {
    JsonModel::load(path).with_context(|| format!("loading model {}", path.display()))
}

fn run_schema(model_path: &Path, record: &str, relaxed_unions: bool) -> Result<()> {
    let registry = RecordRegistry::with_provider(load_model(model_path)?);
    let config = BuilderConfig {
        enforce_union_default_order: !relaxed_unions,
    };
    let schema = SchemaBuilder::with_config(&registry, config)
        .build_json(record)
        .with_context(|| format!("building schema for '{}'", record))?;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_fake(
    model_path: &Path,
    record: &str,
    seed: Option<u64>,
    config_path: Option<&Path>,
    raw_overrides: &[String],
    count: usize,
) -> Result<()> {
    let model = load_model(model_path)?;
    let overrides = parse_overrides(&model, record, raw_overrides)?;
    let config = match config_path {
        Some(path) => load_generator_config(path)?,
        None => GeneratorConfig::default(),
    };

    let registry = RecordRegistry::with_provider(model);
    let mut generator = match seed {
        Some(seed) => {
            info!("Generating {} '{}' instance(s) with seed {}", count, record, seed);
            FakeGenerator::seeded(&registry, seed)
        }
        None => FakeGenerator::from_entropy(&registry),
    };
    generator.set_config(config);

    let instances = generator
        .generate_many(record, &overrides, count)
        .with_context(|| format!("generating '{}'", record))?;
    for instance in instances {
        println!("{}", Value::Record(instance).to_json());
    }
    Ok(())
}

fn load_generator_config(path: &Path) -> Result<GeneratorConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing generator config {}", path.display()))
}

/// Splits `field=<json>` pairs and converts each value for its field
fn parse_overrides(model: &JsonModel, record: &str, raw: &[String]) -> Result<HashMap<String, Value>> {
    let mut overrides = HashMap::new();
    for pair in raw {
        let (field, json) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("override '{}' must have the form field=<json>", pair))?;
        let json: serde_json::Value =
            serde_json::from_str(json).with_context(|| format!("override for '{}' is not valid JSON", field))?;
        let value = model.field_value(record, field, &json)?;
        overrides.insert(field.to_string(), value);
    }
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MODEL: &str = r#"{"records": [{"name": "User", "fields": [
        {"name": "name", "type": "string"},
        {"name": "age", "type": "int32"}
    ]}]}"#;

    #[test]
    fn test_cli_parses_fake_command() {
        let cli = Cli::try_parse_from([
            "schemaforge", "fake", "--model", "m.json", "--record", "User", "--seed", "3", "--set", "age=42",
            "--set", "name=\"bond\"", "--count", "2",
        ])
        .unwrap();
        match cli.command {
            Command::Fake {
                seed, overrides, count, ..
            } => {
                assert_eq!(seed, Some(3));
                assert_eq!(overrides, vec!["age=42".to_string(), "name=\"bond\"".to_string()]);
                assert_eq!(count, 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_overrides() {
        let model = JsonModel::parse(MODEL).unwrap();
        let overrides =
            parse_overrides(&model, "User", &["age=42".to_string(), "name=\"bond\"".to_string()]).unwrap();
        assert_eq!(overrides.get("age"), Some(&Value::Int(42)));
        assert_eq!(overrides.get("name"), Some(&Value::from("bond")));

        assert!(parse_overrides(&model, "User", &["age".to_string()]).is_err());
        assert!(parse_overrides(&model, "User", &["age=forty".to_string()]).is_err());
    }

    #[test]
    fn test_load_generator_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"max_items": 5}"#).unwrap();
        let config = load_generator_config(file.path()).unwrap();
        assert_eq!(config.max_items, 5);
        assert_eq!(config.min_items, 1);
    }
}
