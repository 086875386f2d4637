//! sparql-orm - validate resources against an OWL ontology
//!
//! Loads Turtle files into an in-memory store and runs the restriction
//! validator over a JSON batch, or prints what a class requires.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oxigraph::model::NamedNode;
use serde::{Deserialize, Serialize};
use tracing::Level;

use sparql_orm::{
    MappingConfig, OxigraphExecutor, ResourceModel, RestrictionRange, RestrictionStore, SparqlRestrictionStore,
    SparqlService,
};

#[derive(Parser)]
#[command(name = "sparql-orm")]
#[command(version)]
#[command(about = "OWL restriction validation for RDF resources", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a JSON array of resources as one batch
    Validate {
        /// Ontology (Turtle)
        #[arg(long)]
        ontology: PathBuf,
        /// Existing data referenced by the resources (Turtle)
        #[arg(long)]
        data: Option<PathBuf>,
        /// Resources: [{"uri"?, "type", "values": {property: [values]}}]
        #[arg(long)]
        input: PathBuf,
        /// Engine configuration (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Stop recording errors after this many
        #[arg(long)]
        error_limit: Option<usize>,
    },
    /// Print the restrictions a class imposes
    Restrictions {
        /// Ontology (Turtle)
        #[arg(long)]
        ontology: PathBuf,
        /// Class IRI
        #[arg(long)]
        class: String,
        /// Ignore restrictions inherited from superclasses
        #[arg(long)]
        no_ancestors: bool,
    },
}

#[derive(Deserialize)]
struct InputResource {
    uri: Option<String>,
    #[serde(rename = "type")]
    rdf_type: String,
    #[serde(default)]
    values: BTreeMap<String, Vec<String>>,
}

impl InputResource {
    fn into_model(self) -> Result<ResourceModel> {
        let rdf_type = NamedNode::new(self.rdf_type.as_str()).with_context(|| format!("invalid type {}", self.rdf_type))?;
        let mut model = ResourceModel::new(rdf_type);
        if let Some(uri) = self.uri {
            model = model.with_uri(NamedNode::new(uri.as_str()).with_context(|| format!("invalid uri {}", uri))?);
        }
        for (property, values) in self.values {
            let property = NamedNode::new(property.as_str()).with_context(|| format!("invalid property {}", property))?;
            for value in values {
                model.assert(property.clone(), value);
            }
        }
        Ok(model)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RestrictionRecord {
    property: String,
    required: bool,
    list: bool,
    range_kind: &'static str,
    range: String,
}

fn load_store(ontology: &PathBuf, data: Option<&PathBuf>, config: &MappingConfig) -> Result<OxigraphExecutor> {
    let executor = OxigraphExecutor::new()?.with_timeout(config.query_timeout());
    executor
        .load_file(ontology)
        .with_context(|| format!("loading ontology {}", ontology.display()))?;
    if let Some(data) = data {
        executor
            .load_file(data)
            .with_context(|| format!("loading data {}", data.display()))?;
    }
    Ok(executor)
}

fn validate(
    ontology: PathBuf,
    data: Option<PathBuf>,
    input: PathBuf,
    config: Option<PathBuf>,
    error_limit: Option<usize>,
) -> Result<bool> {
    let mut config = match config {
        Some(path) => MappingConfig::load(&path).with_context(|| format!("loading config {}", path.display()))?,
        None => MappingConfig::default(),
    };
    if error_limit.is_some() {
        config = config.with_error_limit(error_limit);
    }

    let executor = load_store(&ontology, data.as_ref(), &config)?;
    let content = fs::read_to_string(&input).with_context(|| format!("reading {}", input.display()))?;
    let resources: Vec<InputResource> = serde_json::from_str(&content).context("parsing input resources")?;
    let mut models = resources
        .into_iter()
        .map(InputResource::into_model)
        .collect::<Result<Vec<_>>>()?;

    let service = SparqlService::over_store(Arc::new(executor), config)?;
    let report = service.validate_resources(&mut models)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report.is_valid())
}

fn restrictions(ontology: PathBuf, class: String, no_ancestors: bool) -> Result<()> {
    let config = MappingConfig::default();
    let store = SparqlRestrictionStore::new(load_store(&ontology, None, &config)?);
    let class = NamedNode::new(class.as_str()).with_context(|| format!("invalid class {}", class))?;

    let restrictions = store.class_restrictions(&class, !no_ancestors)?;
    let records: Vec<RestrictionRecord> = restrictions
        .iter()
        .map(|r| RestrictionRecord {
            property: r.on_property.as_str().to_string(),
            required: r.required,
            list: r.is_list,
            range_kind: match r.range {
                RestrictionRange::DataRange(_) => "datatype",
                RestrictionRange::Class(_) => "class",
            },
            range: r.range.iri().as_str().to_string(),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate {
            ontology,
            data,
            input,
            config,
            error_limit,
        } => {
            if !validate(ontology, data, input, config, error_limit)? {
                std::process::exit(1);
            }
        }
        Commands::Restrictions {
            ontology,
            class,
            no_ancestors,
        } => restrictions(ontology, class, no_ancestors)?,
    }
    Ok(())
}
