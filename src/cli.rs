// CLI adapter over the estimation core

use crate::diff::diff_estimates;
use crate::errors::EstimateError;
use crate::estimator::{EstimateInput, EstimateOptions, Estimator};
use crate::loader;
use crate::mode::EvaluationMode;
use crate::report;
use crate::warehouse::{JsonCatalog, PricingWarehouse, SqliteWarehouse};
use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "costscope")]
#[command(about = "Deterministic monthly AWS cost estimation for Terraform", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (json, text)
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: String,
}

#[derive(Args)]
struct CatalogArgs {
    /// Catalog database URL (e.g. sqlite://catalog.db)
    #[arg(long, env = "COSTSCOPE_CATALOG_DB", default_value = "sqlite://catalog.db")]
    catalog_db: String,

    /// Catalog snapshot JSON file; takes precedence over the database
    #[arg(long)]
    catalog_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate monthly cost for a Terraform source tree or plan JSON
    ///
    /// Examples:
    ///   costscope estimate ./infra
    ///   costscope estimate tfplan.json --mode STRICT
    ///   costscope estimate ./infra --catalog-file catalog.json -f json
    Estimate {
        /// Terraform source directory or plan JSON file
        path: PathBuf,

        /// Evaluation mode: STRICT, CONSERVATIVE, or OPTIMISTIC
        #[arg(short, long, env = "EVALUATION_MODE")]
        mode: Option<String>,

        #[command(flatten)]
        catalog: CatalogArgs,

        /// Include assumed EC2 data-transfer-out usage
        #[arg(long)]
        include_data_transfer: bool,

        /// Fail instead of emitting zero-cost items for unpriceable usage
        #[arg(long)]
        fail_on_unpriceable: bool,
    },

    /// Compare cost between two Terraform inputs
    ///
    /// Examples:
    ///   costscope diff --before baseline.json --after new-plan.json
    ///   costscope diff -b ./infra-main -a ./infra-branch -f json
    Diff {
        /// Baseline source directory or plan file
        #[arg(short, long)]
        before: PathBuf,

        /// Proposed source directory or plan file
        #[arg(short, long)]
        after: PathBuf,

        /// Evaluation mode: STRICT, CONSERVATIVE, or OPTIMISTIC
        #[arg(short, long, env = "EVALUATION_MODE")]
        mode: Option<String>,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Show the current catalog version for a (service, region) pair
    CatalogVersion {
        #[arg(long, default_value = "AmazonEC2")]
        service: String,

        #[arg(long, default_value = "us-east-1")]
        region: String,

        #[command(flatten)]
        catalog: CatalogArgs,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Estimate {
            path,
            mode,
            catalog,
            include_data_transfer,
            fail_on_unpriceable,
        } => {
            let warehouse = open_warehouse(&catalog).await?;
            let estimator = Estimator::new(warehouse);
            let mut options = EstimateOptions::with_mode(parse_mode(mode)?);
            options.default_region = env_region();
            options.include_data_transfer = include_data_transfer;
            options.fail_on_unpriceable = fail_on_unpriceable;

            let estimate = estimator.estimate(classify_input(&path)?, &options).await?;
            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&estimate)?),
                _ => print!("{}", report::render_estimate(&estimate)),
            }
        }

        Commands::Diff {
            before,
            after,
            mode,
            catalog,
        } => {
            let warehouse = open_warehouse(&catalog).await?;
            let estimator = Estimator::new(warehouse);
            let mut options = EstimateOptions::with_mode(parse_mode(mode)?);
            options.default_region = env_region();

            let before = estimator.estimate(classify_input(&before)?, &options).await?;
            let after = estimator.estimate(classify_input(&after)?, &options).await?;
            let diff = diff_estimates(&before, &after);
            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&diff)?),
                _ => print!("{}", report::render_diff(&diff)),
            }
        }

        Commands::CatalogVersion {
            service,
            region,
            catalog,
        } => {
            let warehouse = open_warehouse(&catalog).await?;
            match warehouse.latest_version(&service, &region).await? {
                Some(version) => println!("{}", serde_json::to_string_pretty(&version)?),
                None => bail!("no COMPLETED catalog version for {service} in {region}"),
            }
        }
    }

    Ok(())
}

fn parse_mode(mode: Option<String>) -> anyhow::Result<EvaluationMode> {
    Ok(match mode {
        Some(value) => value.parse::<EvaluationMode>()?,
        None => EvaluationMode::default(),
    })
}

/// Region fallback for resources whose configuration does not resolve one.
fn env_region() -> Option<String> {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .ok()
}

fn classify_input(path: &Path) -> anyhow::Result<EstimateInput> {
    if path.is_dir() {
        Ok(EstimateInput::Directory(path.to_path_buf()))
    } else if loader::is_plan_json(path) {
        Ok(EstimateInput::PlanFile(path.to_path_buf()))
    } else {
        Err(EstimateError::input_invalid(format!(
            "{} is neither a Terraform source directory nor a plan JSON file",
            path.display()
        ))
        .into())
    }
}

async fn open_warehouse(catalog: &CatalogArgs) -> anyhow::Result<Arc<dyn PricingWarehouse>> {
    if let Some(file) = &catalog.catalog_file {
        let loaded = JsonCatalog::from_file(file)
            .with_context(|| format!("loading catalog snapshot {}", file.display()))?;
        return Ok(Arc::new(loaded));
    }
    let warehouse = SqliteWarehouse::connect(&catalog.catalog_db)
        .await
        .with_context(|| format!("opening catalog database {}", catalog.catalog_db))?;
    Ok(Arc::new(warehouse))
}
