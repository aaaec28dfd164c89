//! Classify command - Print the detected API type of description files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use apirev_doc::DocumentReader;
use apirev_policy::{ApiClassifier, ApiType};
use clap::Args;
use serde::Serialize;
use tracing::{info, warn};

use super::OutputFormat;

#[derive(Args)]
pub struct ClassifyArgs {
    /// Description files to classify
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct Classification {
    file: String,
    api_type: Option<ApiType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn execute(args: ClassifyArgs) -> Result<()> {
    info!("Classifying {} file(s)", args.files.len());

    let results: Vec<Classification> = args.files.iter().map(|p| classify(p)).collect();

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&results).context("Failed to serialize classification")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for result in &results {
                match (&result.api_type, &result.error) {
                    (Some(api_type), _) => println!("📄 {}: {}", result.file, api_type),
                    (None, Some(error)) => println!("❌ {}: {}", result.file, error),
                    (None, None) => println!("❌ {}", result.file),
                }
            }
        }
    }

    Ok(())
}

fn classify(path: &Path) -> Classification {
    let file = path.display().to_string();
    match DocumentReader::read_file(path) {
        Ok(document) => Classification {
            file,
            api_type: Some(ApiClassifier::classify(document.root())),
            error: None,
        },
        Err(e) => {
            warn!("Failed to load {:?}: {}", path, e);
            Classification {
                file,
                api_type: None,
                error: Some(e.to_string()),
            }
        }
    }
}
