//! `thermtrk` - CLI for thermaltrack
//!
//! This binary provides the command-line interface for registering
//! transformers, uploading thermal images, recording inspections and
//! printing maintenance records.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;

use thermaltrack::cli::{
    AnnotateCommand, Cli, Command, ConfigCommand, CreateInspectionCommand, ImageCommand,
    InspectionCommand, TransformerCommand, UploadCommand,
};
use thermaltrack::decode::expand_path;
use thermaltrack::matching::baselines_for;
use thermaltrack::model::{INSPECTIONS_KEY, TRANSFORMERS_KEY};
use thermaltrack::storage::collection_stats;
use thermaltrack::{
    init_logging, CollectionStore, Config, Dashboard, Error, FileDecoder, Hotspot, Image,
    ImageDecoder, ImageSource, ImageUpload, MaintenanceImage, MaintenanceRecord, NewInspection,
    Storage,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    let command = match cli.command {
        Command::Config(config_cmd) => return handle_config(&config, config_cmd),
        other => other,
    };

    let storage = Rc::new(
        Storage::open(config.database_path())
            .with_context(|| format!("opening {}", config.database_path().display()))?,
    );
    let store: Rc<dyn CollectionStore> = storage.clone();
    let mut dashboard = Dashboard::open(store)?;

    match command {
        Command::Transformer(cmd) => handle_transformer(&mut dashboard, cmd),
        Command::Image(cmd) => handle_image(&mut dashboard, &config, cmd).await,
        Command::Inspection(cmd) => handle_inspection(&mut dashboard, &config, cmd).await,
        Command::Record(cmd) => handle_record(&dashboard, &cmd.id, cmd.json),
        Command::Status(cmd) => handle_status(&dashboard, &storage, cmd.json),
        Command::Config(_) => Ok(()),
    }
}

fn handle_transformer(dashboard: &mut Dashboard, cmd: TransformerCommand) -> anyhow::Result<()> {
    match cmd {
        TransformerCommand::Add(fields) => {
            let transformer = dashboard.add_transformer(fields.into_form())?;
            println!("Added transformer {}", transformer.id);
        }
        TransformerCommand::Update { id, fields } => {
            let Some(current) = dashboard.begin_edit(&id) else {
                return Err(Error::not_found(TRANSFORMERS_KEY, id).into());
            };
            let form = fields.merge_into(current.into());
            dashboard.update_transformer(&id, form)?;
            println!("Updated transformer {id}");
        }
        TransformerCommand::Delete { id } => {
            if !dashboard.delete_transformer(&id)? {
                return Err(Error::not_found(TRANSFORMERS_KEY, id).into());
            }
            println!("Deleted transformer {id}");
        }
        TransformerCommand::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(dashboard.transformers())?);
            } else if dashboard.transformers().is_empty() {
                println!("No transformers.");
            } else {
                println!(
                    "{:<15} {:<12} {:<10} {:<8} {:<13} Location",
                    "ID", "Region", "Number", "Pole", "Type"
                );
                for t in dashboard.transformers() {
                    println!(
                        "{:<15} {:<12} {:<10} {:<8} {:<13} {}",
                        t.id,
                        t.region,
                        t.number,
                        t.pole.as_deref().unwrap_or("-"),
                        t.kind.to_string(),
                        t.location
                    );
                }
            }
        }
    }
    Ok(())
}

async fn handle_image(
    dashboard: &mut Dashboard,
    config: &Config,
    cmd: ImageCommand,
) -> anyhow::Result<()> {
    match cmd {
        ImageCommand::Upload(upload) => {
            let decoder = FileDecoder::new(&config.images);
            let image = dashboard
                .upload_image(&decoder, upload_request(upload))
                .await?;
            println!("Uploaded {} image {} ({})", image.kind, image.id, image.name);
        }
        ImageCommand::List {
            transformer,
            baselines,
            json,
        } => {
            let images: Vec<&Image> = match (transformer.as_deref(), baselines) {
                (Some(t), true) => baselines_for(dashboard.images(), t).collect(),
                (Some(t), false) => dashboard
                    .images()
                    .iter()
                    .filter(|i| i.transformer_id == t)
                    .collect(),
                (None, true) => dashboard.images().iter().filter(|i| i.is_baseline()).collect(),
                (None, false) => dashboard.images().iter().collect(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&images)?);
            } else if images.is_empty() {
                println!("No images.");
            } else {
                println!(
                    "{:<15} {:<15} {:<12} {:<12} {:<20} Name",
                    "ID", "Transformer", "Type", "Condition", "Uploaded"
                );
                for i in images {
                    println!(
                        "{:<15} {:<15} {:<12} {:<12} {:<20} {}",
                        i.id,
                        i.transformer_id,
                        i.kind.to_string(),
                        i.condition.as_deref().unwrap_or("-"),
                        i.upload_date,
                        i.name
                    );
                }
            }
        }
    }
    Ok(())
}

fn upload_request(upload: UploadCommand) -> ImageUpload {
    let source = match (upload.file, upload.data_url) {
        (Some(file), _) => ImageSource::File(expand_path(&file)),
        (None, data_url) => ImageSource::Encoded {
            name: upload.name.unwrap_or_default(),
            data_url: data_url.unwrap_or_default(),
        },
    };
    ImageUpload {
        transformer_id: upload.transformer,
        kind: upload.kind.into(),
        uploader: upload.uploader,
        condition: upload.condition,
        source,
    }
}

async fn handle_inspection(
    dashboard: &mut Dashboard,
    config: &Config,
    cmd: InspectionCommand,
) -> anyhow::Result<()> {
    match cmd {
        InspectionCommand::Create(create) => {
            let decoder = FileDecoder::new(&config.images);
            create_inspection(dashboard, &decoder, create).await?;
        }
        InspectionCommand::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(dashboard.inspections())?);
            } else if dashboard.inspections().is_empty() {
                println!("No inspections.");
            } else {
                println!(
                    "{:<15} {:<15} {:<12} {:<15} {:<12} {:<15} Hotspots",
                    "ID", "Transformer", "Date", "Inspector", "Status", "Baseline"
                );
                for i in dashboard.inspections() {
                    println!(
                        "{:<15} {:<15} {:<12} {:<15} {:<12} {:<15} {}",
                        i.id,
                        i.transformer_id,
                        i.date,
                        i.inspector,
                        i.status.to_string(),
                        i.baseline_image_id.as_deref().unwrap_or("-"),
                        i.annotations.len()
                    );
                }
            }
        }
        InspectionCommand::Show { id, json } => {
            let Some(detail) = dashboard.detail(&id) else {
                return Err(Error::not_found(INSPECTIONS_KEY, id).into());
            };
            if json {
                let value = serde_json::json!({
                    "inspection": detail.inspection,
                    "transformer": detail.transformer,
                    "baseline": detail.baseline,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                let inspection = detail.inspection;
                println!("Inspection {}", inspection.id);
                println!("  Transformer:  {}", inspection.transformer_id);
                println!("  Condition:    {}", inspection.condition);
                println!("  Status:       {}", inspection.status);
                println!(
                    "  Baseline:     {}",
                    detail
                        .baseline
                        .map_or_else(|| "N/A".to_string(), |b| format!("{} ({})", b.id, b.name))
                );
                println!(
                    "  Maintenance:  {} ({})",
                    inspection.maintenance_image.id, inspection.maintenance_image.name
                );
                for h in &inspection.annotations {
                    println!(
                        "  Hotspot {}: ({:.1}, {:.1}) r={} {}",
                        h.id, h.x, h.y, h.radius, h.severity
                    );
                }
            }
        }
        InspectionCommand::Status { id, status } => {
            if !dashboard.set_status(&id, status.as_str().into())? {
                return Err(Error::not_found(INSPECTIONS_KEY, id).into());
            }
            println!("Inspection {id} is now {status}");
        }
        InspectionCommand::Annotate(annotate) => annotate_inspection(dashboard, annotate)?,
        InspectionCommand::ClearAnnotations { id } => {
            if !dashboard.update_annotations(&id, Vec::new())? {
                return Err(Error::not_found(INSPECTIONS_KEY, id).into());
            }
            println!("Cleared hotspots on inspection {id}");
        }
        InspectionCommand::Delete { id } => {
            if !dashboard.delete_inspection(&id)? {
                return Err(Error::not_found(INSPECTIONS_KEY, id).into());
            }
            println!("Deleted inspection {id}");
        }
    }
    Ok(())
}

async fn create_inspection(
    dashboard: &mut Dashboard,
    decoder: &dyn ImageDecoder,
    create: CreateInspectionCommand,
) -> anyhow::Result<()> {
    let decoded = decoder.decode(&expand_path(&create.image)).await?;

    let payload = NewInspection {
        id: dashboard.next_inspection_id(),
        transformer_id: create.transformer,
        inspector: create.inspector,
        date: create
            .date
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string()),
        condition: create.condition,
        status: create.status.into(),
        notes: create.notes,
        maintenance_image: MaintenanceImage {
            id: dashboard.next_image_id(),
            name: decoded.name,
            data_url: decoded.data_url,
        },
        annotations: Vec::new(),
    };

    let inspection = dashboard.create_inspection(payload)?;
    println!("Created inspection {}", inspection.id);
    match dashboard.selected().and_then(|d| d.baseline) {
        Some(baseline) => println!(
            "Baseline: {} ({}, condition {})",
            baseline.id,
            baseline.name,
            baseline.condition.as_deref().unwrap_or("-")
        ),
        None => println!("Baseline: none available for this transformer"),
    }
    Ok(())
}

fn annotate_inspection(dashboard: &mut Dashboard, annotate: AnnotateCommand) -> anyhow::Result<()> {
    let hotspot = Hotspot {
        id: chrono::Utc::now().timestamp_millis().to_string(),
        x: annotate.x,
        y: annotate.y,
        radius: annotate.radius,
        severity: annotate.severity.into(),
        note: annotate.note,
    };
    let hotspot_id = hotspot.id.clone();

    if !dashboard.add_hotspot(&annotate.id, hotspot)? {
        return Err(Error::not_found(INSPECTIONS_KEY, annotate.id).into());
    }
    println!("Added hotspot {hotspot_id} to inspection {}", annotate.id);
    Ok(())
}

fn handle_record(dashboard: &Dashboard, id: &str, json: bool) -> anyhow::Result<()> {
    let record = MaintenanceRecord::for_inspection(dashboard, id)
        .ok_or_else(|| Error::not_found(INSPECTIONS_KEY, id))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{record}");
    }
    Ok(())
}

fn handle_status(dashboard: &Dashboard, storage: &Storage, json: bool) -> anyhow::Result<()> {
    let stats = Dashboard::collection_keys()
        .iter()
        .map(|key| collection_stats(dashboard.store(), key))
        .collect::<thermaltrack::Result<Vec<_>>>()?;

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "database_bytes": storage.size_bytes(),
            "collections": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("thermtrk status");
        println!("---------------");
        println!("Database:      {}", storage.path().display());
        println!("Size:          {} bytes", storage.size_bytes());
        println!();
        for s in &stats {
            println!("{:<14} {:>6} records {:>10} bytes", s.key, s.records, s.bytes);
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Images]");
                println!("  Max file bytes:     {}", config.images.max_file_bytes);
                println!(
                    "  Allowed extensions: {}",
                    config.images.allowed_extensions.join(", ")
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path: PathBuf = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            validate_config_file(path)?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}

fn validate_config_file(path: PathBuf) -> anyhow::Result<Config> {
    let display = path.display().to_string();
    Config::load_from(Some(path)).with_context(|| format!("invalid configuration file {display}"))
}
