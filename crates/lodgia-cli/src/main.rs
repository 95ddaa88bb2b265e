//! Lodgia CLI: manage the photo gallery of a property or room from the shell.
//!
//! Configuration comes from the environment (see `GalleryConfig::from_env`);
//! storage locations not set there default to `--data-dir`.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lodgia_cli::{
    apply_data_dir, init_tracing, item_at, list_entries, open_gallery, read_media_file,
    render_table,
};
use lodgia_core::{ErrorMetadata, GalleryConfig};
use lodgia_gallery::{Gallery, GalleryEvent};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "lodgia", about = "Property photo gallery CLI")]
struct Cli {
    /// Directory for photos and image lists when not configured in the environment
    #[arg(long, global = true, default_value = "lodgia-data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload photos to the end of a gallery
    Upload {
        /// Property or room identifier
        parent: String,
        /// Image files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show the photos of a gallery in order
    List {
        /// Property or room identifier
        parent: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Move the photo at one position to another
    Reorder {
        parent: String,
        from: usize,
        to: usize,
    },
    /// Make the photo at a position the cover photo
    SetPrimary { parent: String, index: usize },
    /// Remove the photo at a position and delete its file
    Remove { parent: String, index: usize },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize listing")?;
    println!("{}", out);
    Ok(())
}

/// Report notifications gathered while the command ran.
fn report_events(events: &mut tokio::sync::broadcast::Receiver<GalleryEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            GalleryEvent::FileRejected {
                file_name, reason, ..
            } => eprintln!("rejected {}: {}", file_name, reason),
            GalleryEvent::UploadFailed { message, .. } => eprintln!("upload failed: {}", message),
            GalleryEvent::PersistenceFailed { message } => {
                eprintln!("could not save photo order: {}", message)
            }
            GalleryEvent::DeletionFailed { url, message } => {
                eprintln!("could not delete {}: {}", url, message)
            }
            GalleryEvent::BatchFinished { .. } | GalleryEvent::Persisted { .. } => {}
        }
    }
}

async fn finish(gallery: Gallery) -> anyhow::Result<()> {
    if let Err(e) = gallery.shutdown().await {
        anyhow::bail!(
            "{} ({})",
            e.client_message(),
            e.suggested_action().unwrap_or("try again")
        );
    }
    print!("{}", render_table(&gallery.snapshot()));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = GalleryConfig::from_env().context("Invalid gallery configuration")?;
    apply_data_dir(&mut config, &cli.data_dir);

    match cli.command {
        Commands::Upload { parent, files } => {
            let gallery = open_gallery(&parent, &config).await?;
            let mut events = gallery.events();

            let mut media = Vec::with_capacity(files.len());
            for path in &files {
                media.push(read_media_file(path).await?);
            }

            let selection = gallery.on_files_selected(media);
            if let Some(batch) = selection.batch {
                let summary = batch.wait().await?;
                eprintln!(
                    "uploaded {}, failed {}",
                    summary.uploaded, summary.failed
                );
            }

            let result = finish(gallery).await;
            report_events(&mut events);
            result?;
        }
        Commands::List { parent, json } => {
            let gallery = open_gallery(&parent, &config).await?;
            if json {
                print_json(&list_entries(&gallery.snapshot()))?;
                gallery.shutdown().await?;
            } else {
                finish(gallery).await?;
            }
        }
        Commands::Reorder { parent, from, to } => {
            let gallery = open_gallery(&parent, &config).await?;
            let mut events = gallery.events();
            gallery.on_drag_reorder(from, to).map_err(|e| {
                anyhow::anyhow!("{} ({})", e.client_message(), e.error_code())
            })?;
            let result = finish(gallery).await;
            report_events(&mut events);
            result?;
        }
        Commands::SetPrimary { parent, index } => {
            let gallery = open_gallery(&parent, &config).await?;
            let mut events = gallery.events();
            let id = item_at(&gallery.snapshot(), index)?;
            gallery.on_set_primary(id)?;
            let result = finish(gallery).await;
            report_events(&mut events);
            result?;
        }
        Commands::Remove { parent, index } => {
            let gallery = open_gallery(&parent, &config).await?;
            let mut events = gallery.events();
            let id = item_at(&gallery.snapshot(), index)?;
            let removed = gallery.on_remove(id).await?;
            eprintln!(
                "removed {}",
                removed.display_name().unwrap_or("photo")
            );
            let result = finish(gallery).await;
            report_events(&mut events);
            result?;
        }
    }

    Ok(())
}
