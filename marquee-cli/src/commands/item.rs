use clap::{Args, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use uuid::Uuid;

use marquee_core::{BlobError, CatalogClient, CatalogKind, ContentItem, ContentKind};

use super::{confirm, OutputFormat};
use crate::authoring::Workspace;
use crate::config::Config;

#[derive(Args)]
pub struct ItemCommand {
    #[command(subcommand)]
    pub command: ItemSubcommand,
}

#[derive(Subcommand)]
pub enum ItemSubcommand {
    /// Add a direct URL item
    Add {
        /// Display title
        title: String,

        /// Media file or page URL
        url: String,

        /// Tag (can be repeated)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },

    /// Add a movie from the catalog
    AddMovie {
        /// Display title
        title: String,

        /// Catalog ID (from `marquee search`)
        #[arg(long)]
        tmdb_id: i64,

        /// IMDB ID; fetched from the catalog when omitted
        #[arg(long)]
        imdb_id: Option<String>,
    },

    /// Add a show from the catalog
    AddShow {
        /// Display title
        title: String,

        /// Catalog ID (from `marquee search --kind show`)
        #[arg(long)]
        tmdb_id: i64,

        /// IMDB ID; fetched from the catalog when omitted
        #[arg(long)]
        imdb_id: Option<String>,
    },

    /// Add a single episode of a show
    AddEpisode {
        /// Display title
        title: String,

        /// Catalog ID of the show
        #[arg(long)]
        tmdb_id: i64,

        /// IMDB ID of the show; fetched from the catalog when omitted
        #[arg(long)]
        imdb_id: Option<String>,

        /// Season number
        #[arg(long, short)]
        season: u32,

        /// Episode number
        #[arg(long, short)]
        episode: u32,
    },

    /// Upload a local media file into this device's blob store
    Upload {
        /// Display title
        title: String,

        /// Path to the media file
        file: PathBuf,
    },

    /// List playlist items
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove an item from the playlist
    Remove {
        /// Item ID (UUID)
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl ItemCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.execute(config))
    }

    async fn execute(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let workspace = Workspace::from_config(config);

        match &self.command {
            ItemSubcommand::Add { title, url, tags } => {
                let item = ContentItem::new(title, ContentKind::Direct { url: url.clone() })
                    .with_tags(tags.clone());
                append(&workspace, item).await
            }

            ItemSubcommand::AddMovie {
                title,
                tmdb_id,
                imdb_id,
            } => {
                let imdb_id =
                    resolve_imdb(config, *tmdb_id, CatalogKind::Movie, imdb_id.clone()).await;
                let item = ContentItem::new(
                    title,
                    ContentKind::CatalogMovie {
                        tmdb_id: Some(*tmdb_id),
                        imdb_id,
                    },
                );
                append(&workspace, item).await
            }

            ItemSubcommand::AddShow {
                title,
                tmdb_id,
                imdb_id,
            } => {
                let imdb_id =
                    resolve_imdb(config, *tmdb_id, CatalogKind::Show, imdb_id.clone()).await;
                let item = ContentItem::new(
                    title,
                    ContentKind::CatalogShow {
                        tmdb_id: Some(*tmdb_id),
                        imdb_id,
                    },
                );
                append(&workspace, item).await
            }

            ItemSubcommand::AddEpisode {
                title,
                tmdb_id,
                imdb_id,
                season,
                episode,
            } => {
                // External IDs live on the show, not the episode
                let imdb_id =
                    resolve_imdb(config, *tmdb_id, CatalogKind::Show, imdb_id.clone()).await;
                let item = ContentItem::new(
                    title,
                    ContentKind::CatalogEpisode {
                        tmdb_id: Some(*tmdb_id),
                        imdb_id,
                        season: *season,
                        episode: *episode,
                    },
                );
                append(&workspace, item).await
            }

            ItemSubcommand::Upload { title, file } => {
                let metadata = std::fs::metadata(file)
                    .map_err(|e| format!("Cannot read '{}': {}", file.display(), e))?;
                let source = File::open(file)
                    .map_err(|e| format!("Cannot open '{}': {}", file.display(), e))?;

                let blob_key = Uuid::new_v4().to_string();
                workspace.cache().blobs().put_blob(
                    &blob_key,
                    source,
                    metadata.len(),
                    |written, total| {
                        if total > 0 {
                            print!("\rUploading... {}%", written * 100 / total);
                            let _ = io::stdout().flush();
                        }
                    },
                )?;
                println!();

                let item = ContentItem::new(title, ContentKind::LocalUpload { blob_key });
                append(&workspace, item).await
            }

            ItemSubcommand::List { format } => {
                let bundle = workspace.load_newest().await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&bundle.playlist)?)
                    }
                    OutputFormat::Text => {
                        if bundle.playlist.is_empty() {
                            println!("No items. Add one with `marquee item add`.");
                        }
                        for item in &bundle.playlist {
                            let marker = if bundle.config.current_item_id == Some(item.id) {
                                "*"
                            } else {
                                " "
                            };
                            println!("{} {}  {}", marker, item.id, item);
                        }
                    }
                }
                Ok(())
            }

            ItemSubcommand::Remove { id, force } => {
                let id = Uuid::parse_str(id).map_err(|_| format!("Invalid item ID '{}'", id))?;
                let mut bundle = workspace.load_newest().await?;

                let item = bundle
                    .find_item(&id)
                    .cloned()
                    .ok_or_else(|| format!("No item with ID {}", id))?;

                if !force && !confirm(&format!("Remove '{}'?", item.title))? {
                    println!("Cancelled.");
                    return Ok(());
                }

                bundle.playlist.retain(|i| i.id != id);
                let dangling = bundle
                    .schedules
                    .iter()
                    .filter(|rule| rule.target_item_id == id)
                    .count();
                workspace.commit(&mut bundle).await?;

                if let ContentKind::LocalUpload { blob_key } = &item.kind {
                    // The upload may live on another device; absence is fine
                    match workspace.cache().blobs().delete_blob(blob_key) {
                        Ok(()) | Err(BlobError::NotFound(_)) => {}
                        Err(e) => eprintln!("Warning: could not delete upload: {}", e),
                    }
                }

                println!("Removed: {}", item.title);
                if dangling > 0 {
                    println!(
                        "Note: {} schedule rule(s) still target this item and will no longer match.",
                        dangling
                    );
                }
                Ok(())
            }
        }
    }
}

async fn append(
    workspace: &Workspace,
    item: ContentItem,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut bundle = workspace.load_newest().await?;
    let title = item.title.clone();
    let id = item.id;
    bundle.playlist.push(item);
    workspace.commit(&mut bundle).await?;
    println!("Added: {} ({})", title, id);
    Ok(())
}

/// Fills in the cross-catalog IMDB ID when the catalog is configured and
/// the user did not pass one explicitly. Lookup failure is not fatal; the
/// embed URL falls back to the catalog-specific ID.
async fn resolve_imdb(
    config: &Config,
    tmdb_id: i64,
    kind: CatalogKind,
    explicit: Option<String>,
) -> Option<String> {
    if explicit.is_some() {
        return explicit;
    }
    if !config.catalog.is_configured() {
        return None;
    }

    let client = CatalogClient::new(
        config.catalog.base_url_or_default(),
        config.catalog.api_key.clone().unwrap_or_default(),
    );
    match client.external_ids(tmdb_id, kind).await {
        Ok(ids) => ids.imdb_id,
        Err(e) => {
            eprintln!("Catalog: {} (continuing without IMDB ID)", e);
            None
        }
    }
}
