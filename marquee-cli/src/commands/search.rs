use clap::Args;

use marquee_core::{CatalogClient, CatalogKind};

use crate::config::Config;

/// Search the external catalog by title
#[derive(Args)]
pub struct SearchCommand {
    /// Title to search for
    query: String,

    /// What to search: movie or show
    #[arg(long, short, default_value = "movie")]
    kind: String,
}

impl SearchCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.execute(config))
    }

    async fn execute(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let kind: CatalogKind = self.kind.parse()?;

        if !config.catalog.is_configured() {
            return Err("Catalog not configured. Set MARQUEE_CATALOG_API_KEY or add \
                        catalog.api_key to the config file."
                .into());
        }

        let client = CatalogClient::new(
            config.catalog.base_url_or_default(),
            config.catalog.api_key.clone().unwrap_or_default(),
        );

        let results = client.search(&self.query, kind).await?;
        if results.is_empty() {
            println!("No {} results for '{}'.", kind, self.query);
            return Ok(());
        }

        for result in &results {
            let year = result
                .release_date
                .as_deref()
                .and_then(|date| date.split('-').next())
                .unwrap_or("????");
            println!("{:>9}  {} ({})", result.id, result.title, year);
        }
        println!();
        println!(
            "Add one with `marquee item add-{} <title> --tmdb-id <ID>`.",
            match kind {
                CatalogKind::Movie => "movie",
                CatalogKind::Show => "show",
            }
        );
        Ok(())
    }
}
