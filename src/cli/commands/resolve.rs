//! CLI commands for `depot resolve`

use anyhow::{bail, Result};

use crate::cli::commands::{ResolveCommands, ResolveOptions};
use crate::cli::output::{create_spinner, status};
use crate::config::urls;
use crate::core::artifact::ArtifactDescriptor;
use crate::core::inspect::format_size;
use crate::core::resolver::Resolver;
use crate::core::session::{Credential, SessionCache};
use crate::core::store::CacheStore;
use crate::error::DepotError;
use crate::infra::catalog::{HttpCatalog, HttpIdentity};
use crate::infra::dirs;
use crate::infra::download::HttpDownloader;

/// Execute a resolve subcommand
pub async fn execute(command: ResolveCommands, quiet: bool) -> Result<()> {
    let (descriptor, options) = match command {
        ResolveCommands::Installer { category, options } => (
            ArtifactDescriptor::installer(category, options.version.clone()),
            options,
        ),
        ResolveCommands::Patch {
            category,
            patch_id,
            options,
        } => {
            let descriptor = match patch_id {
                Some(id) => ArtifactDescriptor::patch(category, id, options.version.clone()),
                None => ArtifactDescriptor::latest_patch(category, options.version.clone()),
            };
            (descriptor, options)
        }
    };

    let credential = credential_from(&options)?;

    let store = CacheStore::open(&dirs::cache_root()).map_err(DepotError::from)?;
    let sessions = SessionCache::new();
    let identity = HttpIdentity::new();

    let spinner = if quiet {
        None
    } else {
        Some(create_spinner(&format!(
            "Resolving {} {}",
            descriptor.display_name(),
            options.version
        )))
    };

    // Report download progress through the spinner message.
    let mut downloader = HttpDownloader::new();
    if let Some(spinner) = &spinner {
        let spinner = spinner.clone();
        downloader = downloader.with_progress(Box::new(move |done, total| {
            if total > 0 {
                spinner.set_message(format!(
                    "Downloading {} / {}",
                    format_size(done),
                    format_size(total)
                ));
            } else {
                spinner.set_message(format!("Downloading {}", format_size(done)));
            }
        }));
    }
    let catalog = HttpCatalog::with_base_url(urls::CATALOG_BASE, Box::new(downloader));
    let resolver = Resolver::new(&store, &sessions, &catalog, &identity);

    let result = resolver
        .resolve(&descriptor, options.policy, credential.as_ref())
        .await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let path = result.map_err(DepotError::from)?;
    if quiet {
        println!("{}", path.display());
    } else {
        println!("{} {}", status::SUCCESS, path.display());
    }
    Ok(())
}

/// Build a credential from the resolve options
///
/// Identity and secret must be supplied together; the secret usually
/// arrives through `DEPOT_PASSWORD`.
fn credential_from(options: &ResolveOptions) -> Result<Option<Credential>> {
    match (&options.user, &options.password) {
        (Some(user), Some(password)) => Ok(Some(Credential::new(user, password))),
        (Some(_), None) => bail!("--user given but no secret; set DEPOT_PASSWORD"),
        (None, Some(_)) => bail!("A secret was supplied without --user"),
        (None, None) => Ok(None),
    }
}
