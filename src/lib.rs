pub mod config;
pub mod error;
pub mod identity;
pub mod model;
pub mod pipeline;
pub mod providers;
pub mod slug;
pub mod sources;
pub mod writer;

use std::path::Path;

pub use config::HarvestConfig;
pub use error::HarvestError;
pub use identity::IdentityTracker;
pub use model::{Classification, RawMessage, RecipeCandidate, RecipeIdentity};
pub use pipeline::RunSummary;
pub use providers::{CompletionService, OpenAIProvider, ServiceError};
pub use writer::RecipeWriter;

/// Run the full pipeline over the given input with configuration loaded
/// from `config.toml` / `HARVEST__` environment variables.
///
/// `input` is either a directory of per-thread JSON documents or a single
/// conversations-export file.
pub async fn harvest(input: &Path) -> Result<RunSummary, HarvestError> {
    let config = HarvestConfig::load()?;
    harvest_with_config(input, &config).await
}

/// Same as [`harvest`] but with explicit configuration.
pub async fn harvest_with_config(
    input: &Path,
    config: &HarvestConfig,
) -> Result<RunSummary, HarvestError> {
    // Credential check happens before any input or corpus work.
    let provider = OpenAIProvider::new(&config.provider)?;

    let messages = sources::load_messages(input)?;
    let writer = RecipeWriter::new(&config.output_dir);
    writer.ensure_out_dir()?;
    let mut tracker = IdentityTracker::load(writer.out_dir());

    Ok(pipeline::run(&provider, &mut tracker, &writer, &messages).await)
}
