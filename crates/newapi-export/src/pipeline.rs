//! Export pipeline orchestration.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::config::ExportOptions;
use crate::connectors::SourceRepository;
use crate::error::{Phase, Result};
use crate::schema::ExportResult;
use crate::transform;

/// Options that shape a single export pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Export users and tokens as masters and keys.
    pub include_tokens: bool,
    /// Export abilities as bindings.
    pub include_abilities: bool,
    /// Render a progress bar over the channel batch.
    pub show_progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            include_tokens: true,
            include_abilities: false,
            show_progress: false,
        }
    }
}

impl From<&ExportOptions> for PipelineOptions {
    fn from(options: &ExportOptions) -> Self {
        Self {
            include_tokens: options.include_tokens,
            include_abilities: options.include_abilities,
            show_progress: false,
        }
    }
}

/// Export pipeline over a connected repository.
///
/// Phases run in a fixed order: channels, then users and tokens, then
/// abilities. A failed primary fetch aborts the whole pass; a failed token
/// fetch for one user becomes a warning.
pub struct Pipeline<'a> {
    repository: &'a dyn SourceRepository,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline reading from `repository`.
    #[must_use]
    pub fn new(repository: &'a dyn SourceRepository, options: PipelineOptions) -> Self {
        Self {
            repository,
            options,
        }
    }

    /// Run one export pass.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Phase`] if channels, users or abilities
    /// cannot be fetched. No partial result is returned.
    pub async fn run(&self) -> Result<ExportResult> {
        let start = std::time::Instant::now();
        let mut result = ExportResult::new();

        info!("Starting export from {} source", self.repository.source_type());

        self.export_channels(&mut result)
            .await
            .map_err(|e| e.in_phase(Phase::Channels))?;

        if self.options.include_tokens {
            self.export_users_and_tokens(&mut result)
                .await
                .map_err(|e| e.in_phase(Phase::UsersAndTokens))?;
        }

        if self.options.include_abilities {
            self.export_abilities(&mut result)
                .await
                .map_err(|e| e.in_phase(Phase::Abilities))?;
        }

        let summary = result.summary();
        info!(
            "Export complete: {} providers, {} masters, {} keys, {} bindings, {} warnings in {:.2}s",
            summary.providers,
            summary.masters,
            summary.keys,
            summary.bindings,
            summary.warnings,
            start.elapsed().as_secs_f64()
        );

        Ok(result)
    }

    async fn export_channels(&self, result: &mut ExportResult) -> Result<()> {
        let channels = self.repository.fetch_channels().await?;
        info!("Exporting {} channels", channels.len());

        let progress = create_progress_bar(channels.len() as u64, self.options.show_progress);
        let mut warnings = Vec::new();

        for channel in &channels {
            for provider in transform::channel_to_providers(channel, &mut warnings) {
                result.add_provider(provider);
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        for warning in warnings {
            record_warning(result, warning);
        }
        Ok(())
    }

    async fn export_users_and_tokens(&self, result: &mut ExportResult) -> Result<()> {
        let users = self.repository.fetch_users_with_tokens().await?;
        info!("Exporting {} users with tokens", users.len());

        for user in &users {
            let master = transform::user_to_master(user);
            let master_ref = master.name.clone();
            result.add_master(master);

            let tokens = match self.repository.fetch_tokens_by_user(user.id).await {
                Ok(tokens) => tokens,
                Err(e) => {
                    record_warning(
                        result,
                        format!(
                            "Failed to get tokens for user '{}' (ID={}): {}",
                            user.username, user.id, e
                        ),
                    );
                    continue;
                }
            };

            for token in &tokens {
                result.add_key(transform::token_to_key(token, &master_ref));
            }
        }
        Ok(())
    }

    async fn export_abilities(&self, result: &mut ExportResult) -> Result<()> {
        let abilities = self.repository.fetch_abilities().await?;
        info!("Exporting {} abilities", abilities.len());

        for ability in &abilities {
            result.add_binding(transform::ability_to_binding(ability));
        }
        Ok(())
    }
}

fn record_warning(result: &mut ExportResult, warning: String) {
    debug!("warning: {}", warning);
    result.add_warning(warning);
}

fn create_progress_bar(total: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} channels",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
