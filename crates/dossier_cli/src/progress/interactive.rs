use std::sync::Mutex;
use std::time::Duration;

use dossier::github::ClientEvent;
use dossier::ingest::IngestProgress;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Bars for the current run, under one lock.
#[derive(Default)]
struct ProgressState {
    /// One bar per batch run, sized to the filtered repository count.
    batch_bar: Option<ProgressBar>,
    /// Spinner for the repository currently being synced.
    repo_spinner: Option<ProgressBar>,
}

/// Interactive progress reporter using indicatif.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            state: Mutex::new(ProgressState::default()),
        }
    }

    /// Reporter that draws nowhere.
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden()),
            state: Mutex::new(ProgressState::default()),
        }
    }

    #[cfg(test)]
    pub fn position(&self) -> Option<u64> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.batch_bar.as_ref().map(ProgressBar::position)
    }

    fn spinner(&self, state: &mut ProgressState, prefix: &str) -> ProgressBar {
        if let Some(bar) = &state.repo_spinner {
            bar.set_prefix(prefix.to_string());
            return bar.clone();
        }
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(Self::spinner_style());
        bar.set_prefix(prefix.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        state.repo_spinner = Some(bar.clone());
        bar
    }

    fn println(&self, line: String) {
        // Printing above the bars keeps them intact.
        if self.multi.println(&line).is_err() {
            eprintln!("{line}");
        }
    }

    pub fn handle(&self, event: IngestProgress) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            IngestProgress::FetchingRepo { full_name } => {
                self.spinner(&mut state, &full_name)
                    .set_message("fetching repository");
            }
            IngestProgress::DocsCollected {
                full_name,
                sections,
                files,
            } => {
                self.spinner(&mut state, &full_name)
                    .set_message(format!("{sections} sections from README + {files} doc files"));
            }
            IngestProgress::FetchingMetadata { full_name, kind } => {
                self.spinner(&mut state, &full_name)
                    .set_message(format!("fetching {kind}"));
            }
            IngestProgress::MetadataSkipped {
                full_name,
                kind,
                error,
            } => {
                self.println(format!("  ⚠ {full_name}: skipped {kind} ({error})"));
            }
            IngestProgress::RepoSynced {
                full_name,
                project,
                sections,
            } => {
                if let Some(spinner) = state.repo_spinner.take() {
                    spinner.finish_and_clear();
                }
                match &state.batch_bar {
                    Some(bar) => {
                        bar.inc(1);
                        bar.set_message(full_name.clone());
                    }
                    None => self.println(format!("✓ {full_name} → {project} ({sections} sections)")),
                }
            }
            IngestProgress::ListingRepos { owner } => {
                self.spinner(&mut state, &owner)
                    .set_message("listing repositories");
            }
            IngestProgress::ReposListed {
                owner,
                total,
                matched,
            } => {
                if let Some(spinner) = state.repo_spinner.take() {
                    spinner.finish_and_clear();
                }
                self.println(format!("{owner}: {matched} of {total} repositories match"));
                let bar = self.multi.add(ProgressBar::new(matched as u64));
                bar.set_style(Self::bar_style());
                bar.set_prefix(owner);
                state.batch_bar = Some(bar);
            }
            IngestProgress::BatchStarted {
                batch,
                batches,
                size,
            } => {
                if let Some(bar) = &state.batch_bar {
                    bar.set_message(format!("batch {batch}/{batches} ({size} repos)"));
                }
            }
            IngestProgress::RepoSkipped { full_name, .. } => {
                if let Some(bar) = &state.batch_bar {
                    bar.inc(1);
                    bar.set_message(format!("{full_name} (recent, skipped)"));
                }
            }
            IngestProgress::RepoStarted { full_name, .. } => {
                if let Some(bar) = &state.batch_bar {
                    bar.set_message(full_name);
                }
            }
            IngestProgress::RepoFailed { full_name, error } => {
                if let Some(spinner) = state.repo_spinner.take() {
                    spinner.finish_and_clear();
                }
                if let Some(bar) = &state.batch_bar {
                    bar.inc(1);
                }
                self.println(format!("  ✗ {full_name}: {error}"));
            }
            IngestProgress::RateLimited {
                full_name,
                wait_secs,
            } => {
                self.println(format!(
                    "  ⏸ rate limit reached at {full_name}; resets in {wait_secs}s"
                ));
            }
            IngestProgress::Pausing { secs, remaining } => {
                if let Some(bar) = &state.batch_bar {
                    bar.set_message(format!("pausing {secs}s ({remaining} requests left)"));
                }
            }
            IngestProgress::Cancelled => {
                self.println("  cancelled".to_string());
            }
            IngestProgress::BatchComplete { .. } => {
                if let Some(spinner) = state.repo_spinner.take() {
                    spinner.finish_and_clear();
                }
                if let Some(bar) = state.batch_bar.take() {
                    bar.finish_with_message("done");
                }
            }
        }
    }

    pub fn handle_client(&self, event: ClientEvent) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let Some(spinner) = &state.repo_spinner else {
            return;
        };
        match event {
            ClientEvent::RetryScheduled {
                attempt, reason, ..
            } => spinner.set_message(format!("retry {attempt}: {reason}")),
            ClientEvent::RateLimitWait { wait, .. } => {
                spinner.set_message(format!("waiting {}s for rate limit reset", wait.as_secs()));
            }
        }
    }

    pub fn finish(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(spinner) = state.repo_spinner.take() {
            spinner.finish_and_clear();
        }
        if let Some(bar) = state.batch_bar.take() {
            bar.finish();
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.yellow} {msg}")
            .expect("Invalid template")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .expect("Invalid template")
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
