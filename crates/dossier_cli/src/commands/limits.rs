use chrono::{DateTime, Utc};
use clap::ValueEnum;
use dossier::github::{GitHubClient, RateLimitInfo};

/// Output format for rate limit display.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// Fetch and print every quota GitHub reports.
pub(crate) async fn handle_limits(
    client: &GitHubClient,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    let items = client
        .rate_limit_resources()
        .await?
        .into_iter()
        .map(|(name, info)| RateLimitDisplay::from_info(name, &info, now))
        .collect();
    RateLimitDisplay::print_many(items, output)?;
    if !client.is_authenticated() {
        println!("Unauthenticated: set DOSSIER_GITHUB_TOKEN for a higher quota.");
    }
    Ok(())
}

/// Rate limit information for display.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct RateLimitDisplay {
    #[tabled(rename = "Resource")]
    pub resource: String,
    #[tabled(rename = "Limit")]
    pub limit: u32,
    #[tabled(rename = "Used")]
    pub used: u32,
    #[tabled(rename = "Remaining")]
    pub remaining: u32,
    #[tabled(rename = "Usage %")]
    pub usage_percent: String,
    #[tabled(rename = "Resets At")]
    pub reset_at: String,
    #[tabled(rename = "Resets In")]
    pub reset_in: String,
}

impl RateLimitDisplay {
    pub(crate) fn from_info(name: &str, info: &RateLimitInfo, now: DateTime<Utc>) -> Self {
        let used = info.limit.saturating_sub(info.remaining);
        let usage_percent = if info.limit > 0 {
            f64::from(used) / f64::from(info.limit) * 100.0
        } else {
            0.0
        };
        let reset_duration = info.reset_at.signed_duration_since(now);
        let reset_in = if reset_duration.num_seconds() > 0 {
            format_duration(reset_duration)
        } else {
            "now".to_string()
        };

        Self {
            resource: name.to_string(),
            limit: info.limit,
            used,
            remaining: info.remaining,
            usage_percent: format!("{usage_percent:.1}%"),
            reset_at: info.reset_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            reset_in,
        }
    }

    pub(crate) fn print_many(
        mut items: Vec<Self>,
        format: OutputFormat,
    ) -> Result<(), serde_json::Error> {
        items.sort_by(|a, b| a.resource.cmp(&b.resource));

        match format {
            OutputFormat::Table => {
                let mut table = tabled::Table::new(items);
                table.with(tabled::settings::Style::rounded());
                println!("{table}");
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
        }
        Ok(())
    }
}

/// Format a duration in a human-readable way.
pub(crate) fn format_duration(duration: chrono::Duration) -> String {
    let total_secs = duration.num_seconds();
    if total_secs < 60 {
        format!("{total_secs}s")
    } else if total_secs < 3600 {
        let (mins, secs) = (total_secs / 60, total_secs % 60);
        if secs > 0 {
            format!("{mins}m {secs}s")
        } else {
            format!("{mins}m")
        }
    } else {
        let (hours, mins) = (total_secs / 3600, (total_secs % 3600) / 60);
        if mins > 0 {
            format!("{hours}h {mins}m")
        } else {
            format!("{hours}h")
        }
    }
}
