use crate::ConfigAction;
use crate::commands::shared::report;
use crate::config::{Config, mask_token};

pub(crate) fn handle_config(
    action: ConfigAction,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            if let Some(path) = Config::default_config_path() {
                let state = if path.exists() { "" } else { " (not created)" };
                println!("# User config: {}{state}", path.display());
            }
            print!("{}", config.to_display_toml()?);
        }
        ConfigAction::SetToken { token } => {
            let token = token.trim();
            if token.is_empty() {
                return Err("Token must not be empty".into());
            }
            let path = Config::save_github_token(token)?;
            report(format!(
                "Saved GitHub token {} to {}",
                mask_token(token),
                path.display()
            ));
        }
    }
    Ok(())
}
