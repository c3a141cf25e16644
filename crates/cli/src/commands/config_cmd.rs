//! `simplo config` — Configuration management commands.

use simplo_config::AppConfig;

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", render_redacted(&config)?);
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();
            if !config.has_api_key() {
                warnings.push("No API key set (set SIMPLO_API_KEY or OPENROUTER_API_KEY)");
            }
            if config.models.text == config.models.vision {
                warnings.push("Text and vision models are the same; every turn uses one model");
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Upstream:  {}", config.api_url);
            println!("   Text:      {}", config.models.text);
            println!("   Vision:    {}", config.models.vision);
            println!("   Gateway:   {}:{}", config.gateway.host, config.gateway.port);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn default() -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", AppConfig::default_toml());
    Ok(())
}

/// Serialize the config as TOML with the credential masked.
fn render_redacted(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some("[REDACTED]".into());
    }
    toml::to_string_pretty(&shown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacted_output_hides_key() {
        let config = AppConfig {
            api_key: Some("sk-or-v1-secret".into()),
            ..AppConfig::default()
        };
        let out = render_redacted(&config).unwrap();
        assert!(!out.contains("sk-or-v1-secret"));
        assert!(out.contains("[REDACTED]"));
        assert!(out.contains("openai/gpt-4o-mini"));
    }

    #[test]
    fn redacted_output_without_key() {
        let out = render_redacted(&AppConfig::default()).unwrap();
        assert!(!out.contains("api_key"));
    }
}
