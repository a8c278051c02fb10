use std::path::Path;
use serde::Deserialize;

/// Variable d'environnement utilisée si le token est absent du fichier.
const TOKEN_ENV: &str = "DISCORD_TOKEN";

fn default_database() -> String {
    "sqlite://data/tickets.sqlite?mode=rwc".to_string()
}

fn default_wizard_timeout() -> u64 {
    15 * 60
}

/// Configuration de l'application
///
/// Le fichier de configuration est au format JSON.
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// Token du bot. Peut être laissé vide au profit de `DISCORD_TOKEN`.
    #[serde(default)]
    pub token: String,
    /// URL de connexion sea-orm
    #[serde(default = "default_database")]
    pub database: String,
    /// Serveur où enregistrer la commande `/setup` immédiatement.
    /// Sans valeur, la commande est globale.
    #[serde(default)]
    pub command_guild: Option<u64>,
    /// Durée de vie (en secondes) d'un assistant de configuration abandonné
    #[serde(default = "default_wizard_timeout")]
    pub wizard_timeout: u64,
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Config {
    pub fn read_file<P: AsRef<Path>>(filepath: P) -> Result<Self, String> {
        let filepath = filepath.as_ref();
        let str_config = match std::fs::read_to_string(filepath) {
            Ok(v) => v,
            Err(e) => return Err(format!("Unable to read file {}: {}", filepath.to_string_lossy(), e)),
        };
        let config = Self::from_str(&str_config)
            .map_err(|e| format!("Unable to parse {}: {}", filepath.to_string_lossy(), e))?;
        Ok(config)
    }
    fn from_str(content: &str) -> Result<Self, String> {
        let mut config: Config = serde_json::from_str(content).map_err(|e| e.to_string())?;
        if config.token.is_empty() {
            config.token = std::env::var(TOKEN_ENV).unwrap_or_default();
        }
        if config.token.is_empty() {
            return Err(format!("no token in the configuration file nor in {}", TOKEN_ENV));
        }
        Ok(config)
    }
    pub fn wizard_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.wizard_timeout)
    }
}
