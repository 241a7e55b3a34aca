use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct AccessControl {
    #[serde(default)]
    pub insecure_default_account: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    pub port: u16,
    pub site_base_url_path: String,
    pub auth_base_url: String,
    pub kratos_api_url: String,

    #[serde(default)]
    pub access_control: AccessControl,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LeagueConfig {
    // Accepted members plus pending invites.
    #[serde(default = "default_max_roster_size")]
    pub max_roster_size: u64,
    #[serde(default = "default_leaderboard_limit")]
    pub leaderboard_limit: usize,
    #[serde(default = "default_upcoming_game_days_limit")]
    pub upcoming_game_days_limit: u64,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            max_roster_size: default_max_roster_size(),
            leaderboard_limit: default_leaderboard_limit(),
            upcoming_game_days_limit: default_upcoming_game_days_limit(),
        }
    }
}

fn default_max_roster_size() -> u64 {
    10
}

fn default_leaderboard_limit() -> usize {
    20
}

fn default_upcoming_game_days_limit() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server_config: ServerConfig,
    #[serde(default)]
    pub league_config: LeagueConfig,
    pub db_path: String,
}

pub enum Insecure {
    Deny,
    Allow,
}

pub fn validate(cfg: &Config, insecure: Insecure) -> Result<(), String> {
    match insecure {
        Insecure::Allow => {}
        Insecure::Deny => {
            if cfg
                .server_config
                .access_control
                .insecure_default_account
                .is_some()
            {
                return Err("insecure_default_account is not allowed in secure mode".to_owned());
            }
        }
    }
    if cfg.league_config.max_roster_size == 0 {
        return Err("league_config.max_roster_size must be positive".to_owned());
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    const CONFIG: &str = r#"
        db_path = "sqlite://league.sqlite?mode=rwc"

        [server_config]
        port = 8080
        site_base_url_path = ""
        auth_base_url = "http://localhost:4433"
        kratos_api_url = "http://localhost:4433"
    "#;

    #[test]
    fn league_config_defaults() {
        let cfg: Config = toml::from_str(CONFIG).expect("Failed to parse config");
        assert_eq!(cfg.league_config.max_roster_size, 10);
        assert_eq!(cfg.league_config.leaderboard_limit, 20);
        assert_eq!(cfg.league_config.upcoming_game_days_limit, 5);
        assert!(validate(&cfg, Insecure::Deny).is_ok());
    }

    #[test]
    fn insecure_account_requires_flag() {
        let mut cfg: Config = toml::from_str(CONFIG).expect("Failed to parse config");
        cfg.server_config.access_control.insecure_default_account = Some("admin".to_owned());
        assert!(validate(&cfg, Insecure::Deny).is_err());
        assert!(validate(&cfg, Insecure::Allow).is_ok());
    }

    #[test]
    fn empty_roster_rejected() {
        let mut cfg: Config = toml::from_str(CONFIG).expect("Failed to parse config");
        cfg.league_config.max_roster_size = 0;
        assert!(validate(&cfg, Insecure::Allow).is_err());
    }
}
