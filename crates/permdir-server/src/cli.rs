use clap::Parser;
use permdir_core::entity::EntityKind;
use permdir_core::{DEFAULT_LOCALE, LocaleConfig};
use permdir_db::DbConfig;

pub const ENV_DB_URL: &str = "PERMDIR_DB_URL";
pub const ENV_DB_NAMESPACE: &str = "PERMDIR_DB_NAMESPACE";
pub const ENV_DB_NAME: &str = "PERMDIR_DB_NAME";
pub const ENV_DB_USER: &str = "PERMDIR_DB_USER";
pub const ENV_DB_PASSWORD: &str = "PERMDIR_DB_PASSWORD";
pub const ENV_LOCALE: &str = "PERMDIR_LOCALE";
pub const ENV_DEFAULT_LOCALE: &str = "PERMDIR_DEFAULT_LOCALE";

#[derive(Debug, Parser)]
#[command(name = "permdir")]
#[command(version, about = "Filter, search and sort the permission directory", long_about = None)]
pub struct Cli {
    /// SurrealDB endpoint (ws://host:port, mem://)
    #[arg(long, env = ENV_DB_URL, default_value = "ws://127.0.0.1:8000")]
    pub db_url: String,

    /// SurrealDB namespace
    #[arg(long, env = ENV_DB_NAMESPACE, default_value = "permdir")]
    pub db_namespace: String,

    /// SurrealDB database
    #[arg(long, env = ENV_DB_NAME, default_value = "main")]
    pub db_name: String,

    /// Root user; sign-in is skipped without one
    #[arg(long, env = ENV_DB_USER)]
    pub db_user: Option<String>,

    #[arg(long, env = ENV_DB_PASSWORD, hide_env_values = true)]
    pub db_password: Option<String>,

    /// Apply pending schema migrations before querying
    #[arg(long)]
    pub migrate: bool,

    /// Active locale of the request
    #[arg(long, env = ENV_LOCALE)]
    pub locale: Option<String>,

    /// Locale used when no active locale is given
    #[arg(long, env = ENV_DEFAULT_LOCALE, default_value = DEFAULT_LOCALE)]
    pub default_locale: String,

    /// Compare an entity type's multilingual fields in one locale only
    #[arg(
        long = "force-locale",
        value_name = "ENTITY=LOCALE",
        value_parser = LocaleConfig::parse_forced_locale
    )]
    pub forced_locales: Vec<(EntityKind, String)>,

    /// Entity type to query (user, role, scope, acl)
    pub entity: EntityKind,

    /// Query parameters such as `filter[hasRole]=admin` or `sort=-email`
    #[arg(value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

impl Cli {
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.db_url.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_name.clone(),
            username: self.db_user.clone(),
            password: self.db_password.clone(),
        }
    }

    pub fn locale_config(&self) -> LocaleConfig {
        self.forced_locales
            .iter()
            .fold(LocaleConfig::new(&self.default_locale), |config, (kind, locale)| {
                config.with_forced_locale(*kind, locale)
            })
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))
}
