use anyhow::{Context, Result, anyhow};

use crate::domain::group::NewGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) storage_backend: StorageBackend,
    pub(crate) database_url: Option<String>,
    pub(crate) database_max_connections: u32,
    pub(crate) jwt_secret: String,
    pub(crate) jwt_ttl_seconds: i64,
    pub(crate) http_addr: String,
    pub(crate) cors_origins: Vec<String>,
    pub(crate) log_level: String,
    pub(crate) http_request_body_limit_bytes: usize,
    pub(crate) http_concurrency_limit: usize,
    pub(crate) http_request_timeout_secs: u64,
    pub(crate) seed_groups: Vec<NewGroup>,
}

impl Settings {
    pub(crate) fn from_env() -> Result<Self> {
        let storage_backend = parse_storage_backend(
            &std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "postgres".to_string()),
        )?;
        let database_url = match storage_backend {
            StorageBackend::Postgres => {
                Some(get_required("DATABASE_URL").context("DATABASE_URL is required")?)
            }
            StorageBackend::Memory => None,
        };
        let database_max_connections = parse_u32_env("DATABASE_MAX_CONNECTIONS", 10)?;

        let jwt_secret = get_required("JWT_SECRET").context("JWT_SECRET is required")?;
        let jwt_ttl_seconds: i64 = std::env::var("JWT_TTL_SECONDS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .context("Failed to parse JWT_TTL_SECONDS, expecting integer")?;

        if jwt_secret.chars().count() < 32 {
            return Err(anyhow!("JWT_SECRET must be at least 32 characters"));
        }

        let http_addr = std::env::var("HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let cors_origins = parse_list(
            &std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:8000,http://127.0.0.1:8000".to_string()),
        );
        let log_level = std::env::var("LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string());
        let http_request_body_limit_bytes =
            parse_usize_env("HTTP_REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;
        let http_concurrency_limit = parse_usize_env("HTTP_CONCURRENCY_LIMIT", 256)?;
        let http_request_timeout_secs = parse_u64_env("HTTP_REQUEST_TIMEOUT_SECS", 10)?;
        let seed_groups = parse_seed_groups(&std::env::var("SEED_GROUPS").unwrap_or_default())?;

        Ok(Self {
            storage_backend,
            database_url,
            database_max_connections,
            jwt_secret,
            jwt_ttl_seconds,
            http_addr,
            cors_origins,
            log_level,
            http_request_body_limit_bytes,
            http_concurrency_limit,
            http_request_timeout_secs,
            seed_groups,
        })
    }
}

fn get_required(key: &str) -> Result<String> {
    let value = std::env::var(key)?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(anyhow!("{key} must not be empty"));
    }
    Ok(value)
}

fn parse_storage_backend(raw: &str) -> Result<StorageBackend> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
        "memory" => Ok(StorageBackend::Memory),
        other => Err(anyhow!(
            "unknown STORAGE_BACKEND '{other}', expecting 'postgres' or 'memory'"
        )),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_seed_groups(raw: &str) -> Result<Vec<NewGroup>> {
    parse_list(raw)
        .iter()
        .map(|entry| {
            NewGroup::parse(entry).map_err(|err| anyhow!("invalid SEED_GROUPS entry '{entry}': {err}"))
        })
        .collect()
}

fn parse_u32_env(key: &str, default: u32) -> Result<u32> {
    let value = std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u32>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

fn parse_usize_env(key: &str, default: usize) -> Result<usize> {
    let value = std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<usize>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

fn parse_u64_env(key: &str, default: u64) -> Result<u64> {
    let value = std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u64>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{StorageBackend, parse_list, parse_seed_groups, parse_storage_backend};

    #[test]
    fn storage_backend_is_case_insensitive() {
        assert_eq!(
            parse_storage_backend(" Memory ").expect("must parse"),
            StorageBackend::Memory
        );
        assert_eq!(
            parse_storage_backend("postgresql").expect("must parse"),
            StorageBackend::Postgres
        );
        assert!(parse_storage_backend("sqlite").is_err());
    }

    #[test]
    fn parse_list_skips_blank_entries() {
        let list = parse_list(" a , ,b,");
        assert_eq!(list, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn seed_groups_are_parsed() {
        let groups = parse_seed_groups("Cats:cats, Dogs:dogs").expect("must parse");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].title, "Dogs");
        assert_eq!(groups[1].slug, "dogs");
    }

    #[test]
    fn seed_groups_report_bad_entry() {
        assert!(parse_seed_groups("Cats:Not A Slug").is_err());
        assert!(parse_seed_groups("").expect("empty is fine").is_empty());
    }
}
