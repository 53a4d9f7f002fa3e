//! Startup configuration from CLI arguments and the conf file.
//!
//! CLI flags win over conf-file entries; inside the conf file the last
//! occurrence of a key wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use argond_consensus::Network;
use argond_log::{Format, Level};

const DEFAULT_DATA_DIR: &str = "data";
const CONF_FILE_NAME: &str = "argond.conf";

const DEFAULT_DB_CACHE_MB: u64 = 25;
const DEFAULT_CHECK_LEVEL: u32 = 1;
const DEFAULT_CHECK_BLOCKS: u32 = 500;

pub const USAGE: &str = "\
usage: argond [options]
  -datadir=<dir>      data directory (default: data)
  -conf=<file>        configuration file (default: <datadir>/argond.conf)
  -testnet            use the test network
  -regtest            use the regression-test network
  -dbcache=<mb>       database cache size in MiB (default: 25)
  -checklevel=<n>     startup self-check level, 0..=7 (default: 1)
  -checkblocks=<n>    blocks to self-check from the tip, 0 = all (default: 500)
  -sporkkey=<hex>     spork master private key (signer nodes only)
  -loglevel=<level>   error|warn|info|debug|trace (default: info)
  -logformat=<fmt>    text|json (default: text)";

#[derive(Clone, Debug)]
pub struct Config {
    pub data_dir: PathBuf,
    pub network: Network,
    pub db_cache_mb: u64,
    pub check_level: u32,
    pub check_blocks: u32,
    pub spork_key: Option<String>,
    pub log_level: Level,
    pub log_format: Format,
}

impl Config {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut data_dir: Option<PathBuf> = None;
        let mut conf_path: Option<PathBuf> = None;
        let mut network: Option<Network> = None;
        let mut db_cache_mb: Option<u64> = None;
        let mut check_level: Option<u32> = None;
        let mut check_blocks: Option<u32> = None;
        let mut spork_key: Option<String> = None;
        let mut log_level: Option<Level> = None;
        let mut log_format: Option<Format> = None;

        for arg in args {
            let (name, value) = match arg.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (arg.as_str(), None),
            };
            match name {
                "-datadir" => data_dir = Some(PathBuf::from(required(name, value)?)),
                "-conf" => conf_path = Some(PathBuf::from(required(name, value)?)),
                "-testnet" => network = Some(Network::Testnet),
                "-regtest" => network = Some(Network::Regtest),
                "-dbcache" => db_cache_mb = Some(parse_number(name, value)?),
                "-checklevel" => check_level = Some(parse_number(name, value)?),
                "-checkblocks" => check_blocks = Some(parse_number(name, value)?),
                "-sporkkey" => spork_key = Some(required(name, value)?.to_string()),
                "-loglevel" => {
                    let raw = required(name, value)?;
                    log_level =
                        Some(Level::parse(raw).ok_or_else(|| format!("invalid loglevel '{raw}'"))?);
                }
                "-logformat" => {
                    let raw = required(name, value)?;
                    log_format = Some(
                        Format::parse(raw).ok_or_else(|| format!("invalid logformat '{raw}'"))?,
                    );
                }
                "-help" | "--help" | "-h" => return Err("help requested".to_string()),
                _ => return Err(format!("unknown option '{name}'")),
            }
        }

        let data_dir = data_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let conf_file = conf_path.unwrap_or_else(|| data_dir.join(CONF_FILE_NAME));
        if conf_file.exists() {
            let conf = read_conf_file(&conf_file)?;
            if network.is_none() && conf_flag(&conf, "testnet") {
                network = Some(Network::Testnet);
            }
            if network.is_none() && conf_flag(&conf, "regtest") {
                network = Some(Network::Regtest);
            }
            if db_cache_mb.is_none() {
                db_cache_mb = conf_number(&conf, "dbcache", &conf_file)?;
            }
            if check_level.is_none() {
                check_level = conf_number(&conf, "checklevel", &conf_file)?;
            }
            if check_blocks.is_none() {
                check_blocks = conf_number(&conf, "checkblocks", &conf_file)?;
            }
            if spork_key.is_none() {
                spork_key = conf.get("sporkkey").cloned();
            }
            if log_level.is_none() {
                if let Some(raw) = conf.get("loglevel") {
                    log_level = Some(
                        Level::parse(raw)
                            .ok_or_else(|| format!("invalid loglevel '{raw}' in conf file"))?,
                    );
                }
            }
            if log_format.is_none() {
                if let Some(raw) = conf.get("logformat") {
                    log_format = Some(
                        Format::parse(raw)
                            .ok_or_else(|| format!("invalid logformat '{raw}' in conf file"))?,
                    );
                }
            }
        }

        let check_level = check_level.unwrap_or(DEFAULT_CHECK_LEVEL);
        if check_level > 7 {
            return Err(format!("invalid checklevel {check_level}, expected 0..=7"));
        }
        let db_cache_mb = db_cache_mb.unwrap_or(DEFAULT_DB_CACHE_MB);
        if db_cache_mb == 0 {
            return Err("dbcache must be at least 1 MiB".to_string());
        }

        Ok(Self {
            data_dir,
            network: network.unwrap_or(Network::Mainnet),
            db_cache_mb,
            check_level,
            check_blocks: check_blocks.unwrap_or(DEFAULT_CHECK_BLOCKS),
            spork_key,
            log_level: log_level.unwrap_or(Level::Info),
            log_format: log_format.unwrap_or(Format::Text),
        })
    }
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, String> {
    value.ok_or_else(|| format!("option '{name}' requires a value"))
}

fn parse_number<T: std::str::FromStr>(name: &str, value: Option<&str>) -> Result<T, String> {
    let raw = required(name, value)?;
    raw.parse::<T>()
        .map_err(|_| format!("invalid value '{raw}' for option '{name}'"))
}

fn read_conf_file(path: &Path) -> Result<HashMap<String, String>, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read {}: {err}", path.display()))?;
    let mut conf = HashMap::new();
    for line in contents.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(format!("malformed line '{line}' in {}", path.display()));
        };
        conf.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(conf)
}

fn conf_flag(conf: &HashMap<String, String>, key: &str) -> bool {
    conf.get(key).map(|raw| raw == "1").unwrap_or(false)
}

fn conf_number<T: std::str::FromStr>(
    conf: &HashMap<String, String>,
    key: &str,
    path: &Path,
) -> Result<Option<T>, String> {
    match conf.get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("invalid {key} '{raw}' in {}", path.display())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn defaults() {
        let config = Config::parse(&args(&["-datadir=/nonexistent/argond-test"])).expect("parse");
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.db_cache_mb, 25);
        assert_eq!(config.check_level, 1);
        assert_eq!(config.check_blocks, 500);
        assert_eq!(config.log_level, Level::Info);
        assert_eq!(config.log_format, Format::Text);
        assert!(config.spork_key.is_none());
    }

    #[test]
    fn cli_overrides() {
        let config = Config::parse(&args(&[
            "-datadir=/nonexistent/argond-test",
            "-testnet",
            "-dbcache=100",
            "-checklevel=7",
            "-checkblocks=0",
            "-loglevel=debug",
            "-logformat=json",
        ]))
        .expect("parse");
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.db_cache_mb, 100);
        assert_eq!(config.check_level, 7);
        assert_eq!(config.check_blocks, 0);
        assert_eq!(config.log_level, Level::Debug);
        assert_eq!(config.log_format, Format::Json);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::parse(&args(&["-checklevel=8"])).is_err());
        assert!(Config::parse(&args(&["-dbcache=0"])).is_err());
        assert!(Config::parse(&args(&["-dbcache=lots"])).is_err());
        assert!(Config::parse(&args(&["-datadir"])).is_err());
        assert!(Config::parse(&args(&["-frobnicate"])).is_err());
    }

    #[test]
    fn conf_file_fills_gaps_and_cli_wins() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("argond-conf-{}-{nanos}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create dir");
        std::fs::write(
            dir.join(CONF_FILE_NAME),
            "# comment\ntestnet=1\ndbcache=32\ndbcache=64\nchecklevel=3\n",
        )
        .expect("write conf");

        let config = Config::parse(&args(&[
            &format!("-datadir={}", dir.display()),
            "-checklevel=2",
        ]))
        .expect("parse");

        // CLI beats conf; conf fills what the CLI left unset. For repeated
        // conf keys the last line wins.
        assert_eq!(config.check_level, 2);
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.db_cache_mb, 64);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
