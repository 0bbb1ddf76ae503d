//! # 配置模块
//!
//! 钱包程序的配置。先取默认值，再读取可选的JSON配置文件，最后用环境变量覆盖。

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 水龙头私钥的默认值
pub const DEFAULT_FAUCET_PRIVATE_KEY: &str =
    "838ff8634c41ba62467cc874ca156830ba55efe3e41ceeeeae5f3e77238f4eef";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 私钥文件路径
    pub key_path: PathBuf,
    /// 账本文件路径
    pub ledger_path: PathBuf,
    /// 水龙头私钥，`faucet` 命令从这个私钥的余额中转账
    pub faucet_private_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            key_path: PathBuf::from("wallet/private_key"),
            ledger_path: PathBuf::from("ledger.json"),
            faucet_private_key: DEFAULT_FAUCET_PRIVATE_KEY.to_string(),
        }
    }
}

impl Config {
    /// 加载配置
    ///
    /// # 参数
    ///
    /// * `path` - 可选的JSON配置文件，缺省的字段使用默认值
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        config.apply_overrides(|name| env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件 {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("配置文件格式错误 {}", path.display()))?;
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("WALLET_KEY_PATH") {
            self.key_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("WALLET_LEDGER_PATH") {
            self.ledger_path = PathBuf::from(path);
        }
        if let Some(key) = lookup("WALLET_FAUCET_KEY") {
            self.faucet_private_key = key;
        }
    }
}
