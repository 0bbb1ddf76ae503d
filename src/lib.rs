//! # UTXO钱包
//!
//! 基于UTXO模型的最小钱包：构建、签名和验证花费未花费输出的交易，
//! 并在应用一个区块的交易后维护UTXO集合。
//!
//! ## 主要模块
//!
//! * `transaction` - 交易输入、输出、未花费输出和交易ID
//! * `signing` - secp256k1密钥派生、签名和验证
//! * `validation` - 单笔交易的结构检查和完整验证
//! * `block` - 区块内交易的整体验证
//! * `utxo` - UTXO快照及其更新
//! * `wallet` - 私钥文件、余额和交易构建
//! * `ledger` - 本地持久化账本
//! * `config` - 程序配置

pub mod block;
pub mod config;
pub mod error;
pub mod ledger;
pub mod signing;
pub mod transaction;
pub mod utxo;
pub mod validation;
pub mod wallet;

pub use error::{ValidationError, WalletError};
pub use transaction::{OutPoint, Transaction, TxIn, TxOut, UnspentTxOut, COINBASE_AMOUNT};
pub use utxo::UtxoSet;
