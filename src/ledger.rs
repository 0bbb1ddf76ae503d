//! # 账本模块
//!
//! 单节点本地账本：保存当前UTXO快照、待打包的交易池和已应用区块的记录，
//! 并以JSON文件持久化。账本没有工作量证明，也不处理分叉。

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::block::{find_duplicate_input, Block};
use crate::error::ValidationError;
use crate::transaction::{Transaction, UnspentTxOut};
use crate::utxo::{process_transactions, UtxoSet};
use crate::validation::{is_valid_transaction_structure, validate_transaction};
use crate::wallet::get_balance;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    /// 下一个区块的高度
    pub height: u32,
    pub unspent_tx_outs: UtxoSet,
    /// 等待打包的交易
    pub pool: Vec<Transaction>,
    pub blocks: Vec<Block>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("无法读取账本文件 {}", path.display()))?;
        let ledger = serde_json::from_str(&contents)
            .with_context(|| format!("账本文件格式错误 {}", path.display()))?;
        Ok(ledger)
    }

    /// 读取账本文件，文件不存在时返回空账本
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("账本文件 {} 不存在，使用空账本", path.display());
            return Ok(Ledger::new());
        }
        Ledger::load(path)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("无法写入账本文件 {}", path.display()))?;
        Ok(())
    }

    /// 把交易加入交易池
    ///
    /// 交易必须针对当前快照验证通过，并且不能花费交易池中其他交易已经花费的输出。
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<(), ValidationError> {
        is_valid_transaction_structure(&tx)?;
        validate_transaction(&tx, &self.unspent_tx_outs)?;

        let pooled = self.pool.iter().flat_map(|pooled| pooled.tx_ins.iter());
        if let Some(duplicate) = find_duplicate_input(pooled.chain(tx.tx_ins.iter())) {
            warn!("交易 {} 花费的输出 {} 已在交易池中", tx.id, duplicate);
            return Err(ValidationError::DuplicateInput(duplicate));
        }

        info!("交易 {} 已加入交易池", tx.id);
        self.pool.push(tx);
        Ok(())
    }

    /// 把交易池中的交易连同奖励给 `reward_address` 的coinbase打包成区块并应用
    pub fn commit_block(&mut self, reward_address: &str) -> Result<Block, ValidationError> {
        let mut transactions = vec![Transaction::coinbase(reward_address, self.height)];
        transactions.extend(self.pool.iter().cloned());
        self.apply_block(transactions)
    }

    /// 在当前高度应用一个区块，失败时账本保持不变
    ///
    /// # 返回值
    ///
    /// 返回已记录的区块
    pub fn apply_block(&mut self, transactions: Vec<Transaction>) -> Result<Block, ValidationError> {
        let next = process_transactions(&transactions, &self.unspent_tx_outs, self.height)?;
        self.unspent_tx_outs = next;

        let block = Block::new(self.height, transactions);
        info!(
            "已应用区块 {}: {} 笔交易, 当前UTXO数 {}",
            block.index,
            block.transactions.len(),
            self.unspent_tx_outs.len()
        );
        self.height += 1;
        self.prune_pool();
        self.blocks.push(block.clone());
        Ok(block)
    }

    /// 移除输入已不在快照中的交易
    fn prune_pool(&mut self) {
        let snapshot = &self.unspent_tx_outs;
        self.pool.retain(|tx| {
            tx.tx_ins
                .iter()
                .all(|tx_in| snapshot.resolve(tx_in).is_some())
        });
    }

    pub fn balance(&self, address: &str) -> u128 {
        get_balance(address, &self.unspent_tx_outs)
    }

    pub fn unspent_for(&self, address: &str) -> Vec<UnspentTxOut> {
        self.unspent_tx_outs.owned_by(address)
    }
}
