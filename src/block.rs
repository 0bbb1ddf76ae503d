//! # 区块模块
//!
//! 定义已应用区块的记录，以及一个区块内全部交易作为整体的验证规则：
//! 第一笔必须是合法的coinbase交易，整个区块内不能有重复的输入，
//! 其余每笔交易都必须针对同一个UTXO快照验证通过。

use std::collections::HashSet;

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::transaction::{compute_id, OutPoint, Transaction, TxIn, COINBASE_AMOUNT};
use crate::utxo::UtxoSet;
use crate::validation::validate_transaction;

/// 已应用到账本的区块
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// 区块高度
    pub index: u32,
    /// 区块应用时的时间戳
    pub timestamp: i64,
    /// 区块中的交易，第一笔为coinbase
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// 以当前时间创建区块记录
    pub fn new(index: u32, transactions: Vec<Transaction>) -> Self {
        Block {
            index,
            timestamp: Utc::now().timestamp(),
            transactions,
        }
    }

    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.first()
    }
}

fn coinbase_invalid(reason: &str) -> ValidationError {
    warn!("{}", reason);
    ValidationError::CoinbaseInvalid(reason.to_string())
}

/// 验证coinbase交易
///
/// coinbase只有一个输入，它不引用真实输出：`tx_out_id` 为空，`tx_out_index` 等于区块高度。
/// 该输入不做查找和签名检查。
pub fn validate_coinbase_tx(tx: &Transaction, block_index: u32) -> Result<(), ValidationError> {
    if compute_id(tx) != tx.id {
        return Err(coinbase_invalid("coinbase交易ID无效"));
    }
    let [tx_in] = tx.tx_ins.as_slice() else {
        return Err(coinbase_invalid("coinbase交易必须只有一个输入"));
    };
    if tx_in.tx_out_index != block_index {
        return Err(coinbase_invalid("coinbase输入的下标必须等于区块高度"));
    }
    if !tx_in.tx_out_id.is_empty() {
        return Err(coinbase_invalid("coinbase输入不能引用任何交易"));
    }
    let [tx_out] = tx.tx_outs.as_slice() else {
        return Err(coinbase_invalid("coinbase交易必须只有一个输出"));
    };
    if tx_out.amount != COINBASE_AMOUNT {
        return Err(coinbase_invalid("coinbase交易的金额无效"));
    }
    Ok(())
}

/// 找出第一个重复引用的输出
pub fn find_duplicate_input<'a>(tx_ins: impl IntoIterator<Item = &'a TxIn>) -> Option<OutPoint> {
    let mut seen = HashSet::new();
    tx_ins
        .into_iter()
        .map(TxIn::outpoint)
        .find(|outpoint| !seen.insert(outpoint.clone()))
}

/// 把区块中的交易作为整体验证
///
/// # 参数
///
/// * `transactions` - 区块中的交易，第一笔为coinbase
/// * `snapshot` - 区块应用前的UTXO快照
/// * `block_index` - 区块高度
pub fn validate_block_transactions(
    transactions: &[Transaction],
    snapshot: &UtxoSet,
    block_index: u32,
) -> Result<(), ValidationError> {
    let Some((coinbase, normal)) = transactions.split_first() else {
        return Err(coinbase_invalid("区块的第一笔交易必须是coinbase交易"));
    };
    validate_coinbase_tx(coinbase, block_index)?;

    // 包括coinbase在内，每个输入在区块中只能出现一次
    let all_tx_ins = transactions.iter().flat_map(|tx| tx.tx_ins.iter());
    if let Some(duplicate) = find_duplicate_input(all_tx_ins) {
        warn!("重复的交易输入: {}", duplicate);
        return Err(ValidationError::DuplicateInput(duplicate));
    }

    for tx in normal {
        validate_transaction(tx, snapshot)?;
    }

    debug!("区块 {} 的 {} 笔交易验证通过", block_index, transactions.len());
    Ok(())
}
