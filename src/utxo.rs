//! # UTXO集合模块
//!
//! `UtxoSet` 是某一时刻全部未花费输出的快照。快照是不可变的值：
//! 应用一个区块不会修改原快照，而是返回一个新的快照。
//!
//! 验证和更新是两个先后进行的阶段，[`update_unspent_tx_outs`] 本身不做任何验证，
//! 只能在区块验证通过之后调用；[`process_transactions`] 把两个阶段串起来。

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::block::validate_block_transactions;
use crate::error::ValidationError;
use crate::transaction::{OutPoint, Transaction, TxIn, UnspentTxOut};
use crate::validation::is_valid_transactions_structure;

/// 未花费输出的快照
///
/// 保留插入顺序（钱包按这个顺序选择输出），同时按 `(txOutId, txOutIndex)` 建立索引。
/// 同一个键出现多次时，查找返回第一个。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<UnspentTxOut>", into = "Vec<UnspentTxOut>")]
pub struct UtxoSet {
    outputs: Vec<UnspentTxOut>,
    index: HashMap<OutPoint, usize>,
}

impl UtxoSet {
    pub fn new() -> Self {
        UtxoSet::default()
    }

    pub fn find(&self, tx_out_id: &str, tx_out_index: u32) -> Option<&UnspentTxOut> {
        self.index
            .get(&OutPoint::new(tx_out_id, tx_out_index))
            .map(|&pos| &self.outputs[pos])
    }

    /// 查找 `tx_in` 引用的输出
    pub fn resolve(&self, tx_in: &TxIn) -> Option<&UnspentTxOut> {
        self.find(&tx_in.tx_out_id, tx_in.tx_out_index)
    }

    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.index.contains_key(outpoint)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnspentTxOut> {
        self.outputs.iter()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// 属于某个地址的未花费输出，保持快照中的顺序
    pub fn owned_by(&self, address: &str) -> Vec<UnspentTxOut> {
        self.outputs
            .iter()
            .filter(|utxo| utxo.address == address)
            .cloned()
            .collect()
    }
}

impl From<Vec<UnspentTxOut>> for UtxoSet {
    fn from(outputs: Vec<UnspentTxOut>) -> Self {
        let mut index = HashMap::with_capacity(outputs.len());
        for (pos, utxo) in outputs.iter().enumerate() {
            index.entry(utxo.outpoint()).or_insert(pos);
        }
        UtxoSet { outputs, index }
    }
}

impl From<UtxoSet> for Vec<UnspentTxOut> {
    fn from(set: UtxoSet) -> Self {
        set.outputs
    }
}

impl FromIterator<UnspentTxOut> for UtxoSet {
    fn from_iter<I: IntoIterator<Item = UnspentTxOut>>(iter: I) -> Self {
        UtxoSet::from(iter.into_iter().collect::<Vec<_>>())
    }
}

/// 输出在交易中的下标，输入只能用u32引用它
fn output_index(position: usize) -> Option<u32> {
    u32::try_from(position).ok()
}

/// 根据一组已验证的交易计算新的快照
///
/// 新快照 = 原快照去掉被任意输入引用的输出，再追加每笔交易的全部输出。
/// 不做验证，输入不合法时会得到不一致的快照。
pub fn update_unspent_tx_outs(transactions: &[Transaction], snapshot: &UtxoSet) -> UtxoSet {
    let consumed: HashSet<OutPoint> = transactions
        .iter()
        .flat_map(|tx| tx.tx_ins.iter().map(TxIn::outpoint))
        .collect();

    let created = transactions.iter().flat_map(|tx| {
        tx.tx_outs.iter().enumerate().filter_map(move |(index, tx_out)| {
            let Some(index) = output_index(index) else {
                warn!("交易 {} 的输出下标 {} 超出u32范围，无法被引用", tx.id, index);
                return None;
            };
            Some(UnspentTxOut::new(tx.id.clone(), index, tx_out.address.clone(), tx_out.amount))
        })
    });

    let next: UtxoSet = snapshot
        .iter()
        .filter(|utxo| !consumed.contains(&utxo.outpoint()))
        .cloned()
        .chain(created)
        .collect();

    debug!(
        "UTXO快照已更新: 消耗 {} 个引用, 输出数 {} -> {}",
        consumed.len(),
        snapshot.len(),
        next.len()
    );
    next
}

/// 处理一个区块的交易：结构检查 → 区块验证 → 更新快照
///
/// 任一检查失败都返回错误，原快照保持不变。
pub fn process_transactions(
    transactions: &[Transaction],
    snapshot: &UtxoSet,
    block_index: u32,
) -> Result<UtxoSet, ValidationError> {
    is_valid_transactions_structure(transactions)?;

    if let Err(err) = validate_block_transactions(transactions, snapshot, block_index) {
        warn!("区块 {} 的交易无效: {}", block_index, err);
        return Err(err);
    }

    Ok(update_unspent_tx_outs(transactions, snapshot))
}
