//! # 交易模块
//!
//! 定义交易输入、交易输出、未花费输出和交易本身，以及交易ID的计算方式。
//!
//! 交易ID是所有输入引用和所有输出字段按顺序拼接后的SHA-256哈希，
//! 因此输入输出的顺序会影响ID，必须原样保留。签名不参与ID计算。

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 每个区块coinbase交易的固定奖励
pub const COINBASE_AMOUNT: u64 = 50;

/// 输出的引用键 `(txOutId, txOutIndex)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutPoint {
    pub tx_out_id: String,
    pub tx_out_index: u32,
}

impl OutPoint {
    pub fn new(tx_out_id: impl Into<String>, tx_out_index: u32) -> Self {
        OutPoint {
            tx_out_id: tx_out_id.into(),
            tx_out_index,
        }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_out_id, self.tx_out_index)
    }
}

/// 交易输入结构，引用之前交易的输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxIn {
    /// 被引用输出所在交易的ID
    pub tx_out_id: String,
    /// 被引用输出在该交易中的下标
    pub tx_out_index: u32,
    /// DER编码的十六进制签名，签名前为空
    pub signature: String,
}

impl TxIn {
    /// 创建一个尚未签名的输入
    pub fn unsigned(tx_out_id: impl Into<String>, tx_out_index: u32) -> Self {
        TxIn {
            tx_out_id: tx_out_id.into(),
            tx_out_index,
            signature: String::new(),
        }
    }

    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.tx_out_id.clone(), self.tx_out_index)
    }
}

/// 交易输出结构，表示金额和接收者
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    /// 接收者地址，即十六进制的非压缩公钥
    pub address: String,
    /// 输出金额，以最小单位计
    pub amount: u64,
}

impl TxOut {
    pub fn new(address: impl Into<String>, amount: u64) -> Self {
        TxOut {
            address: address.into(),
            amount,
        }
    }
}

/// 尚未被任何输入引用的输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnspentTxOut {
    pub tx_out_id: String,
    pub tx_out_index: u32,
    pub address: String,
    pub amount: u64,
}

impl UnspentTxOut {
    pub fn new(
        tx_out_id: impl Into<String>,
        tx_out_index: u32,
        address: impl Into<String>,
        amount: u64,
    ) -> Self {
        UnspentTxOut {
            tx_out_id: tx_out_id.into(),
            tx_out_index,
            address: address.into(),
            amount,
        }
    }

    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.tx_out_id.clone(), self.tx_out_index)
    }
}

/// 交易结构，包含ID、输入列表和输出列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// 交易内容的哈希
    pub id: String,
    /// 交易输入列表，表示花费的UTXO
    pub tx_ins: Vec<TxIn>,
    /// 交易输出列表，表示创建的新UTXO
    pub tx_outs: Vec<TxOut>,
}

impl Transaction {
    /// 创建新的交易并计算其ID
    ///
    /// # 参数
    ///
    /// * `tx_ins` - 交易输入列表
    /// * `tx_outs` - 交易输出列表
    pub fn new(tx_ins: Vec<TxIn>, tx_outs: Vec<TxOut>) -> Self {
        let mut tx = Transaction {
            id: String::new(),
            tx_ins,
            tx_outs,
        };
        tx.id = compute_id(&tx);
        tx
    }

    /// 创建区块奖励交易
    ///
    /// 唯一的输入不引用任何真实输出，`tx_out_index` 存放区块高度。
    pub fn coinbase(address: impl Into<String>, block_index: u32) -> Self {
        Transaction::new(
            vec![TxIn::unsigned("", block_index)],
            vec![TxOut::new(address, COINBASE_AMOUNT)],
        )
    }

    /// ID是否与当前内容重新计算的哈希一致
    pub fn has_valid_id(&self) -> bool {
        compute_id(self) == self.id
    }

    /// 输出总额
    pub fn total_out(&self) -> u128 {
        self.tx_outs.iter().map(|out| u128::from(out.amount)).sum()
    }
}

/// 计算交易ID
///
/// 依次拼接每个输入的 `txOutId + txOutIndex` 和每个输出的 `address + amount`
/// （数字均为十进制），再对整个字符串做SHA-256，返回小写十六进制摘要。
pub fn compute_id(tx: &Transaction) -> String {
    let mut content = String::new();
    for tx_in in &tx.tx_ins {
        content.push_str(&tx_in.tx_out_id);
        content.push_str(&tx_in.tx_out_index.to_string());
    }
    for tx_out in &tx.tx_outs {
        content.push_str(&tx_out.address);
        content.push_str(&tx_out.amount.to_string());
    }

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
