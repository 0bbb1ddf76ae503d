//! # 交易验证模块
//!
//! 单笔交易的结构检查和完整验证。
//!
//! 结构检查很便宜，只看字段形状；完整验证依次检查交易ID、每个输入的引用和签名、
//! 输入输出总额是否相等，遇到第一个失败就返回。

use log::{debug, warn};

use crate::error::ValidationError;
use crate::signing::verify_signature;
use crate::transaction::{compute_id, Transaction, TxIn, TxOut};
use crate::utxo::UtxoSet;

/// 非压缩公钥的十六进制长度
pub const ADDRESS_LEN: usize = 130;

/// 地址是否是 `04` + X坐标 + Y坐标 格式的十六进制公钥
pub fn is_valid_address(address: &str) -> bool {
    if address.len() != ADDRESS_LEN {
        debug!("公钥长度无效: {}", address.len());
        return false;
    }
    if !address.chars().all(|c| c.is_ascii_hexdigit()) {
        debug!("公钥只能包含十六进制字符");
        return false;
    }
    if !address.starts_with("04") {
        debug!("公钥必须以04开头");
        return false;
    }
    true
}

fn structural(reason: String) -> ValidationError {
    warn!("{}", reason);
    ValidationError::Structural(reason)
}

fn check_tx_out_structure(tx_out: &TxOut) -> Result<(), ValidationError> {
    if !is_valid_address(&tx_out.address) {
        return Err(structural(format!("输出地址无效: {}", tx_out.address)));
    }
    if tx_out.amount == 0 {
        return Err(structural(format!("输出 {} 的金额为0", tx_out.address)));
    }
    Ok(())
}

/// 检查单笔交易的结构，不涉及签名和金额
///
/// 输入字段的类型由类型系统保证，JSON中的形状错误由 [`parse_transactions`] 报告。
pub fn is_valid_transaction_structure(tx: &Transaction) -> Result<(), ValidationError> {
    if tx.id.is_empty() {
        return Err(structural("缺少交易ID".to_string()));
    }
    tx.tx_outs.iter().try_for_each(check_tx_out_structure)?;
    Ok(())
}

pub fn is_valid_transactions_structure(transactions: &[Transaction]) -> Result<(), ValidationError> {
    transactions.iter().try_for_each(is_valid_transaction_structure)
}

/// 从JSON解析交易列表，形状不符时返回结构错误
pub fn parse_transactions(json: &str) -> Result<Vec<Transaction>, ValidationError> {
    serde_json::from_str(json).map_err(|err| structural(format!("无法解析交易: {}", err)))
}

/// 从JSON解析单笔交易
pub fn parse_transaction(json: &str) -> Result<Transaction, ValidationError> {
    serde_json::from_str(json).map_err(|err| structural(format!("无法解析交易: {}", err)))
}

/// 检查输入引用的输出存在且签名属于该输出的地址
pub fn validate_tx_in(
    tx_in: &TxIn,
    tx: &Transaction,
    snapshot: &UtxoSet,
) -> Result<u64, ValidationError> {
    let referenced = snapshot.resolve(tx_in).ok_or_else(|| {
        warn!("找不到引用的输出: {}", tx_in.outpoint());
        ValidationError::ReferenceNotFound(tx_in.outpoint())
    })?;

    if !verify_signature(&tx.id, &tx_in.signature, &referenced.address) {
        warn!(
            "输入签名无效: {} 交易: {} 地址: {}",
            tx_in.signature, tx.id, referenced.address
        );
        return Err(ValidationError::InvalidSignature {
            tx_id: tx.id.clone(),
            outpoint: tx_in.outpoint(),
        });
    }

    Ok(referenced.amount)
}

/// 针对快照完整验证一笔普通（非coinbase）交易
pub fn validate_transaction(tx: &Transaction, snapshot: &UtxoSet) -> Result<(), ValidationError> {
    let computed = compute_id(tx);
    if computed != tx.id {
        warn!("交易ID无效: {}", tx.id);
        return Err(ValidationError::IdMismatch {
            declared: tx.id.clone(),
            computed,
        });
    }

    let mut total_in: u128 = 0;
    for tx_in in &tx.tx_ins {
        total_in += u128::from(validate_tx_in(tx_in, tx, snapshot)?);
    }

    let total_out = tx.total_out();
    if total_in != total_out {
        warn!(
            "交易 {} 输入总额 {} 与输出总额 {} 不相等",
            tx.id, total_in, total_out
        );
        return Err(ValidationError::ValueMismatch {
            tx_id: tx.id.clone(),
            total_in,
            total_out,
        });
    }

    debug!("交易 {} 验证通过", tx.id);
    Ok(())
}
