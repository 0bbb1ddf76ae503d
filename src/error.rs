//! # 错误模块
//!
//! 定义交易验证和钱包构建交易时可能出现的错误类型。
//!
//! 所有错误对调用方都是可恢复的：验证器返回带原因的判定结果，
//! 构建交易失败只会让本次请求失败，不会影响进程。

use thiserror::Error;

use crate::transaction::OutPoint;

/// 交易或区块验证失败的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 交易结构不合法（字段类型、地址格式、金额等）
    #[error("交易结构不合法: {0}")]
    Structural(String),

    /// 交易ID与重新计算的哈希不一致，说明内容被篡改
    #[error("交易ID不匹配: 声明为 {declared}, 实际为 {computed}")]
    IdMismatch { declared: String, computed: String },

    /// 输入引用的输出不在UTXO快照中
    #[error("找不到引用的输出 {0}")]
    ReferenceNotFound(OutPoint),

    /// 输入签名无法通过被引用输出的地址验证
    #[error("输入 {outpoint} 的签名无效 (交易 {tx_id})")]
    InvalidSignature { tx_id: String, outpoint: OutPoint },

    /// 输入总额与输出总额不相等
    #[error("交易 {tx_id} 输入总额 {total_in} 与输出总额 {total_out} 不相等")]
    ValueMismatch {
        tx_id: String,
        total_in: u128,
        total_out: u128,
    },

    /// 同一区块内有两个输入引用了同一个输出
    #[error("重复的交易输入 {0}")]
    DuplicateInput(OutPoint),

    /// coinbase交易不合法
    #[error("coinbase交易不合法: {0}")]
    CoinbaseInvalid(String),
}

/// 钱包签名或构建交易失败的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// 可用输出的总额不足以支付请求的金额
    #[error("余额不足: 需要 {required}, 可用 {available}")]
    InsufficientFunds { required: u64, available: u128 },

    /// 签名私钥与被引用输出的地址不匹配
    #[error("私钥与输出 {0} 的地址不匹配")]
    KeyMismatch(OutPoint),

    /// 要签名的输入引用了快照中不存在的输出
    #[error("找不到引用的输出 {0}")]
    ReferenceNotFound(OutPoint),

    #[error("无效的私钥: {0}")]
    InvalidPrivateKey(String),

    #[error("无效的地址: {0}")]
    InvalidAddress(String),

    /// 交易ID不是32字节哈希的十六进制，无法作为签名消息
    #[error("交易ID格式错误: {0}")]
    MalformedId(String),

    #[error("无效的金额: {0}")]
    InvalidAmount(u64),

    /// 输入下标超出了交易的输入数量
    #[error("输入下标 {index} 超出范围 (共 {len} 个输入)")]
    InputIndexOutOfRange { index: usize, len: usize },
}
