//! # 钱包模块
//!
//! 私钥文件管理、余额查询和交易构建。
//!
//! 构建交易时按快照中的顺序依次选取属于发送方的未花费输出，直到总额不小于
//! 要发送的金额；超出的部分作为找零输出返还给发送方。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::error::WalletError;
use crate::signing::{generate_keypair, generate_private_key, public_key_from_private, sign_tx_in};
use crate::transaction::{Transaction, TxIn, TxOut, UnspentTxOut};
use crate::utxo::UtxoSet;
use crate::validation::is_valid_address;

/// 某个地址的余额，即它全部未花费输出的金额之和
pub fn get_balance(address: &str, snapshot: &UtxoSet) -> u128 {
    snapshot
        .iter()
        .filter(|utxo| utxo.address == address)
        .map(|utxo| u128::from(utxo.amount))
        .sum()
}

/// 按顺序选取输出，直到总额不小于 `amount`
///
/// 没有候选输出时总是失败，即使 `amount` 为0。
///
/// # 返回值
///
/// 返回选中的输出（`candidates` 的前缀）和超出的金额
pub fn find_tx_outs_for_amount(
    amount: u64,
    candidates: &[UnspentTxOut],
) -> Result<(Vec<UnspentTxOut>, u64), WalletError> {
    let mut current: u128 = 0;
    let mut included = Vec::new();
    let target = u128::from(amount);

    // 先加入再比较，因此至少选中一个输出
    for utxo in candidates {
        included.push(utxo.clone());
        current += u128::from(utxo.amount);
        if current >= target {
            // 最后一个输出加入前总额小于 amount，超出部分不超过该输出的金额
            let left_over = u64::try_from(current - target)
                .map_err(|_| WalletError::InvalidAmount(amount))?;
            return Ok((included, left_over));
        }
    }

    Err(WalletError::InsufficientFunds {
        required: amount,
        available: current,
    })
}

fn create_tx_outs(receiver: &str, sender: &str, amount: u64, left_over: u64) -> Vec<TxOut> {
    let mut tx_outs = vec![TxOut::new(receiver, amount)];
    if left_over > 0 {
        tx_outs.push(TxOut::new(sender, left_over));
    }
    tx_outs
}

/// 构建并签名一笔转账交易
///
/// # 参数
///
/// * `receiver` - 接收者地址
/// * `amount` - 转账金额
/// * `private_key` - 发送方私钥
/// * `snapshot` - 当前UTXO快照
///
/// # 返回值
///
/// 返回已签名但尚未提交的交易
pub fn build_transaction(
    receiver: &str,
    amount: u64,
    private_key: &str,
    snapshot: &UtxoSet,
) -> Result<Transaction, WalletError> {
    if amount == 0 {
        return Err(WalletError::InvalidAmount(amount));
    }
    if !is_valid_address(receiver) {
        return Err(WalletError::InvalidAddress(receiver.to_string()));
    }

    let sender = public_key_from_private(private_key)?;
    let own_outputs = snapshot.owned_by(&sender);
    let (included, left_over) = find_tx_outs_for_amount(amount, &own_outputs)?;

    let tx_ins = included
        .iter()
        .map(|utxo| TxIn::unsigned(utxo.tx_out_id.clone(), utxo.tx_out_index))
        .collect();
    let mut tx = Transaction::new(tx_ins, create_tx_outs(receiver, &sender, amount, left_over));

    for index in 0..tx.tx_ins.len() {
        let signature = sign_tx_in(&tx, index, private_key, snapshot)?;
        tx.tx_ins[index].signature = signature;
    }

    debug!(
        "已构建交易 {}: {} 个输入, 找零 {}",
        tx.id,
        tx.tx_ins.len(),
        left_over
    );
    Ok(tx)
}

/// 私钥文件
#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        KeyStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// 如果私钥文件不存在就生成一个新私钥写入，已有的私钥不会被覆盖
    ///
    /// # 返回值
    ///
    /// 新建了私钥时返回 `true`
    pub fn init(&self) -> Result<bool> {
        if self.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("无法创建目录 {}", parent.display()))?;
        }
        fs::write(&self.path, generate_private_key())
            .with_context(|| format!("无法写入私钥文件 {}", self.path.display()))?;
        info!("已创建新钱包私钥: {}", self.path.display());
        Ok(true)
    }

    pub fn private_key(&self) -> Result<String> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("无法读取私钥文件 {}", self.path.display()))?;
        Ok(contents.trim().to_string())
    }

    /// 由私钥文件中的私钥派生钱包地址
    pub fn address(&self) -> Result<String> {
        Ok(public_key_from_private(&self.private_key()?)?)
    }

    pub fn load(&self) -> Result<Wallet> {
        Ok(Wallet::from_private_key(&self.private_key()?)?)
    }
}

/// 持有私钥及其地址的钱包
pub struct Wallet {
    private_key: String,
    pub address: String,
}

impl Wallet {
    /// 用随机私钥创建钱包
    pub fn new() -> Self {
        let (private_key, address) = generate_keypair();
        Wallet {
            private_key,
            address,
        }
    }

    pub fn from_private_key(private_key: &str) -> Result<Self, WalletError> {
        let address = public_key_from_private(private_key)?;
        Ok(Wallet {
            private_key: private_key.trim().to_string(),
            address,
        })
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    pub fn balance(&self, snapshot: &UtxoSet) -> u128 {
        get_balance(&self.address, snapshot)
    }

    pub fn create_transaction(
        &self,
        receiver: &str,
        amount: u64,
        snapshot: &UtxoSet,
    ) -> Result<Transaction, WalletError> {
        build_transaction(receiver, amount, &self.private_key, snapshot)
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Wallet::new()
    }
}
