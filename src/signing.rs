//! # 签名模块
//!
//! 基于secp256k1的密钥派生、交易输入签名和签名验证。
//!
//! 地址就是十六进制编码的非压缩公钥（`04` 开头，共130个字符），
//! 签名的消息是交易ID解码后的32字节，签名以DER格式的十六进制字符串保存。

use log::{debug, warn};
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey};

use crate::error::WalletError;
use crate::transaction::Transaction;
use crate::utxo::UtxoSet;

/// 随机生成一对密钥
///
/// # 返回值
///
/// 返回 `(私钥, 地址)`，私钥为64个字符的十六进制字符串
pub fn generate_keypair() -> (String, String) {
    let secp = Secp256k1::new();
    let mut rng = rand::thread_rng();
    let (secret_key, public_key) = secp.generate_keypair(&mut rng);
    (
        hex::encode(secret_key.secret_bytes()),
        hex::encode(public_key.serialize_uncompressed()),
    )
}

pub fn generate_private_key() -> String {
    generate_keypair().0
}

/// 解析十六进制私钥
///
/// 不足64个字符的私钥（省略了前导零）会先在左侧补零。
pub fn parse_private_key(private_key: &str) -> Result<SecretKey, WalletError> {
    let trimmed = private_key.trim();
    if trimmed.is_empty() || trimmed.len() > 64 {
        return Err(WalletError::InvalidPrivateKey(format!(
            "长度为 {} 个字符",
            trimmed.len()
        )));
    }
    let padded = format!("{:0>64}", trimmed);
    let bytes = hex::decode(&padded)
        .map_err(|err| WalletError::InvalidPrivateKey(err.to_string()))?;
    SecretKey::from_slice(&bytes).map_err(|err| WalletError::InvalidPrivateKey(err.to_string()))
}

/// 由私钥派生地址（非压缩公钥的十六进制）
pub fn public_key_from_private(private_key: &str) -> Result<String, WalletError> {
    let secret_key = parse_private_key(private_key)?;
    let secp = Secp256k1::signing_only();
    let public_key = PublicKey::from_secret_key(&secp, &secret_key);
    Ok(hex::encode(public_key.serialize_uncompressed()))
}

fn id_message(tx_id: &str) -> Option<Message> {
    let digest = hex::decode(tx_id).ok()?;
    Message::from_slice(&digest).ok()
}

/// 为交易的第 `input_index` 个输入签名
///
/// 私钥派生出的地址必须与被引用输出的地址一致，否则在任何签名运算之前就拒绝。
///
/// # 返回值
///
/// 返回DER编码的十六进制签名
pub fn sign_tx_in(
    tx: &Transaction,
    input_index: usize,
    private_key: &str,
    snapshot: &UtxoSet,
) -> Result<String, WalletError> {
    let tx_in = tx
        .tx_ins
        .get(input_index)
        .ok_or(WalletError::InputIndexOutOfRange {
            index: input_index,
            len: tx.tx_ins.len(),
        })?;

    let referenced = snapshot
        .resolve(tx_in)
        .ok_or_else(|| WalletError::ReferenceNotFound(tx_in.outpoint()))?;

    if public_key_from_private(private_key)? != referenced.address {
        warn!("试图用不属于输出 {} 的私钥签名", tx_in.outpoint());
        return Err(WalletError::KeyMismatch(tx_in.outpoint()));
    }

    let secret_key = parse_private_key(private_key)?;
    let message = id_message(&tx.id).ok_or_else(|| WalletError::MalformedId(tx.id.clone()))?;

    let secp = Secp256k1::signing_only();
    let signature = secp.sign_ecdsa(&message, &secret_key);
    debug!("已为交易 {} 的输入 {} 签名", tx.id, input_index);
    Ok(hex::encode(signature.serialize_der().to_vec()))
}

/// 用地址对应的公钥验证交易ID上的签名
///
/// ID、签名或地址无法解码时返回 `false`。
pub fn verify_signature(tx_id: &str, signature: &str, address: &str) -> bool {
    let Some(message) = id_message(tx_id) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut signature) = Signature::from_der(&sig_bytes) else {
        return false;
    };
    let Ok(key_bytes) = hex::decode(address) else {
        return false;
    };
    let Ok(public_key) = PublicKey::from_slice(&key_bytes) else {
        return false;
    };

    // 其他签名实现可能产生高S值的签名
    signature.normalize_s();

    let secp = Secp256k1::verification_only();
    secp.verify_ecdsa(&message, &signature, &public_key).is_ok()
}
