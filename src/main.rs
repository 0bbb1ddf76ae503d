//! # UTXO钱包命令行程序
//!
//! 读取配置和私钥文件，在本地账本上查询余额、发送交易和打包区块。
//! 账本在每次修改后写回文件。

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use log::debug;

use utxo_wallet::config::Config;
use utxo_wallet::ledger::Ledger;
use utxo_wallet::wallet::{KeyStore, Wallet};

const USAGE: &str = "用法: utxo-wallet <命令> [参数]

命令:
  init                      创建钱包私钥（已存在时不覆盖）
  address                   显示钱包地址
  balance [地址]            查询余额，缺省为本钱包
  send <接收地址> <金额>    从本钱包转账，交易进入交易池
  faucet <接收地址> <金额>  从水龙头私钥转账，交易进入交易池
  mine [地址]               把交易池打包成区块，奖励给指定地址（缺省为本钱包）
  utxos                     列出全部未花费输出
  pool                      列出交易池中的交易

环境变量:
  WALLET_CONFIG             JSON配置文件路径
  WALLET_KEY_PATH           私钥文件路径
  WALLET_LEDGER_PATH        账本文件路径
  WALLET_FAUCET_KEY         水龙头私钥
  RUST_LOG                  日志级别";

fn parse_amount(arg: Option<&String>) -> Result<u64> {
    let raw = arg.ok_or_else(|| anyhow!("缺少金额参数"))?;
    raw.parse()
        .with_context(|| format!("金额必须是非负整数: {}", raw))
}

fn send_from(ledger: &mut Ledger, wallet: &Wallet, args: &[String]) -> Result<()> {
    let receiver = args.first().ok_or_else(|| anyhow!("缺少接收地址"))?;
    let amount = parse_amount(args.get(1))?;

    let tx = wallet.create_transaction(receiver, amount, &ledger.unspent_tx_outs)?;
    let tx_id = tx.id.clone();
    ledger.submit_transaction(tx)?;
    println!("✅ 交易 {} 已加入交易池", tx_id);
    Ok(())
}

fn run(args: &[String]) -> Result<()> {
    let config_path = env::var("WALLET_CONFIG").ok().map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    debug!("配置: {:?}", config);

    let key_store = KeyStore::new(&config.key_path);
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };
    let rest = &args[1..];

    match command.as_str() {
        "init" => {
            if key_store.init()? {
                println!("🔑 已创建新钱包: {}", key_store.path().display());
            } else {
                println!("ℹ️  钱包已存在: {}", key_store.path().display());
            }
            println!("地址: {}", key_store.address()?);
        }
        "address" => {
            println!("{}", key_store.address()?);
        }
        "balance" => {
            let ledger = Ledger::open(&config.ledger_path)?;
            let address = match rest.first() {
                Some(address) => address.clone(),
                None => key_store.address()?,
            };
            println!("💰 余额: {}", ledger.balance(&address));
        }
        "send" => {
            let wallet = key_store.load()?;
            let mut ledger = Ledger::open(&config.ledger_path)?;
            send_from(&mut ledger, &wallet, rest)?;
            ledger.save(&config.ledger_path)?;
        }
        "faucet" => {
            let faucet = Wallet::from_private_key(&config.faucet_private_key)?;
            let mut ledger = Ledger::open(&config.ledger_path)?;
            send_from(&mut ledger, &faucet, rest)?;
            ledger.save(&config.ledger_path)?;
        }
        "mine" => {
            let mut ledger = Ledger::open(&config.ledger_path)?;
            let address = match rest.first() {
                Some(address) => address.clone(),
                None => key_store.address()?,
            };
            let block = ledger.commit_block(&address)?;
            println!(
                "📦 区块 {} 已应用，包含 {} 笔交易",
                block.index,
                block.transactions.len()
            );
            ledger.save(&config.ledger_path)?;
        }
        "utxos" => {
            let ledger = Ledger::open(&config.ledger_path)?;
            for utxo in ledger.unspent_tx_outs.iter() {
                println!(
                    "{}:{}  {}  {}",
                    utxo.tx_out_id, utxo.tx_out_index, utxo.amount, utxo.address
                );
            }
        }
        "pool" => {
            let ledger = Ledger::open(&config.ledger_path)?;
            println!("{}", serde_json::to_string_pretty(&ledger.pool)?);
        }
        other => bail!("未知命令: {}\n\n{}", other, USAGE),
    }
    Ok(())
}

/// 程序的主入口函数
fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(err) = run(&args) {
        eprintln!("❌ {:#}", err);
        std::process::exit(1);
    }
}
