use utxo_wallet::block::{find_duplicate_input, validate_block_transactions, validate_coinbase_tx, Block};
use utxo_wallet::error::ValidationError;
use utxo_wallet::signing::{generate_keypair, public_key_from_private};
use utxo_wallet::transaction::{compute_id, OutPoint, Transaction, TxIn, TxOut, UnspentTxOut};
use utxo_wallet::utxo::UtxoSet;
use utxo_wallet::wallet::build_transaction;

const ALICE_KEY: &str = "838ff8634c41ba62467cc874ca156830ba55efe3e41ceeeeae5f3e77238f4eef";

fn alice() -> String {
    public_key_from_private(ALICE_KEY).unwrap()
}

fn funded_snapshot() -> UtxoSet {
    vec![UnspentTxOut::new("a", 0, alice(), 50)].into_iter().collect()
}

#[test]
fn test_valid_coinbase() {
    let coinbase = Transaction::coinbase(alice(), 5);
    assert_eq!(validate_coinbase_tx(&coinbase, 5), Ok(()));
}

#[test]
fn test_coinbase_with_wrong_height() {
    let coinbase = Transaction::coinbase(alice(), 4);
    assert!(matches!(
        validate_coinbase_tx(&coinbase, 5),
        Err(ValidationError::CoinbaseInvalid(_))
    ));
}

#[test]
fn test_coinbase_shape_rules() {
    // 奖励金额错误
    let wrong_amount = Transaction::new(vec![TxIn::unsigned("", 1)], vec![TxOut::new(alice(), 51)]);
    assert!(validate_coinbase_tx(&wrong_amount, 1).is_err());

    // 两个输出
    let two_outputs = Transaction::new(
        vec![TxIn::unsigned("", 1)],
        vec![TxOut::new(alice(), 25), TxOut::new(alice(), 25)],
    );
    assert!(validate_coinbase_tx(&two_outputs, 1).is_err());

    // 没有输入
    let no_inputs = Transaction::new(vec![], vec![TxOut::new(alice(), 50)]);
    assert!(validate_coinbase_tx(&no_inputs, 1).is_err());

    // 引用了真实输出
    let real_reference = Transaction::new(vec![TxIn::unsigned("a", 1)], vec![TxOut::new(alice(), 50)]);
    assert!(validate_coinbase_tx(&real_reference, 1).is_err());

    // ID被篡改
    let mut tampered = Transaction::coinbase(alice(), 1);
    tampered.tx_outs[0].address = generate_keypair().1;
    assert_ne!(compute_id(&tampered), tampered.id);
    assert!(validate_coinbase_tx(&tampered, 1).is_err());
}

#[test]
fn test_empty_block_is_rejected() {
    assert!(matches!(
        validate_block_transactions(&[], &UtxoSet::new(), 0),
        Err(ValidationError::CoinbaseInvalid(_))
    ));
}

#[test]
fn test_block_with_coinbase_and_spend() {
    let snapshot = funded_snapshot();
    let (_, bob) = generate_keypair();
    let spend = build_transaction(&bob, 30, ALICE_KEY, &snapshot).unwrap();
    let block = vec![Transaction::coinbase(bob.clone(), 1), spend];

    assert_eq!(validate_block_transactions(&block, &snapshot, 1), Ok(()));
}

#[test]
fn test_double_spend_within_block() {
    let snapshot = funded_snapshot();
    let (_, bob) = generate_keypair();
    let (_, carol) = generate_keypair();
    let to_bob = build_transaction(&bob, 30, ALICE_KEY, &snapshot).unwrap();
    let to_carol = build_transaction(&carol, 10, ALICE_KEY, &snapshot).unwrap();

    let block = vec![Transaction::coinbase(bob.clone(), 1), to_bob, to_carol];
    assert_eq!(
        validate_block_transactions(&block, &snapshot, 1),
        Err(ValidationError::DuplicateInput(OutPoint::new("a", 0)))
    );
}

#[test]
fn test_same_transaction_twice_in_block() {
    let snapshot = funded_snapshot();
    let (_, bob) = generate_keypair();
    let spend = build_transaction(&bob, 30, ALICE_KEY, &snapshot).unwrap();

    let block = vec![Transaction::coinbase(bob.clone(), 2), spend.clone(), spend];
    assert!(matches!(
        validate_block_transactions(&block, &snapshot, 2),
        Err(ValidationError::DuplicateInput(_))
    ));
}

#[test]
fn test_invalid_normal_transaction_fails_block() {
    let snapshot = funded_snapshot();
    let (_, bob) = generate_keypair();
    let mut spend = build_transaction(&bob, 30, ALICE_KEY, &snapshot).unwrap();
    spend.tx_outs[1].amount += 1;

    let block = vec![Transaction::coinbase(bob.clone(), 1), spend];
    assert!(matches!(
        validate_block_transactions(&block, &snapshot, 1),
        Err(ValidationError::IdMismatch { .. })
    ));
}

#[test]
fn test_find_duplicate_input_uses_tuple_key() {
    // 字符串拼接下 "a1"+"0" 和 "a"+"10" 相同，按键比较时不重复
    let tx_ins = vec![TxIn::unsigned("a1", 0), TxIn::unsigned("a", 10)];
    assert_eq!(find_duplicate_input(&tx_ins), None);

    let tx_ins = vec![TxIn::unsigned("a", 0), TxIn::unsigned("b", 0), TxIn::unsigned("a", 0)];
    assert_eq!(find_duplicate_input(&tx_ins), Some(OutPoint::new("a", 0)));
}

#[test]
fn test_block_record() {
    let coinbase = Transaction::coinbase(alice(), 3);
    let block = Block::new(3, vec![coinbase.clone()]);

    assert_eq!(block.index, 3);
    assert_eq!(block.coinbase(), Some(&coinbase));
    assert!(block.timestamp > 0);
}
