use utxo_wallet::transaction::{compute_id, Transaction, TxIn, TxOut, COINBASE_AMOUNT};

fn sample_transaction() -> Transaction {
    Transaction::new(
        vec![TxIn::unsigned("aa", 0), TxIn::unsigned("bb", 3)],
        vec![TxOut::new("addr1", 30), TxOut::new("addr2", 20)],
    )
}

#[test]
fn test_id_is_sha256_of_concatenated_fields() {
    let tx = sample_transaction();
    // sha256("aa0bb3addr130addr220")
    let expected = {
        use sha2::{Digest, Sha256};
        hex::encode(Sha256::digest(b"aa0bb3addr130addr220"))
    };
    assert_eq!(tx.id, expected);
    assert_eq!(tx.id.len(), 64);
}

#[test]
fn test_id_is_deterministic() {
    let a = sample_transaction();
    let b = sample_transaction();
    assert_eq!(a.id, b.id);
    assert_eq!(compute_id(&a), a.id);
}

#[test]
fn test_id_changes_with_any_field() {
    let base = sample_transaction();

    let mut changed = base.clone();
    changed.tx_outs[1].amount = 21;
    assert_ne!(compute_id(&changed), base.id);

    let mut changed = base.clone();
    changed.tx_ins[0].tx_out_index = 1;
    assert_ne!(compute_id(&changed), base.id);

    let mut changed = base.clone();
    changed.tx_outs[0].address = "addr3".to_string();
    assert_ne!(compute_id(&changed), base.id);
}

#[test]
fn test_id_depends_on_order() {
    let base = sample_transaction();

    let mut reordered = base.clone();
    reordered.tx_ins.reverse();
    assert_ne!(compute_id(&reordered), base.id);

    let mut reordered = base.clone();
    reordered.tx_outs.reverse();
    assert_ne!(compute_id(&reordered), base.id);
}

#[test]
fn test_signature_does_not_affect_id() {
    let mut tx = sample_transaction();
    tx.tx_ins[0].signature = "3045022100ff".to_string();
    assert!(tx.has_valid_id());
}

#[test]
fn test_coinbase_transaction() {
    let tx = Transaction::coinbase("miner", 7);

    assert_eq!(tx.tx_ins.len(), 1);
    assert_eq!(tx.tx_ins[0].tx_out_id, "");
    assert_eq!(tx.tx_ins[0].tx_out_index, 7);
    assert_eq!(tx.tx_ins[0].signature, "");
    assert_eq!(tx.tx_outs, vec![TxOut::new("miner", COINBASE_AMOUNT)]);
    assert!(tx.has_valid_id());
}

#[test]
fn test_json_uses_camel_case_fields() {
    let tx = sample_transaction();
    let json = serde_json::to_value(&tx).unwrap();

    assert!(json.get("txIns").is_some());
    assert!(json.get("txOuts").is_some());
    assert_eq!(json["txIns"][1]["txOutId"], "bb");
    assert_eq!(json["txIns"][1]["txOutIndex"], 3);
    assert_eq!(json["txOuts"][0]["amount"], 30);

    let parsed: Transaction = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, tx);
}
