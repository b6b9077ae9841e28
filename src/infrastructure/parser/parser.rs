use crate::errors::AppError;
use crate::infrastructure::parser::abi::{decode_uint256, topic_to_address};
use crate::infrastructure::parser::script::OutputScript;
use crate::infrastructure::protocol::constants::{ERC20_TRANSFER_TOPIC, PROOF_OF_STAKE_FLAG};
use crate::infrastructure::provider::ChainProvider;
use crate::infrastructure::provider::rpc_types::{RpcBlock, RpcReceipt, RpcTransaction};
use crate::models::{Block, DecodedEvent, EventLog, TokenTransfer, Transaction, TxStatus};
use crate::utils::{coin_to_satoshi, normalize_address, strip_hex_prefix};
use crate::{log_debug, log_warn};
use serde_json::json;
use std::sync::Arc;

/// 一个区块解码后的全部行，作为一个原子单元写库
#[derive(Debug, Clone)]
pub struct DecodedBlock {
    pub block: Block,
    pub transactions: Vec<Transaction>,
    pub event_logs: Vec<EventLog>,
    pub transfers: Vec<TokenTransfer>,
    /// 本区块中发出 Transfer 的合约，按首次出现顺序去重
    pub token_candidates: Vec<String>,
    /// 本区块创建的合约
    pub created_contracts: Vec<String>,
}

impl DecodedBlock {
    fn new(block: Block) -> Self {
        Self {
            block,
            transactions: Vec::new(),
            event_logs: Vec::new(),
            transfers: Vec::new(),
            token_candidates: Vec::new(),
            created_contracts: Vec::new(),
        }
    }

    pub fn height(&self) -> u64 {
        self.block.height
    }
}

pub struct BlockDecoder {
    provider: Arc<dyn ChainProvider>,
}

impl BlockDecoder {
    pub fn new(provider: Arc<dyn ChainProvider>) -> Self {
        Self { provider }
    }

    /// 解码区块；只有合约交易才会去拉回执
    pub async fn decode(&self, raw: &RpcBlock) -> Result<DecodedBlock, AppError> {
        let mut header = decode_block_header(raw);
        if let Some(miner) = header.miner.take() {
            header.miner = self.canonical_sender(miner).await;
        }
        let mut decoded = DecodedBlock::new(header);
        let mut next_log_index: u32 = 0;

        for (index, raw_tx) in raw.tx.iter().enumerate() {
            let outputs: Vec<OutputScript> = raw_tx
                .vout
                .iter()
                .map(|o| OutputScript::parse(&o.script_pub_key))
                .collect();

            let receipts = if outputs.iter().any(OutputScript::is_contract) {
                match self.provider.get_transaction_receipts(&raw_tx.txid).await? {
                    Some(r) => r,
                    None => {
                        log_debug!("交易 {} 没有回执，按无日志处理", raw_tx.txid);
                        Vec::new()
                    }
                }
            } else {
                Vec::new()
            };

            let mut tx = decode_transaction(raw_tx, &outputs, &receipts, index as u32, &decoded.block);
            if let Some(sender) = tx.from_address.take() {
                tx.from_address = self.canonical_sender(sender).await;
            }
            if let Some(contract) = tx.contract_address.as_ref() {
                decoded.created_contracts.push(contract.clone());
            }

            for receipt in &receipts {
                for raw_log in &receipt.log {
                    let mut log = EventLog {
                        tx_hash: tx.hash.clone(),
                        log_index: next_log_index,
                        address: normalize_address(&raw_log.address),
                        topics: raw_log.topics.iter().map(|t| t.to_ascii_lowercase()).collect(),
                        data: raw_log.data.to_ascii_lowercase(),
                        block_height: decoded.block.height,
                        timestamp: decoded.block.timestamp,
                        decoded: None,
                    };
                    next_log_index += 1;

                    if let Some(transfer) = decode_transfer(&log) {
                        log.decoded = Some(DecodedEvent {
                            name: "Transfer".to_string(),
                            args: json!({
                                "from": transfer.from_address,
                                "to": transfer.to_address,
                                "value": transfer.value,
                            }),
                        });
                        if !decoded.token_candidates.contains(&transfer.token_address) {
                            decoded.token_candidates.push(transfer.token_address.clone());
                        }
                        decoded.transfers.push(transfer);
                    }
                    decoded.event_logs.push(log);
                }
            }
            decoded.transactions.push(tx);
        }

        Ok(decoded)
    }

    /// base58 地址通过节点转成十六进制，转换失败时丢弃
    async fn canonical_sender(&self, sender: String) -> Option<String> {
        if sender.starts_with("0x") {
            return Some(sender);
        }
        match self.provider.get_hex_address(&sender).await {
            Ok(hex) => Some(normalize_address(&hex)),
            Err(e) => {
                log_warn!("地址 {} 无法转换为十六进制: {}", sender, e);
                None
            }
        }
    }
}

/// flags 含 proof-of-stake 即为 PoS 区块
pub fn is_proof_of_stake(flags: Option<&str>) -> bool {
    flags.is_some_and(|f| f.contains(PROOF_OF_STAKE_FLAG))
}

pub fn decode_block_header(raw: &RpcBlock) -> Block {
    let is_pos = is_proof_of_stake(raw.flags.as_deref());
    // PoW 奖励在 coinbase（第 0 笔），PoS 奖励在 coinstake（第 1 笔）
    let reward_tx = if is_pos { raw.tx.get(1) } else { raw.tx.first() };

    Block {
        height: raw.height,
        hash: raw.hash.clone(),
        parent_hash: raw.previous_hash.clone(),
        timestamp: raw.time,
        miner: reward_tx.and_then(miner_of),
        difficulty: raw.difficulty,
        tx_count: raw.tx.len() as u32,
        size: raw.size,
        nonce: raw.nonce,
        is_pos,
        reward: reward_tx.map(reward_of).unwrap_or(0).to_string(),
    }
}

/// 奖励交易中第一个能识别出地址的输出；优先 asm 里的 hash160，其次节点给的 base58
fn miner_of(tx: &RpcTransaction) -> Option<String> {
    tx.vout.iter().find_map(|o| match OutputScript::parse(&o.script_pub_key) {
        OutputScript::PubKeyHash { address } => Some(address),
        _ => o.script_pub_key.display_address().map(str::to_string),
    })
}

/// 输出总额减输入总额（satoshi）；coinstake 的输入金额缺失时无法计算，记为 0
fn reward_of(tx: &RpcTransaction) -> u64 {
    let outputs: u64 = tx.vout.iter().map(|o| coin_to_satoshi(o.value)).sum();
    let mut inputs: u64 = 0;
    for vin in tx.vin.iter().filter(|v| !v.is_coinbase()) {
        match vin.value {
            Some(v) => inputs += coin_to_satoshi(v),
            None => return 0,
        }
    }
    outputs.saturating_sub(inputs)
}

pub fn decode_transaction(
    raw: &RpcTransaction,
    outputs: &[OutputScript],
    receipts: &[RpcReceipt],
    tx_index: u32,
    block: &Block,
) -> Transaction {
    let first_output = raw.vout.first();
    let value = first_output
        .map(|o| coin_to_satoshi(o.value))
        .unwrap_or(0)
        .to_string();

    // 合约创建：created 地址来自对应输出的回执
    let create_n = raw
        .vout
        .iter()
        .zip(outputs)
        .find(|(_, s)| matches!(s, OutputScript::Create { .. }))
        .map(|(o, _)| o.n);
    let contract_address = create_n.and_then(|n| {
        receipts
            .iter()
            .find(|r| r.output_index == Some(n))
            .or_else(|| (receipts.len() == 1).then(|| &receipts[0]))
            .and_then(|r| r.contract_address.as_deref())
            .map(normalize_address)
    });

    let to_address = if create_n.is_some() {
        None
    } else {
        outputs.first().and_then(OutputScript::recipient).map(str::to_string)
    };

    let (gas_limit, gas_price) = outputs
        .iter()
        .find_map(|s| match s {
            OutputScript::Call { gas_limit, gas_price, .. }
            | OutputScript::Create { gas_limit, gas_price, .. } => Some((*gas_limit, *gas_price)),
            _ => None,
        })
        .unwrap_or((None, None));

    let input_data = outputs.iter().find_map(|s| match s {
        OutputScript::Call { data, .. } => Some(data.clone()),
        _ => None,
    });

    // 回执发送方优先，其次取第一个输入上报的地址
    let from_address = receipts
        .iter()
        .find_map(|r| r.from.as_deref())
        .map(normalize_address)
        .or_else(|| {
            raw.vin
                .iter()
                .find(|v| !v.is_coinbase())
                .and_then(|v| v.address.as_deref())
                .map(input_address)
        });

    let gas_used = receipts
        .iter()
        .filter_map(|r| r.gas_used)
        .reduce(|a, b| a.saturating_add(b));

    let status = if receipts
        .iter()
        .any(|r| TxStatus::from_excepted(r.excepted.as_deref()) == TxStatus::Failed)
    {
        TxStatus::Failed
    } else {
        TxStatus::Success
    };

    Transaction {
        hash: raw.txid.clone(),
        block_height: block.height,
        block_hash: block.hash.clone(),
        tx_index,
        from_address,
        to_address,
        value,
        gas_limit,
        gas_price,
        gas_used,
        input_data,
        status,
        contract_address,
        timestamp: block.timestamp,
    }
}

/// 输入地址通常是 base58；十六进制形式时统一格式
fn input_address(address: &str) -> String {
    let hex = strip_hex_prefix(address);
    if hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        normalize_address(hex)
    } else {
        address.to_string()
    }
}

/// topic0 为 Transfer 且至少 3 个 topic 时解出转账
pub fn decode_transfer(log: &EventLog) -> Option<TokenTransfer> {
    let topic0 = strip_hex_prefix(log.topic(0)?).to_ascii_lowercase();
    if topic0 != *ERC20_TRANSFER_TOPIC || log.topics.len() < 3 {
        return None;
    }
    let from = topic_to_address(&log.topics[1]);
    let to = topic_to_address(&log.topics[2]);
    let (from, to) = match (from, to) {
        (Ok(f), Ok(t)) => (f, t),
        (f, t) => {
            log_warn!(
                "交易 {} 日志 {} Transfer topic 格式异常: {:?} / {:?}",
                log.tx_hash,
                log.log_index,
                f.err(),
                t.err()
            );
            return None;
        }
    };

    Some(TokenTransfer {
        tx_hash: log.tx_hash.clone(),
        log_index: log.log_index,
        token_address: log.address.clone(),
        from_address: from,
        to_address: to,
        value: decode_uint256(&log.data),
        block_height: log.block_height,
        timestamp: log.timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::provider::rpc_types::{RpcInput, RpcOutput, RpcScriptPubKey};

    fn output(n: u32, value: f64, kind: &str, asm: &str) -> RpcOutput {
        RpcOutput {
            value,
            n,
            script_pub_key: RpcScriptPubKey {
                asm: asm.to_string(),
                script_type: kind.to_string(),
                ..Default::default()
            },
        }
    }

    fn p2pkh(n: u32, value: f64, hash: &str) -> RpcOutput {
        output(
            n,
            value,
            "pubkeyhash",
            &format!("OP_DUP OP_HASH160 {} OP_EQUALVERIFY OP_CHECKSIG", hash),
        )
    }

    fn header(flags: Option<&str>, tx: Vec<RpcTransaction>) -> RpcBlock {
        RpcBlock {
            hash: "b1".into(),
            height: 100,
            previous_hash: Some("b0".into()),
            time: 1_700_000_000,
            size: 900,
            nonce: 7,
            difficulty: 1.5,
            flags: flags.map(str::to_string),
            tx,
        }
    }

    fn transfer_log(address: &str) -> EventLog {
        EventLog {
            tx_hash: "t1".into(),
            log_index: 3,
            address: normalize_address(address),
            topics: vec![
                ERC20_TRANSFER_TOPIC.clone(),
                format!("{:0>64}", "aa".repeat(20)),
                format!("{:0>64}", "bb".repeat(20)),
            ],
            data: format!("{:064x}", 1000),
            block_height: 100,
            timestamp: 1_700_000_000,
            decoded: None,
        }
    }

    #[test]
    fn classifies_pos_from_flags() {
        assert!(is_proof_of_stake(Some("proof-of-stake")));
        assert!(is_proof_of_stake(Some("proof-of-stake stake-modifier")));
        assert!(!is_proof_of_stake(Some("proof-of-work")));
        assert!(!is_proof_of_stake(None));

        assert!(decode_block_header(&header(Some("proof-of-stake"), vec![])).is_pos);
        assert!(!decode_block_header(&header(Some("proof-of-work"), vec![])).is_pos);
    }

    #[test]
    fn pow_reward_and_miner_from_coinbase() {
        let coinbase = RpcTransaction {
            txid: "cb".into(),
            vin: vec![RpcInput {
                coinbase: Some("03".into()),
                ..Default::default()
            }],
            vout: vec![p2pkh(0, 4.0, &"cd".repeat(20))],
        };
        let block = decode_block_header(&header(Some("proof-of-work"), vec![coinbase]));
        assert_eq!(block.reward, "400000000");
        assert_eq!(block.miner, Some(format!("0x{}", "cd".repeat(20))));
        assert_eq!(block.tx_count, 1);
    }

    #[test]
    fn pos_reward_subtracts_staked_inputs() {
        let coinbase = RpcTransaction {
            txid: "cb".into(),
            vin: vec![RpcInput {
                coinbase: Some("03".into()),
                ..Default::default()
            }],
            vout: vec![output(0, 0.0, "nonstandard", "")],
        };
        let coinstake = RpcTransaction {
            txid: "cs".into(),
            vin: vec![RpcInput {
                txid: Some("prev".into()),
                value: Some(100.0),
                ..Default::default()
            }],
            vout: vec![
                output(0, 0.0, "nonstandard", ""),
                p2pkh(1, 104.0, &"ef".repeat(20)),
            ],
        };
        let block = decode_block_header(&header(Some("proof-of-stake"), vec![coinbase, coinstake]));
        assert_eq!(block.reward, "400000000");
        assert_eq!(block.miner, Some(format!("0x{}", "ef".repeat(20))));
    }

    #[test]
    fn decodes_plain_payment() {
        let block = decode_block_header(&header(None, vec![]));
        let raw = RpcTransaction {
            txid: "t1".into(),
            vin: vec![],
            vout: vec![p2pkh(0, 1.5, &"11".repeat(20)), p2pkh(1, 0.25, &"22".repeat(20))],
        };
        let outputs: Vec<_> = raw.vout.iter().map(|o| OutputScript::parse(&o.script_pub_key)).collect();
        let tx = decode_transaction(&raw, &outputs, &[], 2, &block);
        assert_eq!(tx.value, "150000000");
        assert_eq!(tx.to_address, Some(format!("0x{}", "11".repeat(20))));
        assert_eq!(tx.from_address, None);
        assert_eq!(tx.tx_index, 2);
        assert_eq!(tx.status, TxStatus::Success);
        assert!(!tx.is_contract_creation());
    }

    #[test]
    fn sender_falls_back_to_first_input_address() {
        let block = decode_block_header(&header(None, vec![]));
        let raw = RpcTransaction {
            txid: "t2".into(),
            vin: vec![RpcInput {
                txid: Some("prev".into()),
                vout: Some(0),
                address: Some("qUbxboqjBRp96j3La8D1RYkyqx5uQbJPoW".into()),
                value: Some(2.0),
                ..Default::default()
            }],
            vout: vec![p2pkh(0, 1.0, &"11".repeat(20))],
        };
        let outputs: Vec<_> = raw.vout.iter().map(|o| OutputScript::parse(&o.script_pub_key)).collect();
        let tx = decode_transaction(&raw, &outputs, &[], 1, &block);
        assert_eq!(tx.from_address.as_deref(), Some("qUbxboqjBRp96j3La8D1RYkyqx5uQbJPoW"));
    }

    #[test]
    fn decodes_contract_creation() {
        let block = decode_block_header(&header(None, vec![]));
        let raw = RpcTransaction {
            txid: "t2".into(),
            vin: vec![],
            vout: vec![output(0, 0.0, "create", "4 2500000 40 6060 OP_CREATE")],
        };
        let outputs: Vec<_> = raw.vout.iter().map(|o| OutputScript::parse(&o.script_pub_key)).collect();
        let receipts = vec![RpcReceipt {
            output_index: Some(0),
            from: Some("99".repeat(20)),
            gas_used: Some(120_000),
            contract_address: Some("AB".repeat(20)),
            excepted: Some("None".into()),
            ..Default::default()
        }];
        let tx = decode_transaction(&raw, &outputs, &receipts, 1, &block);
        assert!(tx.is_contract_creation());
        assert_eq!(tx.contract_address, Some(format!("0x{}", "ab".repeat(20))));
        assert_eq!(tx.from_address, Some(format!("0x{}", "99".repeat(20))));
        assert_eq!(tx.gas_limit, Some(2_500_000));
        assert_eq!(tx.gas_used, Some(120_000));
    }

    #[test]
    fn decodes_failed_contract_call() {
        let block = decode_block_header(&header(None, vec![]));
        let contract = "12".repeat(20);
        let raw = RpcTransaction {
            txid: "t3".into(),
            vin: vec![],
            vout: vec![output(0, 0.0, "call", &format!("4 250000 40 a9059cbb {} OP_CALL", contract))],
        };
        let outputs: Vec<_> = raw.vout.iter().map(|o| OutputScript::parse(&o.script_pub_key)).collect();
        let receipts = vec![RpcReceipt {
            excepted: Some("Revert".into()),
            contract_address: Some(contract.clone()),
            ..Default::default()
        }];
        let tx = decode_transaction(&raw, &outputs, &receipts, 1, &block);
        assert_eq!(tx.to_address, Some(format!("0x{}", contract)));
        assert_eq!(tx.input_data.as_deref(), Some("a9059cbb"));
        assert_eq!(tx.contract_address, None);
        assert_eq!(tx.status, TxStatus::Failed);
    }

    #[test]
    fn decodes_transfer_event() {
        let transfer = decode_transfer(&transfer_log(&"cc".repeat(20))).unwrap();
        assert_eq!(transfer.from_address, format!("0x{}", "aa".repeat(20)));
        assert_eq!(transfer.to_address, format!("0x{}", "bb".repeat(20)));
        assert_eq!(transfer.value, "1000");
        assert_eq!(transfer.token_address, format!("0x{}", "cc".repeat(20)));
        assert_eq!(transfer.log_index, 3);
    }

    #[test]
    fn transfer_topic_with_prefix_is_accepted() {
        let mut log = transfer_log(&"cc".repeat(20));
        log.topics[0] = format!("0x{}", log.topics[0]);
        assert!(decode_transfer(&log).is_some());
    }

    #[test]
    fn ignores_non_transfer_and_short_logs() {
        let mut approval = transfer_log(&"cc".repeat(20));
        approval.topics[0] = "8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925".into();
        assert!(decode_transfer(&approval).is_none());

        let mut short = transfer_log(&"cc".repeat(20));
        short.topics.truncate(2);
        assert!(decode_transfer(&short).is_none());
    }

    #[test]
    fn empty_transfer_data_is_zero() {
        let mut log = transfer_log(&"cc".repeat(20));
        log.data = String::new();
        assert_eq!(decode_transfer(&log).unwrap().value, "0");
    }

    #[test]
    fn malformed_log_fields_degrade_to_defaults() {
        let mut log = transfer_log(&format!("é{}", "c".repeat(39)));
        log.data = format!("{}é", "a".repeat(63));
        let transfer = decode_transfer(&log).unwrap();
        assert_eq!(transfer.value, "0");
        assert_eq!(transfer.token_address, format!("é{}", "c".repeat(39)));
    }
}
