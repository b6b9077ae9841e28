use crate::database::{DbService, TransactionExecutor};
use crate::errors::{AppError, DecodeError};
use crate::log_warn;
use crate::models::{DecodedEvent, EventLog};
use crate::repositories::{ContractRepository, Repository};
use crate::utils::{normalize_address, strip_hex_prefix};
use ethers_core::abi::{Abi, RawLog, Token};
use ethers_core::types::{H256, I256};
use futures_util::FutureExt;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 用已验证合约的 ABI 给事件日志补上 decoded_name / decoded_args。
///
/// 只缓存解析成功的 ABI；验证记录可能随时写入，未命中的地址每次都查库。
pub struct EventDecoder {
    db: Arc<DbService>,
    contracts: ContractRepository,
    abis: Mutex<HashMap<String, Arc<Abi>>>,
}

impl EventDecoder {
    pub fn new(db: Arc<DbService>) -> Self {
        Self {
            db,
            contracts: ContractRepository::new(),
            abis: Mutex::new(HashMap::new()),
        }
    }

    /// 有 ABI 时覆盖默认解码结果；解码失败保持原样
    pub async fn annotate(&self, logs: &mut [EventLog]) -> Result<(), AppError> {
        for log in logs.iter_mut() {
            let Some(abi) = self.abi_for(&log.address).await? else {
                continue;
            };
            match decode_with_abi(&abi, log) {
                Ok(Some(event)) => log.decoded = Some(event),
                Ok(None) => {}
                Err(e) => log_warn!(
                    "交易 {} 日志 {} 按 ABI 解码失败: {}",
                    log.tx_hash,
                    log.log_index,
                    e
                ),
            }
        }
        Ok(())
    }

    async fn abi_for(&self, address: &str) -> Result<Option<Arc<Abi>>, AppError> {
        let cached = self.cache()?.get(address).cloned();
        if cached.is_some() {
            return Ok(cached);
        }

        let contracts = self.contracts;
        let key = address.to_string();
        let row = self
            .db
            .with_conn(move |conn| async move { contracts.find_by_id(conn, key).await }.boxed())
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        match serde_json::from_str::<Abi>(&row.abi) {
            Ok(abi) => {
                let abi = Arc::new(abi);
                self.cache()?.insert(address.to_string(), abi.clone());
                Ok(Some(abi))
            }
            Err(e) => {
                log_warn!("合约 {} 的 ABI 无法解析: {}", address, e);
                Ok(None)
            }
        }
    }

    fn cache(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Arc<Abi>>>, AppError> {
        self.abis
            .lock()
            .map_err(|_| AppError::Internal("ABI 缓存锁已损坏".to_string()))
    }
}

/// 按 topic0 匹配 ABI 中的非匿名事件并解析参数
pub fn decode_with_abi(abi: &Abi, log: &EventLog) -> Result<Option<DecodedEvent>, DecodeError> {
    let Some(topic0) = log.topic(0) else {
        return Ok(None);
    };
    let topic0 = parse_h256(topic0)?;
    let Some(event) = abi
        .events()
        .find(|e| !e.anonymous && e.signature() == topic0)
    else {
        return Ok(None);
    };

    let topics = log
        .topics
        .iter()
        .map(|t| parse_h256(t))
        .collect::<Result<Vec<_>, _>>()?;
    let data = hex::decode(strip_hex_prefix(&log.data))
        .map_err(|e| DecodeError::InvalidHex(e.to_string()))?;

    let parsed = event
        .parse_log(RawLog { topics, data })
        .map_err(|e| DecodeError::Shape(format!("{}: {}", event.name, e)))?;

    let mut args = Map::new();
    for param in parsed.params {
        args.insert(param.name, token_to_json(param.value));
    }
    Ok(Some(DecodedEvent {
        name: event.name.clone(),
        args: Value::Object(args),
    }))
}

fn parse_h256(topic: &str) -> Result<H256, DecodeError> {
    let bytes = hex::decode(strip_hex_prefix(topic))
        .map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(DecodeError::TooShort {
            need: 32,
            got: bytes.len(),
        });
    }
    Ok(H256::from_slice(&bytes))
}

/// 整数一律输出十进制字符串，避免 JSON 数字精度丢失
fn token_to_json(token: Token) -> Value {
    match token {
        Token::Address(a) => Value::String(normalize_address(&hex::encode(a.as_bytes()))),
        Token::Uint(v) => Value::String(v.to_string()),
        Token::Int(v) => Value::String(I256::from_raw(v).to_string()),
        Token::Bool(b) => Value::Bool(b),
        Token::String(s) => Value::String(s),
        Token::Bytes(b) | Token::FixedBytes(b) => Value::String(format!("0x{}", hex::encode(b))),
        Token::Array(items) | Token::FixedArray(items) | Token::Tuple(items) => {
            Value::Array(items.into_iter().map(token_to_json).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const APPROVAL_ABI: &str = r#"[{
        "anonymous": false,
        "type": "event",
        "name": "Approval",
        "inputs": [
            {"indexed": true, "name": "owner", "type": "address"},
            {"indexed": true, "name": "spender", "type": "address"},
            {"indexed": false, "name": "value", "type": "uint256"}
        ]
    }]"#;

    fn approval_log() -> EventLog {
        let topic0 = hex::encode(ethers_core::utils::keccak256(
            "Approval(address,address,uint256)",
        ));
        EventLog {
            tx_hash: "t1".into(),
            log_index: 0,
            address: format!("0x{}", "cc".repeat(20)),
            topics: vec![
                topic0,
                format!("{:0>64}", "aa".repeat(20)),
                format!("{:0>64}", "bb".repeat(20)),
            ],
            data: format!("{:064x}", 42),
            block_height: 1,
            timestamp: 0,
            decoded: None,
        }
    }

    #[test]
    fn decodes_event_from_abi() {
        let abi: Abi = serde_json::from_str(APPROVAL_ABI).unwrap();
        let event = decode_with_abi(&abi, &approval_log()).unwrap().unwrap();
        assert_eq!(event.name, "Approval");
        assert_eq!(
            event.args,
            json!({
                "owner": format!("0x{}", "aa".repeat(20)),
                "spender": format!("0x{}", "bb".repeat(20)),
                "value": "42",
            })
        );
    }

    #[test]
    fn unknown_topic_is_left_alone() {
        let abi: Abi = serde_json::from_str(APPROVAL_ABI).unwrap();
        let mut log = approval_log();
        log.topics[0] = "11".repeat(32);
        assert_eq!(decode_with_abi(&abi, &log).unwrap(), None);
    }

    #[test]
    fn truncated_data_is_an_error() {
        let abi: Abi = serde_json::from_str(APPROVAL_ABI).unwrap();
        let mut log = approval_log();
        log.data = "zz".into();
        assert!(decode_with_abi(&abi, &log).is_err());
    }

    #[test]
    fn signed_ints_render_negative() {
        let minus_one = ethers_core::types::U256::MAX;
        assert_eq!(token_to_json(Token::Int(minus_one)), json!("-1"));
    }
}
