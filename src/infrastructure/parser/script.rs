//! 输出脚本 asm 解析：合约调用/创建、P2PKH。
//!
//! call:   `[<sender prefix> OP_SENDER] <version> <gas_limit> <gas_price> <data> <contract> OP_CALL`
//! create: `[<sender prefix> OP_SENDER] <version> <gas_limit> <gas_price> <bytecode> OP_CREATE`

use crate::infrastructure::protocol::constants::{
    SCRIPT_TYPE_CALL, SCRIPT_TYPE_CALL_SENDER, SCRIPT_TYPE_CREATE, SCRIPT_TYPE_CREATE_SENDER,
    SCRIPT_TYPE_PUBKEYHASH,
};
use crate::infrastructure::provider::rpc_types::RpcScriptPubKey;
use crate::utils::normalize_address;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputScript {
    Create {
        gas_limit: Option<u64>,
        gas_price: Option<u64>,
        bytecode: String,
    },
    Call {
        gas_limit: Option<u64>,
        gas_price: Option<u64>,
        data: String,
        contract: String,
    },
    /// 可直接取出 hash160 的输出
    PubKeyHash { address: String },
    Other,
}

impl OutputScript {
    pub fn parse(script: &RpcScriptPubKey) -> Self {
        let tokens: Vec<&str> = script.asm.split_whitespace().collect();
        match script.script_type.as_str() {
            SCRIPT_TYPE_CALL | SCRIPT_TYPE_CALL_SENDER => parse_call(&tokens),
            SCRIPT_TYPE_CREATE | SCRIPT_TYPE_CREATE_SENDER => parse_create(&tokens),
            SCRIPT_TYPE_PUBKEYHASH => parse_pubkeyhash(&tokens),
            _ => OutputScript::Other,
        }
    }

    pub fn is_contract(&self) -> bool {
        matches!(self, OutputScript::Create { .. } | OutputScript::Call { .. })
    }

    /// 作为交易 to 字段使用的地址
    pub fn recipient(&self) -> Option<&str> {
        match self {
            OutputScript::Call { contract, .. } => Some(contract),
            OutputScript::PubKeyHash { address } => Some(address),
            _ => None,
        }
    }
}

/// asm 中 4 字节以内的数字按十进制输出
fn parse_num(token: &str) -> Option<u64> {
    token.parse::<u64>().ok()
}

fn parse_call(tokens: &[&str]) -> OutputScript {
    match tokens {
        [.., _version, gas_limit, gas_price, data, contract, "OP_CALL"] => OutputScript::Call {
            gas_limit: parse_num(gas_limit),
            gas_price: parse_num(gas_price),
            data: data.to_ascii_lowercase(),
            contract: normalize_address(contract),
        },
        _ => OutputScript::Other,
    }
}

fn parse_create(tokens: &[&str]) -> OutputScript {
    match tokens {
        [.., _version, gas_limit, gas_price, bytecode, "OP_CREATE"] => OutputScript::Create {
            gas_limit: parse_num(gas_limit),
            gas_price: parse_num(gas_price),
            bytecode: bytecode.to_ascii_lowercase(),
        },
        _ => OutputScript::Other,
    }
}

fn parse_pubkeyhash(tokens: &[&str]) -> OutputScript {
    match tokens {
        ["OP_DUP", "OP_HASH160", hash, "OP_EQUALVERIFY", "OP_CHECKSIG"] if hash.len() == 40 => {
            OutputScript::PubKeyHash {
                address: normalize_address(hash),
            }
        }
        _ => OutputScript::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(kind: &str, asm: &str) -> RpcScriptPubKey {
        RpcScriptPubKey {
            asm: asm.to_string(),
            script_type: kind.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn parses_call_output() {
        let contract = "f2033ede578e17fa6231047265010445bca8cf1c";
        let parsed = OutputScript::parse(&script(
            "call",
            &format!("4 250000 40 a9059cbb00 {} OP_CALL", contract),
        ));
        assert_eq!(
            parsed,
            OutputScript::Call {
                gas_limit: Some(250000),
                gas_price: Some(40),
                data: "a9059cbb00".into(),
                contract: format!("0x{}", contract),
            }
        );
        assert_eq!(parsed.recipient(), Some(format!("0x{}", contract).as_str()));
    }

    #[test]
    fn parses_call_with_sender_prefix() {
        let parsed = OutputScript::parse(&script(
            "call_sender",
            "1 aabb ccdd OP_SENDER 4 100000 40 00 1111111111111111111111111111111111111111 OP_CALL",
        ));
        assert!(matches!(parsed, OutputScript::Call { gas_limit: Some(100000), .. }));
    }

    #[test]
    fn parses_create_output() {
        let parsed = OutputScript::parse(&script("create", "4 2500000 40 6060604052 OP_CREATE"));
        assert_eq!(
            parsed,
            OutputScript::Create {
                gas_limit: Some(2500000),
                gas_price: Some(40),
                bytecode: "6060604052".into(),
            }
        );
        assert!(parsed.is_contract());
        assert_eq!(parsed.recipient(), None);
    }

    #[test]
    fn parses_pubkeyhash_output() {
        let hash = "AB".repeat(20);
        let parsed = OutputScript::parse(&script(
            "pubkeyhash",
            &format!("OP_DUP OP_HASH160 {} OP_EQUALVERIFY OP_CHECKSIG", hash),
        ));
        assert_eq!(
            parsed,
            OutputScript::PubKeyHash {
                address: format!("0x{}", "ab".repeat(20))
            }
        );
    }

    #[test]
    fn malformed_scripts_are_other() {
        assert_eq!(OutputScript::parse(&script("call", "OP_CALL")), OutputScript::Other);
        assert_eq!(OutputScript::parse(&script("pubkey", "02ab OP_CHECKSIG")), OutputScript::Other);
    }
}
