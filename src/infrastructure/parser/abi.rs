//! 不依赖合约 ABI 的最小解码：uint256、ABI 动态字符串、topic 地址。

use crate::errors::DecodeError;
use crate::utils::{normalize_address, strip_hex_prefix};
use ethers_core::types::U256;

const WORD: usize = 32;

/// 十六进制转 uint256（无符号），空串为 0，超过一个 word 时取第一个 word
pub fn parse_uint256(hex_str: &str) -> Result<U256, DecodeError> {
    let hex_str = strip_hex_prefix(hex_str.trim());
    if hex_str.is_empty() {
        return Ok(U256::zero());
    }
    // 先校验再按字节截取，非 ASCII 输入不能落在切分点上
    if !hex_str.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DecodeError::InvalidHex(hex_str.to_string()));
    }
    let word = hex_str.get(..WORD * 2).unwrap_or(hex_str);
    U256::from_str_radix(word, 16).map_err(|_| DecodeError::InvalidHex(word.to_string()))
}

/// uint256 的十进制字符串，解析失败降级为 "0"
pub fn decode_uint256(hex_str: &str) -> String {
    parse_uint256(hex_str)
        .map(|v| v.to_string())
        .unwrap_or_else(|_| "0".to_string())
}

/// ABI 动态字符串：offset word + length word + payload
pub fn parse_abi_string(hex_str: &str) -> Result<String, DecodeError> {
    let bytes = hex::decode(strip_hex_prefix(hex_str.trim()))
        .map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
    if bytes.len() < WORD * 2 {
        return Err(DecodeError::TooShort {
            need: WORD * 2,
            got: bytes.len(),
        });
    }
    let len_word = U256::from_big_endian(&bytes[WORD..WORD * 2]);
    if len_word > U256::from(bytes.len()) {
        return Err(DecodeError::Overflow(len_word.to_string()));
    }
    let len = len_word.as_usize();
    let payload = bytes
        .get(WORD * 2..WORD * 2 + len)
        .ok_or(DecodeError::TooShort {
            need: WORD * 2 + len,
            got: bytes.len(),
        })?;
    String::from_utf8(payload.to_vec())
        .map(|s| s.trim_end_matches('\0').to_string())
        .map_err(|_| DecodeError::InvalidUtf8)
}

/// 解析失败返回空字符串
pub fn decode_abi_string(hex_str: &str) -> String {
    parse_abi_string(hex_str).unwrap_or_default()
}

/// 32 字节 topic 的低 20 字节作为地址
pub fn topic_to_address(topic: &str) -> Result<String, DecodeError> {
    let hex_str = strip_hex_prefix(topic.trim());
    if hex_str.len() != WORD * 2 || !hex_str.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DecodeError::Shape(format!("not a 32-byte topic: {}", topic)));
    }
    Ok(normalize_address(hex_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abi_string(s: &str) -> String {
        let mut out = format!("{:064x}", 32);
        out.push_str(&format!("{:064x}", s.len()));
        let mut payload = hex::encode(s);
        while payload.len() % 64 != 0 || payload.is_empty() {
            payload.push('0');
        }
        out.push_str(&payload);
        out
    }

    #[test]
    fn uint256_decoding() {
        assert_eq!(decode_uint256(""), "0");
        assert_eq!(decode_uint256("0x"), "0");
        assert_eq!(decode_uint256(&format!("{:064x}", 1000)), "1000");
        assert_eq!(
            decode_uint256(&"f".repeat(64)),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
        assert_eq!(decode_uint256("zz"), "0");
    }

    #[test]
    fn uint256_takes_first_word_of_longer_payload() {
        let data = format!("{:064x}{:064x}", 5, 9);
        assert_eq!(decode_uint256(&data), "5");
    }

    #[test]
    fn non_ascii_payload_is_invalid_hex() {
        let cut_at_word = format!("{}é", "a".repeat(63));
        assert!(matches!(parse_uint256(&cut_at_word), Err(DecodeError::InvalidHex(_))));
        assert_eq!(decode_uint256(&cut_at_word), "0");
        assert_eq!(decode_uint256(&format!("{}é{}", "1".repeat(64), "2".repeat(10))), "0");

        let topic = format!("{}é", "0".repeat(62));
        assert!(topic_to_address(&topic).is_err());
    }

    #[test]
    fn abi_string_decoding() {
        assert_eq!(decode_abi_string(&abi_string("Qtum Token")), "Qtum Token");
        assert_eq!(decode_abi_string(&abi_string("QTK")), "QTK");
    }

    #[test]
    fn malformed_abi_string_is_empty() {
        assert_eq!(decode_abi_string(""), "");
        assert_eq!(decode_abi_string("0x1234"), "");
        assert_eq!(decode_abi_string("not hex"), "");
        // 长度字段超过实际数据
        let bogus = format!("{:064x}{:064x}", 32, 500);
        assert!(matches!(parse_abi_string(&bogus), Err(DecodeError::Overflow(_))));
    }

    #[test]
    fn topic_address_extraction() {
        let topic = format!("{:0>64}", "aa".repeat(20));
        assert_eq!(
            topic_to_address(&topic).unwrap(),
            format!("0x{}", "aa".repeat(20))
        );
        assert!(topic_to_address("0x1234").is_err());
    }
}
