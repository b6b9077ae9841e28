use crate::errors::{AppError, DecodeError};
use ethers_core::types::{H160, H256};

/// u64 转 i64（SQLite 整数列），溢出时报错
pub fn to_i64(value: u64, field: &str) -> Result<i64, AppError> {
    i64::try_from(value)
        .map_err(|e| AppError::Conversion(format!("{}: u64({}) 转 i64 溢出: {}", field, value, e)))
}

pub fn opt_to_i64(value: Option<u64>, field: &str) -> Result<Option<i64>, AppError> {
    value.map(|v| to_i64(v, field)).transpose()
}

/// 去掉 0x 前缀
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// 严格解析十六进制地址；超过 40 位时取低 20 字节（例如 32 字节补齐的 topic）
pub fn parse_address(raw: &str) -> Result<H160, DecodeError> {
    let hex_str = strip_hex_prefix(raw.trim());
    if hex_str.is_empty() || hex_str.len() > 64 || !hex_str.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DecodeError::InvalidHex(raw.to_string()));
    }
    let word = hex::decode(format!("{:0>64}", hex_str))
        .map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
    Ok(H160::from(H256::from_slice(&word)))
}

/// 统一地址格式：0x + 40 位小写十六进制；不是十六进制时原样小写返回
pub fn normalize_address(raw: &str) -> String {
    match parse_address(raw) {
        Ok(address) => format!("{:#x}", address),
        Err(_) => raw.trim().to_ascii_lowercase(),
    }
}

/// 节点返回的 QTUM 金额（浮点）转 satoshi
pub fn coin_to_satoshi(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value * 100_000_000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_addresses() {
        assert_eq!(
            normalize_address("ABCDEF0123456789ABCDEF0123456789ABCDEF01"),
            "0xabcdef0123456789abcdef0123456789abcdef01"
        );
        assert_eq!(
            normalize_address("0x000000000000000000000000aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
            "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
        );
        assert_eq!(normalize_address("0x1"), "0x0000000000000000000000000000000000000001");
    }

    #[test]
    fn non_hex_addresses_do_not_panic() {
        let accented = format!("é{}", "a".repeat(39));
        assert!(matches!(parse_address(&accented), Err(DecodeError::InvalidHex(_))));
        assert_eq!(normalize_address(&accented), accented);

        let long = format!("{}é{}", "b".repeat(30), "c".repeat(39));
        assert!(parse_address(&long).is_err());
        assert_eq!(normalize_address(&long), long);

        assert!(parse_address("").is_err());
        assert!(parse_address(&"a".repeat(65)).is_err());
    }

    #[test]
    fn converts_coin_amounts() {
        assert_eq!(coin_to_satoshi(4.0), 400_000_000);
        assert_eq!(coin_to_satoshi(0.00000001), 1);
        assert_eq!(coin_to_satoshi(-1.0), 0);
        assert_eq!(coin_to_satoshi(f64::NAN), 0);
    }

    #[test]
    fn rejects_overflowing_heights() {
        assert!(to_i64(u64::MAX, "height").is_err());
        assert_eq!(opt_to_i64(Some(7), "gas").unwrap(), Some(7));
        assert_eq!(opt_to_i64(None, "gas").unwrap(), None);
    }
}
