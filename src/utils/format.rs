use bigdecimal::BigDecimal;
use num_format::{Locale, ToFormattedString};
use std::str::FromStr;

/// 十进制字符串转 BigDecimal，非法输入按 0 处理
pub fn decimal_from_str(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap_or_else(|_| BigDecimal::from(0))
}

/// 整数部分的十进制字符串（不会输出科学计数法）
pub fn decimal_to_integer_string(value: &BigDecimal) -> String {
    let (int_val, _) = value.with_scale(0).into_bigint_and_exponent();
    int_val.to_string()
}

/// 按 10^decimals 做整数长除法，去掉小数部分末尾的 0
pub fn format_token_amount(amount: &str, decimals: u32) -> String {
    let digits = amount.trim().trim_start_matches('0');
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return "0".to_string();
    }
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits.to_string();
    }

    // 左侧补 0，保证整数部分至少一位
    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    }
}

/// 日志里展示的千分位数字
pub fn thousands(n: u64) -> String {
    n.to_formatted_string(&Locale::en)
}
