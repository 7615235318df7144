/// Format an integer with thousands separators: 1,234,567
pub fn count(val: i64) -> String {
    let digits = val.unsigned_abs().to_string();
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();
    if val < 0 {
        format!("-{with_commas}")
    } else {
        with_commas
    }
}

/// Signed percentage with two decimals: +12.50%, -3.00%, 0.00%
pub fn pct_change(val: f64) -> String {
    if val > 0.0 {
        format!("+{val:.2}%")
    } else if val < 0.0 {
        format!("{val:.2}%")
    } else {
        "0.00%".to_string()
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
