// ==========================================
// Экономика RFQ - нормализация сумм и полей
// ==========================================
// Чистые функции без побочных эффектов. Гарантия: никогда не
// паникуют и не возвращают ошибок - некорректный вход
// превращается в None, валидация остаётся на вызывающем.
// ==========================================

use serde_json::Value;

/// Денежное округление: 4 знака, половина - от нуля
/// (банковское округление не используется)
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Привести значение к положительному целому
pub fn to_positive_integer(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else {
                let f = n.as_f64()?;
                if !f.is_finite() {
                    return None;
                }
                f.trunc() as i64
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                i
            } else {
                let f = to_decimal_or_null(value)?;
                f.trunc() as i64
            }
        }
        _ => return None,
    };

    if n > 0 {
        Some(n)
    } else {
        None
    }
}

/// Привести значение к непустой строке без краевых пробелов
pub fn to_trimmed_string_or_null(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Привести значение к десятичному числу
///
/// Строки принимаются и с точкой, и с запятой как
/// разделителем. Неконечные значения -> None.
pub fn to_decimal_or_null(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let normalized = s.trim().replace(',', ".");
            if normalized.is_empty() {
                return None;
            }
            normalized.parse::<f64>().ok()?
        }
        _ => return None,
    };

    if f.is_finite() {
        Some(f)
    } else {
        None
    }
}

/// Канонизировать код валюты: trim, верхний регистр, первые
/// три символа. Намеренно без сверки со списком ISO.
pub fn to_currency_code(value: &Value) -> Option<String> {
    let raw = to_trimmed_string_or_null(value)?;
    normalize_currency_str(&raw)
}

/// Канонизация кода валюты из готовой строки
pub fn normalize_currency_str(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_uppercase().chars().take(3).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round4_half_away_from_zero() {
        assert_eq!(round4(1.00005), 1.0001);
        assert_eq!(round4(-1.00005), -1.0001);
        assert_eq!(round4(550.0), 550.0);
        assert_eq!(round4(0.123456), 0.1235);
    }

    #[test]
    fn test_to_positive_integer() {
        assert_eq!(to_positive_integer(&json!(5)), Some(5));
        assert_eq!(to_positive_integer(&json!("7")), Some(7));
        assert_eq!(to_positive_integer(&json!(" 12 ")), Some(12));
        assert_eq!(to_positive_integer(&json!(3.9)), Some(3));
        assert_eq!(to_positive_integer(&json!(0)), None);
        assert_eq!(to_positive_integer(&json!(-4)), None);
        assert_eq!(to_positive_integer(&json!("abc")), None);
        assert_eq!(to_positive_integer(&json!(null)), None);
    }

    #[test]
    fn test_to_trimmed_string_or_null() {
        assert_eq!(
            to_trimmed_string_or_null(&json!("  x  ")),
            Some("x".to_string())
        );
        assert_eq!(to_trimmed_string_or_null(&json!("   ")), None);
        assert_eq!(to_trimmed_string_or_null(&json!(null)), None);
        assert_eq!(to_trimmed_string_or_null(&json!(10)), Some("10".to_string()));
    }

    #[test]
    fn test_to_decimal_accepts_comma_and_dot() {
        assert_eq!(to_decimal_or_null(&json!("1234,56")), Some(1234.56));
        assert_eq!(to_decimal_or_null(&json!("1234.56")), Some(1234.56));
        assert_eq!(to_decimal_or_null(&json!(9.5)), Some(9.5));
        assert_eq!(to_decimal_or_null(&json!("")), None);
        assert_eq!(to_decimal_or_null(&json!("abc")), None);
        assert_eq!(to_decimal_or_null(&json!(null)), None);
    }

    #[test]
    fn test_to_currency_code_permissive() {
        assert_eq!(to_currency_code(&json!(" usd ")), Some("USD".to_string()));
        assert_eq!(to_currency_code(&json!("eur")), Some("EUR".to_string()));
        // Не валидируем по ISO: обрезаем до 3 символов как есть
        assert_eq!(to_currency_code(&json!("rubles")), Some("RUB".to_string()));
        assert_eq!(to_currency_code(&json!("")), None);
        assert_eq!(to_currency_code(&json!(null)), None);
    }
}
