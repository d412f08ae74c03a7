// ==========================================
// Экономика RFQ - маппер вариантов строк
// ==========================================
// Превращает денормализованную строку витрины (norm или base)
// в канонический LineOption. Сырой и нормализованный ключи
// выбора ведутся раздельно: группировка при отборе идёт по
// сырому ключу, нормализованный - только ярлык.
// ==========================================

use std::cmp::Ordering;

use crate::domain::line_option::{LineOption, RawOptionRow};
use crate::engine::normalize::normalize_currency_str;

/// Смаппить одну строку витрины в LineOption
///
/// # Возвращает
/// - Some(LineOption)
/// - None: строка без rfq_item_id непригодна
pub fn map_row(row: &RawOptionRow) -> Option<LineOption> {
    let rfq_item_id = row.rfq_item_id?;

    let raw_key = row
        .selection_key_raw
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let synthesized = format!("ITEM:{}", rfq_item_id);
    let selection_key_raw = raw_key.clone().unwrap_or_else(|| synthesized.clone());

    // Нормализованный ярлык: готовое поле витрины, иначе
    // "Строка {n}" при известном номере строки, иначе сырой
    // ключ, иначе синтетический ITEM:{id}
    let selection_key_norm = row
        .selection_key_norm
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| match row.line_no {
            Some(n) => format!("Строка {}", n),
            None => raw_key.unwrap_or(synthesized),
        });

    // fx_missing: явный флаг источника либо валюта со слэшем
    // ("USD/EUR" - смешанные валюты, не разрешено)
    let slash_currency = [
        row.landed_currency.as_deref(),
        row.goods_currency.as_deref(),
        row.logistics_currency.as_deref(),
    ]
    .iter()
    .any(|c| c.map(|s| s.contains('/')).unwrap_or(false));

    let fx_missing = row.fx_missing_flag.unwrap_or(0) != 0 || slash_currency;

    let goods_currency = row.goods_currency.as_deref().and_then(normalize_currency_str);
    let logistics_currency = row
        .logistics_currency
        .as_deref()
        .and_then(normalize_currency_str);
    let duty_currency = row.duty_currency.as_deref().and_then(normalize_currency_str);
    let mut landed_currency = row.landed_currency.as_deref().and_then(normalize_currency_str);

    // Вывод валюты landed как подсказки для отображения:
    // только при отсутствии явной валюты, без fx_missing и при
    // наличии самой суммы. В кросс-валютной арифметике такая
    // подсказка не участвует.
    if landed_currency.is_none() && !fx_missing && row.landed_amount.is_some() {
        landed_currency = goods_currency.clone().or_else(|| logistics_currency.clone());
    }

    Some(LineOption {
        rfq_item_id,
        response_line_id: row.response_line_id,
        supplier_id: row.supplier_id,
        route_id: row.route_id,
        line_no: row.line_no,
        selection_key_norm,
        selection_key_raw,
        supplier_name: row.supplier_name.clone(),
        route_name: row.route_name.clone(),
        goods_amount: row.goods_amount,
        goods_currency,
        logistics_amount: row.logistics_amount,
        logistics_currency,
        duty_amount: row.duty_amount,
        duty_currency,
        landed_amount: row.landed_amount,
        landed_currency,
        eta_days: row.eta_days,
        supplier_score: row.supplier_score,
        fx_missing,
    })
}

/// Смаппить и детерминированно отсортировать набор строк
pub fn map_rows(rows: &[RawOptionRow]) -> Vec<LineOption> {
    let mut options: Vec<LineOption> = rows.iter().filter_map(map_row).collect();
    sort_options(&mut options);
    options
}

/// Сортировка вариантов: номер строки по возрастанию (None в
/// конец), затем landed по возрастанию (None в конец), затем
/// имя поставщика (лексикографически, как хранится)
pub fn sort_options(options: &mut [LineOption]) {
    options.sort_by(compare_options);
}

fn compare_options(a: &LineOption, b: &LineOption) -> Ordering {
    match cmp_option_asc_none_last(a.line_no, b.line_no) {
        Ordering::Equal => {}
        other => return other,
    }

    match cmp_amount_asc_none_last(a.landed_amount, b.landed_amount) {
        Ordering::Equal => {}
        other => return other,
    }

    a.supplier_name
        .as_deref()
        .unwrap_or("")
        .cmp(b.supplier_name.as_deref().unwrap_or(""))
}

fn cmp_option_asc_none_last(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_amount_asc_none_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rfq_item_id: i64) -> RawOptionRow {
        RawOptionRow {
            rfq_item_id: Some(rfq_item_id),
            ..Default::default()
        }
    }

    #[test]
    fn test_norm_key_from_line_number() {
        let mut row = raw(1);
        row.line_no = Some(7);
        let option = map_row(&row).unwrap();
        assert_eq!(option.selection_key_norm, "Строка 7");
        assert_eq!(option.selection_key_raw, "ITEM:1");
    }

    #[test]
    fn test_norm_key_falls_back_to_raw_then_synthesized() {
        let mut row = raw(5);
        row.selection_key_raw = Some("POS-A".to_string());
        let option = map_row(&row).unwrap();
        assert_eq!(option.selection_key_norm, "POS-A");
        assert_eq!(option.selection_key_raw, "POS-A");

        let option = map_row(&raw(5)).unwrap();
        assert_eq!(option.selection_key_norm, "ITEM:5");
    }

    #[test]
    fn test_fx_missing_from_flag_and_slash_currency() {
        let mut row = raw(1);
        row.fx_missing_flag = Some(1);
        assert!(map_row(&row).unwrap().fx_missing);

        let mut row = raw(1);
        row.landed_currency = Some("USD/EUR".to_string());
        assert!(map_row(&row).unwrap().fx_missing);

        let mut row = raw(1);
        row.landed_currency = Some("USD".to_string());
        assert!(!map_row(&row).unwrap().fx_missing);
    }

    #[test]
    fn test_landed_currency_inferred_for_display_only() {
        let mut row = raw(1);
        row.landed_amount = Some(100.0);
        row.goods_currency = Some("usd".to_string());
        let option = map_row(&row).unwrap();
        assert_eq!(option.landed_currency, Some("USD".to_string()));

        // При fx_missing вывод валюты не делается
        let mut row = raw(1);
        row.landed_amount = Some(100.0);
        row.goods_currency = Some("usd".to_string());
        row.fx_missing_flag = Some(1);
        let option = map_row(&row).unwrap();
        assert_eq!(option.landed_currency, None);
        assert!(!option.comparable());
    }

    #[test]
    fn test_row_without_item_id_is_dropped() {
        assert!(map_row(&RawOptionRow::default()).is_none());
    }

    #[test]
    fn test_sort_order() {
        let mut a = raw(1);
        a.line_no = Some(2);
        a.landed_amount = Some(50.0);
        a.supplier_name = Some("Alpha".to_string());

        let mut b = raw(1);
        b.line_no = Some(1);
        b.landed_amount = Some(900.0);
        b.supplier_name = Some("Beta".to_string());

        let mut c = raw(1);
        c.line_no = Some(2);
        c.landed_amount = Some(10.0);
        c.supplier_name = Some("Gamma".to_string());

        let mut d = raw(1);
        d.line_no = None;
        d.landed_amount = Some(1.0);

        let options = map_rows(&[a, b, c, d]);
        let names: Vec<Option<i64>> = options.iter().map(|o| o.line_no).collect();
        assert_eq!(names, vec![Some(1), Some(2), Some(2), None]);
        // Внутри line_no=2 дешевле идёт первым
        assert_eq!(options[1].landed_amount, Some(10.0));
        assert_eq!(options[2].landed_amount, Some(50.0));
    }
}
