use std::collections::HashSet;

use chrono::Local;
use rbatis::RBatis;
use tracing::info;

use crate::error::app_error::IngestError;
use crate::ingestion::erapi;
use crate::ingestion::model::fx_rate::{FxRateModel, RawFxRateEntity};

/// 单次摄取的结果
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// 当天快照已入库，整条流水线短路，属正常结束而非错误
    Skipped { rate_date: String },
    /// 成功落库，rows 为实际写入行数（键冲突被跳过的行不计入）
    Loaded { rate_date: String, rows: u64 },
}

/// 摊平后的待校验行，rate 仍可能为空
#[derive(Debug, Clone)]
pub struct PendingRow {
    pub base_currency: String,
    pub quote_currency: String,
    pub rate: Option<f64>,
    pub rate_date: String,
}

/// 把汇率映射摊平成行，基准货币固定
pub fn build_rows(pairs: &[(String, Option<f64>)], rate_date: &str) -> Vec<PendingRow> {
    pairs
        .iter()
        .map(|(code, rate)| PendingRow {
            base_currency: erapi::BASE_CURRENCY.to_string(),
            quote_currency: code.clone(),
            rate: *rate,
            rate_date: rate_date.to_string(),
        })
        .collect()
}

/// 校验并去重，整批通过或整批拒绝，没有部分成功：
/// 1. 任何一行 rate 为空 -> 整批拒绝
/// 2. 任何一行 rate <= 0 -> 整批拒绝
/// 3. 批内自然键重复的行只保留首次出现（上游脏数据防御，不报错）
pub fn validate_rows(rows: Vec<PendingRow>) -> Result<Vec<RawFxRateEntity>, IngestError> {
    if rows.iter().any(|r| r.rate.is_none()) {
        return Err(IngestError::Validation("null rate detected".to_string()));
    }
    if rows
        .iter()
        .any(|r| matches!(r.rate, Some(v) if v <= 0.0))
    {
        return Err(IngestError::Validation("invalid rate detected".to_string()));
    }

    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut batch: Vec<RawFxRateEntity> = Vec::with_capacity(rows.len());
    for row in rows {
        // 上面已整批查过空值，这里若再遇到空值同样整批拒绝，绝不静默丢行
        let rate = match row.rate {
            Some(v) => v,
            None => return Err(IngestError::Validation("null rate detected".to_string())),
        };
        let entity = RawFxRateEntity {
            base_currency: row.base_currency,
            quote_currency: row.quote_currency,
            rate,
            rate_date: row.rate_date,
        };
        if seen.insert(entity.natural_key()) {
            batch.push(entity);
        }
    }
    Ok(batch)
}

/// 汇率摄取主流程：新鲜度检查 -> 拉取 -> 组行校验 -> 幂等落库。
/// 当天已有快照时直接短路，连 HTTP 请求都不会发出
pub async fn run_ingest(db: &RBatis) -> Result<IngestOutcome, IngestError> {
    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    info!("汇率摄取开始, base={}, 今日={}", erapi::BASE_CURRENCY, today);

    let model = FxRateModel::new(db);
    model.create_table().await?;

    // 新鲜度检查：同一天重复调度直接跳过，一天只留一份快照。
    // 并发运行的兜底不在这里，而在存储层的键冲突跳过
    if let Some(max_date) = model.max_rate_date(erapi::BASE_CURRENCY).await? {
        if max_date == today {
            info!("今日 {} 快照已入库, 跳过本次运行", today);
            return Ok(IngestOutcome::Skipped { rate_date: today });
        }
    }

    let snapshot = erapi::get_latest_rates().await?;
    let rate_date = snapshot.rate_date.format("%Y-%m-%d").to_string();

    let rows = build_rows(&snapshot.pairs, &rate_date);
    let batch = validate_rows(rows)?;
    info!("校验通过, 待写入 {} 行", batch.len());

    let rows_affected = model.insert_skip_conflicts(&batch).await?;
    info!("✅ FX rates ingested for {}, rows={}", rate_date, rows_affected);

    Ok(IngestOutcome::Loaded {
        rate_date,
        rows: rows_affected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, Option<f64>)]) -> Vec<(String, Option<f64>)> {
        items
            .iter()
            .map(|(code, rate)| (code.to_string(), *rate))
            .collect()
    }

    #[test]
    fn test_build_rows_fixed_base_and_date() {
        let rows = build_rows(&pairs(&[("EUR", Some(0.91)), ("GBP", Some(0.78))]), "2026-08-30");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.base_currency == "USD"));
        assert!(rows.iter().all(|r| r.rate_date == "2026-08-30"));
        assert_eq!(rows[0].quote_currency, "EUR");
        assert_eq!(rows[1].quote_currency, "GBP");
    }

    #[test]
    fn test_null_rate_rejects_whole_batch() {
        let rows = build_rows(
            &pairs(&[("EUR", Some(0.91)), ("GBP", None), ("JPY", Some(147.2))]),
            "2026-08-30",
        );
        let err = validate_rows(rows).unwrap_err();
        match err {
            IngestError::Validation(msg) => assert!(msg.contains("null rate")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_positive_rate_rejects_whole_batch() {
        for bad in [0.0, -1.5] {
            let rows = build_rows(&pairs(&[("EUR", Some(0.91)), ("XXX", Some(bad))]), "2026-08-30");
            let err = validate_rows(rows).unwrap_err();
            match err {
                IngestError::Validation(msg) => assert!(msg.contains("invalid rate")),
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_null_check_reported_before_positivity() {
        // 同批里既有 null 又有非正数时，先报 null
        let rows = build_rows(&pairs(&[("EUR", Some(-1.0)), ("GBP", None)]), "2026-08-30");
        match validate_rows(rows).unwrap_err() {
            IngestError::Validation(msg) => assert!(msg.contains("null rate")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let rows = build_rows(
            &pairs(&[("EUR", Some(0.91)), ("GBP", Some(0.78)), ("EUR", Some(0.92))]),
            "2026-08-30",
        );
        let batch = validate_rows(rows).unwrap();
        assert_eq!(batch.len(), 2);
        let eur: Vec<_> = batch.iter().filter(|r| r.quote_currency == "EUR").collect();
        assert_eq!(eur.len(), 1);
        assert_eq!(eur[0].rate, 0.91);
    }

    #[test]
    fn test_valid_batch_passes_unchanged() {
        let rows = build_rows(&pairs(&[("EUR", Some(0.91)), ("GBP", Some(0.78))]), "2026-08-30");
        let batch = validate_rows(rows).unwrap();
        assert_eq!(
            batch,
            vec![
                RawFxRateEntity {
                    base_currency: "USD".to_string(),
                    quote_currency: "EUR".to_string(),
                    rate: 0.91,
                    rate_date: "2026-08-30".to_string(),
                },
                RawFxRateEntity {
                    base_currency: "USD".to_string(),
                    quote_currency: "GBP".to_string(),
                    rate: 0.78,
                    rate_date: "2026-08-30".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_empty_batch_is_valid() {
        let batch = validate_rows(Vec::new()).unwrap();
        assert!(batch.is_empty());
    }
}
