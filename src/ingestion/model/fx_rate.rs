use rbatis::rbdc::db::ExecResult;
use rbatis::RBatis;
use rbs::Value;
use serde::{Deserialize, Serialize};

use crate::error::app_error::IngestError;

/// 原始汇率表名，编译期常量，不走配置
pub const TABLE_NAME: &str = "raw_fx_rates";

/// table
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct RawFxRateEntity {
    pub base_currency: String,  // 基准货币，单次运行内固定
    pub quote_currency: String, // 报价货币
    pub rate: f64,              // 1 单位基准货币折算报价货币的价格，必须为正
    pub rate_date: String,      // 快照日期 YYYY-MM-DD，逻辑日期而非入库时间
}

impl RawFxRateEntity {
    /// 自然键 (base, quote, date)
    pub fn natural_key(&self) -> (String, String, String) {
        (
            self.base_currency.clone(),
            self.quote_currency.clone(),
            self.rate_date.clone(),
        )
    }
}

pub struct FxRateModel<'a> {
    db: &'a RBatis,
}

impl<'a> FxRateModel<'a> {
    pub fn new(db: &'a RBatis) -> Self {
        Self { db }
    }

    /// 建表。唯一键 uk_fx_rate 就是自然键 (base, quote, date)，
    /// INSERT IGNORE 的冲突跳过依赖这个约束
    pub async fn create_table(&self) -> Result<ExecResult, IngestError> {
        let create_table_sql = format!(
            "CREATE TABLE IF NOT EXISTS `{}` (
            `id` int NOT NULL AUTO_INCREMENT,
            `base_currency` varchar(8) NOT NULL COMMENT '基准货币',
            `quote_currency` varchar(8) NOT NULL COMMENT '报价货币',
            `rate` double NOT NULL COMMENT '汇率，必须为正',
            `rate_date` varchar(10) NOT NULL COMMENT '快照日期 YYYY-MM-DD',
            `created_at` datetime NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (`id`),
            UNIQUE KEY `uk_fx_rate` (`base_currency`,`quote_currency`,`rate_date`)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_0900_ai_ci;",
            TABLE_NAME
        );
        let res = self.db.exec(&create_table_sql, vec![]).await?;
        Ok(res)
    }

    /// 查询某基准货币已入库的最大快照日期，空表返回 None。
    /// rate_date 是 ISO 格式字符串，MAX 的字典序即时间序
    pub async fn max_rate_date(&self, base_currency: &str) -> Result<Option<String>, IngestError> {
        let query = format!(
            "select max(rate_date) as max_date from {} where base_currency = ?",
            TABLE_NAME
        );
        let res: Value = self
            .db
            .query(&query, vec![Value::String(base_currency.to_string())])
            .await?;

        // rbs::Value -> serde_json::Value，行集转 JSON 再取字段
        let json_value: serde_json::Value = serde_json::from_str(&res.to_string())
            .map_err(|e| IngestError::Storage(e.to_string()))?;
        let max_date = json_value
            .get(0)
            .and_then(|row| row.get("max_date"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        Ok(max_date)
    }

    /// 批量写入，整批一个事务。
    /// INSERT IGNORE：自然键冲突的行静默丢弃，其余行全部提交；
    /// 其他任何错误整批回滚，不会出现半批落库。
    /// 注意 IGNORE 还会把截断、NOT NULL 之类的错误降级成告警，
    /// 这里依赖两点前提：写入前已整批校验过，货币代码不会超出 varchar(8)。
    /// 改表结构时需要重新核对这两点
    pub async fn insert_skip_conflicts(
        &self,
        rows: &[RawFxRateEntity],
    ) -> Result<u64, IngestError> {
        if rows.is_empty() {
            return Ok(0);
        }

        // 构建批量插入的 SQL 语句
        let mut query = format!(
            "INSERT IGNORE INTO {} (base_currency, quote_currency, rate, rate_date) VALUES ",
            TABLE_NAME
        );
        let mut params: Vec<Value> = Vec::new();
        for row in rows {
            query.push_str("(?, ?, ?, ?),");
            params.push(row.base_currency.clone().into());
            params.push(row.quote_currency.clone().into());
            params.push(row.rate.into());
            params.push(row.rate_date.clone().into());
        }
        // 移除最后一个逗号
        query.pop();

        let mut tx = self.db.acquire_begin().await?;
        match tx.exec(&query, params).await {
            Ok(res) => {
                tx.commit().await?;
                Ok(res.rows_affected)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(IngestError::Storage(e.to_string()))
            }
        }
    }
}
