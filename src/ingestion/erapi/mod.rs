use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::app_error::IngestError;

/// 汇率接口地址，免鉴权，基准货币固定在路径里
pub const API_URL: &str = "https://open.er-api.com/v6/latest/USD";
/// 固定基准货币
pub const BASE_CURRENCY: &str = "USD";

/// 接口返回的信封结构
#[derive(Serialize, Deserialize, Debug)]
pub struct LatestRatesResponse {
    /// 状态标识，成功时为 "success"
    pub result: String,
    /// 货币代码 -> 汇率，坏数据可能出现 null
    #[serde(default)]
    pub rates: Option<HashMap<String, Option<f64>>>,
}

/// 一次拉取的快照：报价货币与汇率的列表，以及打点的本地日历日期
#[derive(Debug)]
pub struct RateSnapshot {
    pub pairs: Vec<(String, Option<f64>)>,
    pub rate_date: NaiveDate,
}

/// 解析响应体。result 非 success 时把响应体原样带回错误，方便排查
pub fn parse_latest_rates(body: &str) -> Result<Vec<(String, Option<f64>)>, IngestError> {
    let data: LatestRatesResponse = serde_json::from_str(body)
        .map_err(|e| IngestError::Upstream(format!("响应体解析失败: {}, body: {}", e, body)))?;

    if data.result != "success" {
        return Err(IngestError::Upstream(format!("API error: {}", body)));
    }

    let rates = data
        .rates
        .ok_or_else(|| IngestError::Upstream(format!("rates 字段缺失: {}", body)))?;

    // HashMap 无序，按货币代码排序让批次顺序稳定
    let mut pairs: Vec<(String, Option<f64>)> = rates.into_iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(pairs)
}

/// 拉取最新汇率，单次 GET，不重试。
/// 传输失败（连接/超时/非 2xx）与上游状态错误分开上报
pub async fn get_latest_rates() -> Result<RateSnapshot, IngestError> {
    let response = Client::new()
        .get(API_URL)
        .query(&[("base", BASE_CURRENCY)])
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(IngestError::Transport(format!(
            "请求失败: status={}, body={}",
            status, body
        )));
    }

    let pairs = parse_latest_rates(&body)?;
    info!("拉取汇率成功, {} 个币种", pairs.len());

    // 快照日期取本机当前日历日，不信任响应体里自带的时间戳
    Ok(RateSnapshot {
        pairs,
        rate_date: Local::now().date_naive(),
    })
}
