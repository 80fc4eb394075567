use anyhow::Result;
use dotenv::dotenv;

use fx_ingest::error::app_error::IngestError;
use fx_ingest::ingestion::erapi::{get_latest_rates, parse_latest_rates, BASE_CURRENCY};

#[test]
fn test_parse_success_payload() {
    let body = r#"{"result":"success","rates":{"EUR":0.91,"GBP":0.78}}"#;
    let pairs = parse_latest_rates(body).unwrap();
    // 按货币代码排序
    assert_eq!(
        pairs,
        vec![
            ("EUR".to_string(), Some(0.91)),
            ("GBP".to_string(), Some(0.78)),
        ]
    );
}

#[test]
fn test_parse_error_payload_keeps_body() {
    let body = r#"{"result":"error"}"#;
    let err = parse_latest_rates(body).unwrap_err();
    match err {
        IngestError::Upstream(msg) => {
            // 完整响应体原样保留，方便对照上游排查
            assert!(msg.contains(r#"{"result":"error"}"#));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_parse_null_rate_survives_to_pairs() {
    // null 汇率在解析阶段不报错，留给校验阶段整批拒绝
    let body = r#"{"result":"success","rates":{"EUR":0.91,"XXX":null}}"#;
    let pairs = parse_latest_rates(body).unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[1], ("XXX".to_string(), None));
}

#[test]
fn test_parse_missing_rates_field() {
    let body = r#"{"result":"success"}"#;
    let err = parse_latest_rates(body).unwrap_err();
    assert!(matches!(err, IngestError::Upstream(_)));
}

#[test]
fn test_parse_garbage_body() {
    let err = parse_latest_rates("not json at all").unwrap_err();
    assert!(matches!(err, IngestError::Upstream(_)));
}

/// 真实调用汇率接口，需要外网
#[tokio::test]
#[ignore]
async fn test_get_latest_rates_live() -> Result<()> {
    dotenv().ok();

    let snapshot = get_latest_rates().await?;
    println!(
        "fetched {} rates for base {}, date {}",
        snapshot.pairs.len(),
        BASE_CURRENCY,
        snapshot.rate_date
    );
    assert!(!snapshot.pairs.is_empty());
    Ok(())
}
