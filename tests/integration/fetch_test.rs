//! Pagination, retry and cancellation behaviour of the fetcher

use crate::support::{
    synthetic_fills, FlakySource, LoopingSource, MultiSource, RecordingObserver, SlowSource,
    VecSource,
};
use cbp_stats::fills::{FetchConfig, FillError, PaginatedFetcher};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn fast_config() -> FetchConfig {
    FetchConfig::default()
        .max_retries(3)
        .backoff(Duration::from_millis(1), Duration::from_millis(4))
}

#[tokio::test]
async fn test_fetch_returns_every_fill_in_order() {
    // (fills on the server, page requests needed)
    let cases = [(0, 1), (1, 1), (99, 1), (100, 2), (101, 2), (250, 3)];

    for (n, expected_requests) in cases {
        let fills = synthetic_fills(n);
        let source = Arc::new(VecSource::new(fills.clone()));
        let fetcher = PaginatedFetcher::with_config(source.clone(), fast_config());

        let history = fetcher.fetch_all("BTC-USD").await.unwrap();

        assert_eq!(history.len(), n, "fill count for n={}", n);
        assert_eq!(history.fills(), fills.as_slice(), "order for n={}", n);
        assert_eq!(history.product_id(), "BTC-USD");
        assert_eq!(source.requests(), expected_requests, "requests for n={}", n);
    }
}

#[tokio::test]
async fn test_first_request_has_no_cursor() {
    let source = Arc::new(VecSource::new(synthetic_fills(250)));
    let fetcher = PaginatedFetcher::with_config(source.clone(), fast_config());

    fetcher.fetch_all("ETH-USD").await.unwrap();

    assert_eq!(
        source.afters(),
        vec![None, Some("100".to_string()), Some("200".to_string())]
    );
}

#[tokio::test]
async fn test_repeated_cursor_stops_with_protocol_error() {
    let source = Arc::new(LoopingSource::new());
    let fetcher = PaginatedFetcher::with_config(source.clone(), fast_config());

    let result = fetcher.fetch_all("BTC-USD").await;

    assert!(matches!(result, Err(FillError::Protocol(_))));
    assert_eq!(source.requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_network_errors_are_retried() {
    let source = Arc::new(FlakySource::new(
        synthetic_fills(50),
        2,
        FillError::Network("connection reset".into()),
    ));
    let fetcher = PaginatedFetcher::with_config(source.clone(), fast_config());

    let history = fetcher.fetch_all("BTC-USD").await.unwrap();

    assert_eq!(history.len(), 50);
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let source = Arc::new(FlakySource::new(
        synthetic_fills(50),
        10,
        FillError::Network("connection reset".into()),
    ));
    let config = fast_config().max_retries(2);
    let fetcher = PaginatedFetcher::with_config(source.clone(), config);

    let result = fetcher.fetch_all("BTC-USD").await;

    assert_eq!(
        result.unwrap_err(),
        FillError::Network("connection reset".into())
    );
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn test_protocol_and_rejected_errors_are_not_retried() {
    let errors = [
        FillError::Protocol("not an array".into()),
        FillError::Rejected {
            status: 401,
            body: "invalid signature".into(),
        },
        FillError::Data("size is zero".into()),
    ];

    for error in errors {
        let source = Arc::new(FlakySource::new(synthetic_fills(5), 1, error.clone()));
        let fetcher = PaginatedFetcher::with_config(source.clone(), fast_config());

        let result = fetcher.fetch_all("BTC-USD").await;

        assert_eq!(result.unwrap_err(), error);
        assert_eq!(source.calls(), 1);
    }
}

#[tokio::test]
async fn test_slow_page_times_out_as_network_error() {
    let source = Arc::new(SlowSource::new(
        synthetic_fills(5),
        Duration::from_millis(500),
    ));
    let config = fast_config()
        .max_retries(1)
        .request_timeout(Duration::from_millis(20));
    let fetcher = PaginatedFetcher::with_config(source.clone(), config);

    let result = fetcher.fetch_all("BTC-USD").await;

    assert!(matches!(result, Err(FillError::Network(_))));
    assert_eq!(source.requests(), 0);
}

#[tokio::test]
async fn test_cancel_discards_partial_history() {
    let source = Arc::new(SlowSource::new(
        synthetic_fills(250),
        Duration::from_millis(100),
    ));
    let fetcher = PaginatedFetcher::with_config(source.clone(), fast_config());

    let result = fetcher
        .fetch_all_until("BTC-USD", tokio::time::sleep(Duration::from_millis(150)))
        .await;

    assert!(matches!(result, Err(FillError::Cancelled(_))));
    assert!(source.requests() < 3);
}

#[tokio::test]
async fn test_fetch_until_completes_when_not_cancelled() {
    let source = Arc::new(VecSource::new(synthetic_fills(120)));
    let fetcher = PaginatedFetcher::with_config(source, fast_config());

    let history = fetcher
        .fetch_all_until("BTC-USD", std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(history.len(), 120);
}

#[tokio::test]
async fn test_observer_sees_running_totals() {
    let observer = Arc::new(RecordingObserver::default());
    let source = Arc::new(VecSource::new(synthetic_fills(250)));
    let fetcher =
        PaginatedFetcher::with_config(source, fast_config()).with_observer(observer.clone());

    fetcher.fetch_all("SOL-USD").await.unwrap();

    let events = observer.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            ("SOL-USD".to_string(), 100, true),
            ("SOL-USD".to_string(), 200, true),
            ("SOL-USD".to_string(), 250, false),
        ]
    );
}

#[tokio::test]
async fn test_observer_not_called_for_failed_page() {
    let observer = Arc::new(RecordingObserver::default());
    let fetcher = PaginatedFetcher::with_config(Arc::new(LoopingSource::new()), fast_config())
        .with_observer(observer.clone());

    assert!(fetcher.fetch_all("BTC-USD").await.is_err());

    let events = observer.events.lock().unwrap().clone();
    assert_eq!(events, vec![("BTC-USD".to_string(), 100, true)]);
}

#[tokio::test]
async fn test_fetch_many_keeps_input_order_and_isolates_failures() {
    let source = MultiSource::new(vec![
        ("BTC-USD", synthetic_fills(150)),
        ("ETH-USD", synthetic_fills(3)),
        ("SOL-USD", vec![]),
    ]);
    let fetcher = PaginatedFetcher::with_config(source, fast_config());
    let products: Vec<String> = ["ETH-USD", "DOGE-USD", "BTC-USD", "SOL-USD"]
        .iter()
        .map(|p| p.to_string())
        .collect();

    let results = fetcher.fetch_many(&products).await;

    let order: Vec<&str> = results.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(order, vec!["ETH-USD", "DOGE-USD", "BTC-USD", "SOL-USD"]);
    assert_eq!(results[0].1.as_ref().unwrap().len(), 3);
    assert!(matches!(
        results[1].1,
        Err(FillError::Rejected { status: 404, .. })
    ));
    assert_eq!(results[2].1.as_ref().unwrap().len(), 150);
    assert!(results[3].1.as_ref().unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_many_respects_concurrency_limit() {
    let source = Arc::new(SlowSource::new(
        synthetic_fills(10),
        Duration::from_millis(20),
    ));
    let config = fast_config().max_concurrency(2);
    let fetcher = PaginatedFetcher::with_config(source.clone(), config);
    let products: Vec<String> = (0..6).map(|i| format!("C{}-USD", i)).collect();

    let results = fetcher.fetch_many(&products).await;

    assert_eq!(results.len(), 6);
    assert!(results.iter().all(|(_, r)| r.is_ok()));
    let peak = source.max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 2, "peak concurrency was {}", peak);
    assert!(peak >= 1);
}

#[tokio::test]
async fn test_fetch_many_deadline_cancels_unfinished_products() {
    let source = Arc::new(SlowSource::new(
        synthetic_fills(10),
        Duration::from_millis(100),
    ));
    let config = fast_config().max_concurrency(1);
    let fetcher = PaginatedFetcher::with_config(source, config);
    let products: Vec<String> = ["BTC-USD", "ETH-USD", "SOL-USD", "LTC-USD"]
        .iter()
        .map(|p| p.to_string())
        .collect();

    let results = fetcher
        .fetch_many_until(&products, tokio::time::sleep(Duration::from_millis(250)))
        .await;

    let order: Vec<&str> = results.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(order, vec!["BTC-USD", "ETH-USD", "SOL-USD", "LTC-USD"]);
    assert_eq!(results[0].1.as_ref().unwrap().len(), 10);
    assert_eq!(results[1].1.as_ref().unwrap().len(), 10);
    assert!(matches!(results[2].1, Err(FillError::Cancelled(_))));
    assert!(matches!(results[3].1, Err(FillError::Cancelled(_))));
}

#[tokio::test]
async fn test_fetch_many_already_cancelled_fetches_nothing() {
    let source = Arc::new(VecSource::new(synthetic_fills(5)));
    let fetcher = PaginatedFetcher::with_config(source.clone(), fast_config());
    let products = vec!["BTC-USD".to_string(), "ETH-USD".to_string()];

    let results = fetcher
        .fetch_many_until(&products, std::future::ready(()))
        .await;

    assert!(results
        .iter()
        .all(|(_, r)| matches!(r, Err(FillError::Cancelled(_)))));
    assert_eq!(source.requests(), 0);
}
