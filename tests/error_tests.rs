use pgwq::{BootstrapRegistry, Config, Error, WorkQueue};

mod common;

#[tokio::test]
async fn connect_rejects_invalid_arguments_before_any_io() {
    let registry = BootstrapRegistry::new();

    // No database is running behind these DSNs; validation must fail first
    let empty_dsn = Config::from_dsn("");
    let result = WorkQueue::<i32>::connect(&empty_dsn, "jobs", &registry).await;
    assert!(matches!(result, Err(Error::MissingConfig { .. })));

    let config = Config::from_dsn("postgresql://localhost/db");
    let result = WorkQueue::<i32>::connect(&config, "", &registry).await;
    assert!(matches!(result, Err(Error::InvalidConfig { .. })));

    let result = WorkQueue::<i32>::connect(&config, "bad-name", &registry).await;
    assert!(matches!(result, Err(Error::InvalidConfig { .. })));

    let result = WorkQueue::<i32>::connect(&config, "1st", &registry).await;
    assert!(matches!(result, Err(Error::InvalidConfig { .. })));
}

#[tokio::test]
async fn enqueueing_a_null_element_is_rejected() {
    let db = common::start_postgres().await;
    let config = Config::from_dsn(&db.dsn);
    let registry = BootstrapRegistry::new();

    let queue: WorkQueue<Option<i32>> = WorkQueue::connect(&config, "test_nulls", &registry)
        .await
        .unwrap();

    let result = queue.enqueue(&None).await;
    assert!(matches!(result, Err(Error::InvalidPayload { .. })));
    assert_eq!(queue.count().await.unwrap(), 0);

    queue.enqueue(&Some(5)).await.unwrap();
    assert_eq!(queue.count().await.unwrap(), 1);
}

#[tokio::test]
async fn decode_failure_leaves_the_claim_in_place() {
    let db = common::start_postgres().await;
    let config = Config::from_dsn(&db.dsn);
    let registry = BootstrapRegistry::new();

    let words: WorkQueue<String> = WorkQueue::connect(&config, "test_mixed", &registry)
        .await
        .unwrap();
    words.enqueue(&"not a number".to_string()).await.unwrap();

    // Same table, incompatible element type
    let numbers: WorkQueue<i32> = WorkQueue::connect(&config, "test_mixed", &registry)
        .await
        .unwrap();
    let result = numbers.peek().await;
    assert!(matches!(result, Err(Error::Serialization(_))));

    // The claim survived the failed decode: the row is Processing, not eligible
    assert!(words.peek().await.unwrap().is_none());
    assert_eq!(words.count().await.unwrap(), 1);

    // Recovery path
    words.reset_all_statuses(None).await.unwrap();
    let (_, element) = words.peek().await.unwrap().unwrap();
    assert_eq!(element, "not a number");
}
