use pgwq::{BootstrapRegistry, Config, WorkQueue};
use std::collections::HashSet;

mod common;

async fn connect_queue(dsn: &str, name: &str) -> WorkQueue<i32> {
    let config = Config::from_dsn(dsn);
    WorkQueue::connect(&config, name, &BootstrapRegistry::new())
        .await
        .expect("Failed to connect queue")
}

#[tokio::test]
async fn enqueue_rollback_never_persists_the_item() {
    let db = common::start_postgres().await;
    let queue = connect_queue(&db.dsn, "test_tx_enqueue").await;

    let mut tx = queue.pool.begin().await.unwrap();
    queue.enqueue_in(&345, &mut tx).await.unwrap();

    // The uncommitted insert is not observed by the relaxed count
    assert_eq!(queue.count().await.unwrap(), 0);

    tx.rollback().await.unwrap();
    assert_eq!(queue.count().await.unwrap(), 0);
}

#[tokio::test]
async fn enqueue_commit_persists_the_item() {
    let db = common::start_postgres().await;
    let queue = connect_queue(&db.dsn, "test_tx_enqueue_commit").await;

    let mut tx = queue.pool.begin().await.unwrap();
    queue.enqueue_in(&345, &mut tx).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(queue.count().await.unwrap(), 1);
}

#[tokio::test]
async fn dequeue_rollback_restores_the_row() {
    let db = common::start_postgres().await;
    let queue = connect_queue(&db.dsn, "test_tx_dequeue").await;

    queue.enqueue(&345).await.unwrap();
    let (id, element) = queue.peek().await.unwrap().unwrap();
    assert_eq!(element, 345);

    let mut tx = queue.pool.begin().await.unwrap();
    queue.dequeue_in(id, &mut tx).await.unwrap();
    // The uncommitted delete is not observed by the relaxed count
    assert_eq!(queue.count().await.unwrap(), 1);
    tx.rollback().await.unwrap();

    assert_eq!(queue.count().await.unwrap(), 1);
    assert!(queue.record(id).await.unwrap().is_some());
}

#[tokio::test]
async fn rolled_back_claim_becomes_claimable_again() {
    let db = common::start_postgres().await;
    let queue = connect_queue(&db.dsn, "test_tx_claim").await;

    queue.enqueue(&7).await.unwrap();

    let mut tx = queue.pool.begin().await.unwrap();
    let claimed = queue.peek_in(&mut tx).await.unwrap();
    assert!(claimed.is_some());

    // While the claim is in flight, other claimants skip the locked row
    let mut probe = queue.pool.begin().await.unwrap();
    assert!(queue.peek_in(&mut probe).await.unwrap().is_none());
    probe.rollback().await.unwrap();

    tx.rollback().await.unwrap();

    // The reverted claim is eligible again
    let (_, element) = queue.peek().await.unwrap().unwrap();
    assert_eq!(element, 7);
}

#[tokio::test]
async fn two_rolled_back_dequeues_restore_both_rows() {
    let db = common::start_postgres().await;
    let queue = connect_queue(&db.dsn, "test_tx_exclusive").await;

    queue.enqueue(&1000).await.unwrap();
    queue.enqueue(&1001).await.unwrap();
    assert_eq!(queue.count().await.unwrap(), 2);

    // Two committed claims; each lands on a different row
    let (id1, element1) = queue.peek().await.unwrap().unwrap();
    let (id2, element2) = queue.peek().await.unwrap().unwrap();
    assert_ne!(id1, id2);
    let elements: HashSet<i32> = [element1, element2].into_iter().collect();
    assert_eq!(elements, HashSet::from([1000, 1001]));

    let mut tx1 = queue.pool.begin().await.unwrap();
    let mut tx2 = queue.pool.begin().await.unwrap();
    queue.dequeue_in(id1, &mut tx1).await.unwrap();
    queue.dequeue_in(id2, &mut tx2).await.unwrap();

    tx1.rollback().await.unwrap();
    tx2.rollback().await.unwrap();

    assert_eq!(queue.count().await.unwrap(), 2);
}
