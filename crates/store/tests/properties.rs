use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use store::{KeySnapshot, KvStore, MemoryStore, PutOutcome, ShardedStore, StoreError, Value};
use tokio::sync::{oneshot, Barrier};

fn backends() -> Vec<(&'static str, Arc<dyn KvStore>)> {
    let memory: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let sharded: Arc<dyn KvStore> = Arc::new(ShardedStore::with_shards(8));
    vec![("memory", memory), ("sharded", sharded)]
}

fn key_set(keys: Vec<String>) -> HashSet<String> {
    keys.into_iter().collect()
}

#[tokio::test]
async fn example_scenario() -> anyhow::Result<()> {
    for (name, store) in backends() {
        store.put("a".into(), json!(1)).await?;
        store.put("b".into(), json!("x")).await?;
        store.put("a".into(), json!(2)).await?;

        assert_eq!(store.count().await, 2, "{name}");
        assert_eq!(store.get("a").await?, Some(json!(2)), "{name}");
        assert_eq!(store.get("c").await?, None, "{name}");
        let expected = key_set(vec!["a".into(), "b".into()]);
        assert_eq!(key_set(store.keys().await), expected, "{name}");
    }
    Ok(())
}

#[tokio::test]
async fn put_then_get_returns_the_value() -> anyhow::Result<()> {
    let values = [
        json!(null),
        json!(false),
        json!(3.5),
        json!(-7),
        json!("text"),
        json!([1, "two", null]),
        json!({"nested": {"list": [true]}}),
    ];
    for (name, store) in backends() {
        for (i, v) in values.iter().enumerate() {
            let key = format!("k{i}");
            store.put(key.clone(), v.clone()).await?;
            assert_eq!(store.get(&key).await?.as_ref(), Some(v), "{name}");
        }
    }
    Ok(())
}

#[tokio::test]
async fn never_written_key_is_absent() -> anyhow::Result<()> {
    for (name, store) in backends() {
        assert_eq!(store.get("ghost").await?, None, "{name}");
        store.put("other".into(), json!(1)).await?;
        assert_eq!(store.get("ghost").await?, None, "{name}");
    }
    Ok(())
}

#[tokio::test]
async fn overwrite_keeps_count() -> anyhow::Result<()> {
    for (name, store) in backends() {
        assert_eq!(store.put("k".into(), json!("v1")).await?, PutOutcome::Created);
        assert_eq!(store.put("k".into(), json!("v2")).await?, PutOutcome::Replaced);
        assert_eq!(store.get("k").await?, Some(json!("v2")), "{name}");
        assert_eq!(store.count().await, 1, "{name}");
    }
    Ok(())
}

#[tokio::test]
async fn count_and_keys_match_distinct_puts() -> anyhow::Result<()> {
    for (name, store) in backends() {
        let expected: HashSet<String> = (0..250).map(|i| format!("key/{i}")).collect();
        for k in &expected {
            store.put(k.clone(), json!(k)).await?;
        }
        assert_eq!(store.count().await, expected.len(), "{name}");
        assert_eq!(key_set(store.keys().await), expected, "{name}");

        let snap = store.snapshot().await;
        assert_eq!(snap.count, snap.keys.len(), "{name}");
        assert_eq!(key_set(snap.keys), expected, "{name}");
    }
    Ok(())
}

fn big_value(tag: &str) -> Value {
    let items = vec![tag; 512];
    json!({ "tag": tag, "items": items })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_puts_on_one_key_leave_a_whole_value() -> anyhow::Result<()> {
    for (name, store) in backends() {
        let v1 = big_value("one");
        let v2 = big_value("two");

        let mut tasks = Vec::new();
        for i in 0..64 {
            let store = Arc::clone(&store);
            let v = if i % 2 == 0 { v1.clone() } else { v2.clone() };
            tasks.push(tokio::spawn(async move { store.put("shared".into(), v).await }));
        }
        // readers racing the writers must only ever see complete values
        let mut readers = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            let (v1, v2) = (v1.clone(), v2.clone());
            readers.push(tokio::spawn(async move {
                for _ in 0..50 {
                    if let Some(seen) = store.get("shared").await.expect("valid key") {
                        assert!(seen == v1 || seen == v2);
                    }
                    tokio::task::yield_now().await;
                }
            }));
        }
        for t in tasks {
            t.await??;
        }
        for r in readers {
            r.await?;
        }

        let last = store.get("shared").await?.expect("written");
        assert!(last == v1 || last == v2, "{name}");
        assert_eq!(store.count().await, 1, "{name}");
    }
    Ok(())
}

/// Keys seen by `keys()`, then `count()`, then `snapshot()`, taken back to back.
struct Observation {
    keys: Vec<String>,
    count: usize,
    snapshot: KeySnapshot,
}

async fn observe(store: &dyn KvStore) -> Observation {
    let keys = store.keys().await;
    let count = store.count().await;
    let snapshot = store.snapshot().await;
    Observation { keys, count, snapshot }
}

/// `base` plus `new-0..n` with no gaps; returns the number of keys.
fn assert_ordered_prefix(name: &str, keys: &[String]) -> usize {
    let set: HashSet<&str> = keys.iter().map(String::as_str).collect();
    assert_eq!(set.len(), keys.len(), "{name}: duplicate keys");
    assert!(set.contains("base"), "{name}");
    let inserted = set.len() - 1;
    for i in 0..inserted {
        let key = format!("new-{i}");
        assert!(set.contains(key.as_str()), "{name}: gap at {key} with {inserted} inserted");
    }
    set.len()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn key_snapshots_reflect_a_single_instant() -> anyhow::Result<()> {
    const N: usize = 400;
    for (name, store) in backends() {
        store.put("base".into(), json!(0)).await?;

        let start = Arc::new(Barrier::new(2));
        let (halfway_tx, mut halfway_rx) = oneshot::channel::<()>();
        let (resume_tx, resume_rx) = oneshot::channel::<()>();

        // one writer inserts new keys strictly in order, parking once halfway
        let writer = {
            let store = Arc::clone(&store);
            let start = Arc::clone(&start);
            tokio::spawn(async move {
                start.wait().await;
                for i in 0..N / 2 {
                    store.put(format!("new-{i}"), json!(i)).await?;
                    tokio::task::yield_now().await;
                }
                let _ = halfway_tx.send(());
                resume_rx.await?;
                for i in N / 2..N {
                    store.put(format!("new-{i}"), json!(i)).await?;
                    tokio::task::yield_now().await;
                }
                Ok::<_, anyhow::Error>(())
            })
        };

        start.wait().await;
        let mut observed = Vec::new();
        let mut resume_tx = Some(resume_tx);
        loop {
            observed.push(observe(store.as_ref()).await);
            if resume_tx.is_some() && halfway_rx.try_recv().is_ok() {
                // the writer is parked with exactly half of the keys in
                observed.push(observe(store.as_ref()).await);
                if let Some(tx) = resume_tx.take() {
                    let _ = tx.send(());
                }
            }
            if writer.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
        writer.await??;
        observed.push(observe(store.as_ref()).await);

        let mut partial = 0;
        for obs in &observed {
            let listed = assert_ordered_prefix(name, &obs.keys);
            let snapped = assert_ordered_prefix(name, &obs.snapshot.keys);
            assert_eq!(obs.snapshot.count, snapped, "{name}");
            // keys only ever get added, so later reads never see fewer
            assert!(listed <= obs.count, "{name}: keys() saw {listed}, count() {}", obs.count);
            assert!(obs.count <= snapped, "{name}: count() {} > snapshot {snapped}", obs.count);
            if 1 < snapped && snapped < N + 1 {
                partial += 1;
            }
        }
        assert!(partial >= 1, "{name}: no snapshot landed mid-insert");

        let last = observed.last().expect("final observation");
        assert_eq!(last.count, N + 1, "{name}");
        assert_eq!(last.keys.len(), N + 1, "{name}");
        assert_eq!(store.count().await, N + 1, "{name}");
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn writers_on_distinct_keys_all_land() -> anyhow::Result<()> {
    for (name, store) in backends() {
        let mut tasks = Vec::new();
        for w in 0..8 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                for i in 0..100 {
                    store.put(format!("w{w}-{i}"), json!([w, i])).await?;
                }
                Ok::<_, StoreError>(())
            }));
        }
        for t in tasks {
            t.await??;
        }
        assert_eq!(store.count().await, 800, "{name}");
        assert_eq!(store.get("w7-99").await?, Some(json!([7, 99])), "{name}");
    }
    Ok(())
}
