use super::*;
use tempfile::NamedTempFile;

async fn exercise_basic_ops(kv: &dyn KvStore) {
    assert_eq!(kv.get(TASK_NAMESPACE, "123").await.unwrap(), None);
    assert!(!kv.contains(TASK_NAMESPACE, "123").await.unwrap());

    kv.set(TASK_NAMESPACE, "123", b"details").await.unwrap();
    assert_eq!(
        kv.get(TASK_NAMESPACE, "123").await.unwrap().as_deref(),
        Some(&b"details"[..])
    );
    assert!(kv.contains(TASK_NAMESPACE, "123").await.unwrap());

    kv.set(TASK_NAMESPACE, "123", b"updated").await.unwrap();
    assert_eq!(
        kv.get(TASK_NAMESPACE, "123").await.unwrap().as_deref(),
        Some(&b"updated"[..])
    );

    assert!(kv.delete(TASK_NAMESPACE, "123").await.unwrap());
    assert!(!kv.delete(TASK_NAMESPACE, "123").await.unwrap());
    assert_eq!(kv.get(TASK_NAMESPACE, "123").await.unwrap(), None);
}

async fn exercise_namespace_isolation(kv: &dyn KvStore) {
    kv.set(TASK_NAMESPACE, "shared", b"task").await.unwrap();
    kv.set(DEDUP_NAMESPACE, "shared", b"dedup").await.unwrap();

    assert_eq!(
        kv.get(TASK_NAMESPACE, "shared").await.unwrap().as_deref(),
        Some(&b"task"[..])
    );
    assert_eq!(
        kv.get(DEDUP_NAMESPACE, "shared").await.unwrap().as_deref(),
        Some(&b"dedup"[..])
    );

    kv.delete(TASK_NAMESPACE, "shared").await.unwrap();
    assert!(kv.contains(DEDUP_NAMESPACE, "shared").await.unwrap());

    kv.set(TASK_NAMESPACE, "a", b"1").await.unwrap();
    kv.set(TASK_NAMESPACE, "b", b"2").await.unwrap();
    let mut keys = kv.keys(TASK_NAMESPACE).await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    assert!(kv.keys("unused").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_memory_basic_ops() {
    exercise_basic_ops(&MemoryKv::new()).await;
}

#[tokio::test]
async fn test_memory_namespace_isolation() {
    exercise_namespace_isolation(&MemoryKv::new()).await;
}

#[tokio::test]
async fn test_sqlite_basic_ops() {
    let temp_file = NamedTempFile::new().unwrap();
    let kv = SqliteKv::open(temp_file.path()).await.unwrap();
    exercise_basic_ops(&kv).await;
    kv.close().await;
}

#[tokio::test]
async fn test_sqlite_namespace_isolation() {
    let temp_file = NamedTempFile::new().unwrap();
    let kv = SqliteKv::open(temp_file.path()).await.unwrap();
    exercise_namespace_isolation(&kv).await;
    kv.close().await;
}

#[tokio::test]
async fn test_sqlite_survives_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("nested").join("state.db");

    let kv = SqliteKv::open(&path).await.unwrap();
    kv.set(DEDUP_NAMESPACE, "/tmp/a_x.jpg", b"x").await.unwrap();
    kv.close().await;

    // Re-opening must not re-run migration v1 or lose data
    let kv = SqliteKv::open(&path).await.unwrap();
    assert!(kv.contains(DEDUP_NAMESPACE, "/tmp/a_x.jpg").await.unwrap());
    kv.close().await;
}

#[tokio::test]
async fn test_memory_concurrent_writers() {
    let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());

    let mut handles = Vec::new();
    for i in 0..32 {
        let kv = kv.clone();
        handles.push(tokio::spawn(async move {
            kv.set(DEDUP_NAMESPACE, &format!("key-{i}"), b"1")
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(kv.keys(DEDUP_NAMESPACE).await.unwrap().len(), 32);
}

#[tokio::test]
async fn test_open_selects_backend() {
    let kv = open(&StateBackend::Memory).await.unwrap();
    assert_eq!(kv.name(), "memory");

    let temp_file = NamedTempFile::new().unwrap();
    let kv = open(&StateBackend::Sqlite {
        path: temp_file.path().to_path_buf(),
    })
    .await
    .unwrap();
    assert_eq!(kv.name(), "sqlite");
}
