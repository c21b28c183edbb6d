//! Integration tests for redlite
//!
//! Drives a real server over TCP, including restarts against the same log

use redlite::{Client, KvServer, MemoryStore, ServerConfig};
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Start a server on an ephemeral port; returns its address, its store and
/// the task running it
async fn start_test_server(wal_path: &Path) -> (String, MemoryStore, JoinHandle<()>) {
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        wal_path: wal_path.to_path_buf(),
        sweep_interval: Duration::from_millis(200),
    };

    let server = KvServer::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let store = server.db().store().clone();
    let handle = tokio::spawn(async move {
        let _ = server.run().await;
    });
    (addr, store, handle)
}

#[tokio::test]
async fn test_basic_operations() {
    let temp_file = NamedTempFile::new().unwrap();
    let (addr, _store, _server) = start_test_server(temp_file.path()).await;

    let mut client = Client::connect(&addr).await.unwrap();

    client.set("test_key", "test_value").await.unwrap();
    assert_eq!(
        client.get("test_key").await.unwrap(),
        Some("test_value".to_string())
    );
    assert_eq!(client.get("nonexistent").await.unwrap(), None);

    // Visible from any other connection too
    let mut other = Client::connect(&addr).await.unwrap();
    assert_eq!(
        other.get("test_key").await.unwrap(),
        Some("test_value".to_string())
    );

    client.close().await.unwrap();
    other.close().await.unwrap();
}

#[tokio::test]
async fn test_raw_protocol_responses() {
    let temp_file = NamedTempFile::new().unwrap();
    let (addr, store, _server) = start_test_server(temp_file.path()).await;

    let mut client = Client::connect(&addr).await.unwrap();

    assert_eq!(client.send_line("FOO bar").await.unwrap(), "UNKNOWN");
    assert_eq!(
        client.send_line("SET onlykey").await.unwrap(),
        "ERROR: Usage SET key value"
    );
    assert_eq!(
        client.send_line("SETEX k 10").await.unwrap(),
        "ERROR: Usage SETEX key seconds value"
    );
    assert!(store.keys().await.is_empty());

    assert_eq!(client.send_line("set lower case").await.unwrap(), "OK");
    assert_eq!(client.send_line("GET lower").await.unwrap(), "case");

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_setex_expires() {
    let temp_file = NamedTempFile::new().unwrap();
    let (addr, _store, _server) = start_test_server(temp_file.path()).await;

    let mut client = Client::connect(&addr).await.unwrap();

    client.setex("long", 60, "kept").await.unwrap();
    client.setex("short", 1, "gone").await.unwrap();
    assert_eq!(client.get("long").await.unwrap(), Some("kept".to_string()));

    sleep(Duration::from_millis(2100)).await;
    assert_eq!(client.get("short").await.unwrap(), None);
    assert_eq!(client.get("long").await.unwrap(), Some("kept".to_string()));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_sweeper_evicts_unread_keys() {
    let temp_file = NamedTempFile::new().unwrap();
    let (addr, store, _server) = start_test_server(temp_file.path()).await;

    let mut client = Client::connect(&addr).await.unwrap();
    client.setex("ephemeral", 1, "v").await.unwrap();
    assert!(store.contains_key("ephemeral").await);

    sleep(Duration::from_millis(2500)).await;
    assert!(!store.contains_key("ephemeral").await);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_overwrite_discards_expiry() {
    let temp_file = NamedTempFile::new().unwrap();
    let (addr, _store, _server) = start_test_server(temp_file.path()).await;

    let mut client = Client::connect(&addr).await.unwrap();
    client.setex("k", 1, "a").await.unwrap();
    client.set("k", "b").await.unwrap();

    sleep(Duration::from_millis(2100)).await;
    assert_eq!(client.get("k").await.unwrap(), Some("b".to_string()));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_clients() {
    let temp_file = NamedTempFile::new().unwrap();
    let (addr, store, _server) = start_test_server(temp_file.path()).await;

    let num_clients = 10;
    let ops_per_client = 50;
    let mut handles = Vec::new();

    for client_id in 0..num_clients {
        let addr = addr.clone();
        let handle = tokio::spawn(async move {
            let mut client = Client::connect(&addr).await.unwrap();

            for i in 0..ops_per_client {
                let key = format!("client_{}_key_{}", client_id, i);
                let value = format!("client_{}_value_{}", client_id, i);

                client.set(&key, &value).await.unwrap();
                assert_eq!(client.get(&key).await.unwrap(), Some(value));
            }

            client.close().await.unwrap();
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.keys().await.len(), num_clients * ops_per_client);

    // Every accepted write is in the log, one line each.
    let log = std::fs::read_to_string(temp_file.path()).unwrap();
    assert_eq!(log.lines().count(), num_clients * ops_per_client);
}

#[tokio::test]
async fn test_same_key_reads_are_never_torn() {
    let temp_file = NamedTempFile::new().unwrap();
    let (addr, _store, _server) = start_test_server(temp_file.path()).await;

    let a = "a".repeat(4096);
    let b = "b".repeat(4096);

    let mut writers = Vec::new();
    for value in [a.clone(), b.clone()] {
        let addr = addr.clone();
        writers.push(tokio::spawn(async move {
            let mut client = Client::connect(&addr).await.unwrap();
            for _ in 0..100 {
                client.set("shared", &value).await.unwrap();
            }
        }));
    }

    let mut reader = Client::connect(&addr).await.unwrap();
    for _ in 0..100 {
        if let Some(value) = reader.get("shared").await.unwrap() {
            assert!(value == a || value == b, "torn value of length {}", value.len());
        }
    }

    for writer in writers {
        writer.await.unwrap();
    }
}

#[tokio::test]
async fn test_persistence_and_recovery() {
    let temp_file = NamedTempFile::new().unwrap();

    let (addr, _store, server) = start_test_server(temp_file.path()).await;
    let mut client = Client::connect(&addr).await.unwrap();
    client.set("persistent_key1", "first").await.unwrap();
    client.set("persistent_key2", "value2").await.unwrap();
    client.setex("session", 1, "token").await.unwrap();
    client.set("persistent_key1", "second").await.unwrap();
    client.close().await.unwrap();

    server.abort();
    let _ = server.await;

    // Fresh process state, same log
    let (addr2, store2, _server2) = start_test_server(temp_file.path()).await;
    let mut client2 = Client::connect(&addr2).await.unwrap();

    assert_eq!(
        client2.get("persistent_key1").await.unwrap(),
        Some("second".to_string())
    );
    assert_eq!(
        client2.get("persistent_key2").await.unwrap(),
        Some("value2".to_string())
    );

    // Replay drops the TTL: the session key outlives its original expiry
    // and the sweeper leaves it alone.
    sleep(Duration::from_millis(2100)).await;
    assert!(store2.contains_key("session").await);
    assert_eq!(client2.get("session").await.unwrap(), Some("token".to_string()));

    client2.close().await.unwrap();
}

#[tokio::test]
async fn test_client_rejects_multi_word_values() {
    let temp_file = NamedTempFile::new().unwrap();
    let (addr, _store, _server) = start_test_server(temp_file.path()).await;

    let mut client = Client::connect(&addr).await.unwrap();
    assert!(client.set("key", "two words").await.is_err());
    assert!(client.get("").await.is_err());

    // The connection is still usable afterwards
    client.set("key", "one").await.unwrap();
    assert_eq!(client.get("key").await.unwrap(), Some("one".to_string()));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_error_handling() {
    let result = Client::connect("127.0.0.1:1").await;
    assert!(result.is_err());
}
