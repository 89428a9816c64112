mod common;

use common::{FakeCli, FakeStore, harness};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

#[tokio::test]
async fn injection_finishes_after_client_hangs_up() {
    let cli = FakeCli::new(true)
        .reply("basic", 0, "Successfully imported 1 credentials")
        .slow_imports(Duration::from_millis(600));
    let h = harness(Some(FakeStore::with_user("u1", "google")), cli);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind listener");
    let addr = listener.local_addr().expect("listener address");
    let app = h.app.clone();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let body = r#"{"user_id":"u1","provider":"google"}"#;
    let request = format!(
        "POST /inject-credential HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    let mut stream = TcpStream::connect(addr).await.expect("failed to connect");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("failed to send request");

    // Hang up while the import is still running.
    tokio::time::sleep(Duration::from_millis(150)).await;
    drop(stream);

    for _ in 0..30 {
        if !h.store.updates().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    assert_eq!(h.cli.import_calls().len(), 1);
    let updates = h.store.updates();
    assert_eq!(updates.len(), 1, "status write must survive the disconnect");
    assert!(updates[0].2.injected_to_n8n);
    assert_eq!(h.leftover_imports(), 0);
}
