//! Downloads and REST queries against a canned HTTP responder on loopback.

use std::collections::HashMap;
use std::sync::Arc;
use tickfy_node::{NodeError, NodeService, ServiceConfig};
use tickfy_types::ErrorKind;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve `routes` (path → (status, body)) for the rest of the test.
async fn serve(routes: HashMap<String, (u16, Vec<u8>)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else { break };
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let mut read = 0;
                while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => read += n,
                    }
                }
                let request = String::from_utf8_lossy(&buf[..read]);
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                let (status, body) = routes
                    .get(&path)
                    .cloned()
                    .unwrap_or((404, b"not found".to_vec()));
                let head = format!(
                    "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}

/// Path component of `url` below `base`.
fn route(url: &str, base: &str) -> String {
    url.strip_prefix(base).unwrap().to_string()
}

#[tokio::test]
async fn test_install_node_downloads_with_progress() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServiceConfig::new(dir.path());
    config.release_base = "http://placeholder/releases".to_string();
    let asset = route(&config.daemon_url(), "http://placeholder");

    let body = vec![0x7fu8; 100_000];
    let mut routes = HashMap::new();
    routes.insert(asset, (200, body.clone()));
    let url = serve(routes).await;
    config.release_base = format!("{}/releases", url);

    let svc = NodeService::new(config).unwrap();
    let mut seen = Vec::new();
    assert!(svc.install_node(&mut |pct| seen.push(pct)).await.unwrap());

    let binary = svc.config().daemon_path();
    assert_eq!(std::fs::read(&binary).unwrap(), body);
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] < w[1]));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&binary).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    // Already installed: nothing is fetched.
    assert!(!svc.install_node(&mut |_| {}).await.unwrap());
    assert!(svc.status().await.is_node_installed);
}

#[tokio::test]
async fn test_missing_release_is_transient_error() {
    let url = serve(HashMap::new()).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServiceConfig::new(dir.path());
    config.release_base = url;

    let svc = NodeService::new(config).unwrap();
    let err = svc.install_node(&mut |_| {}).await.unwrap_err();
    assert!(matches!(err, NodeError::DownloadStatus { status: 404, .. }));
    assert_eq!(err.kind(), ErrorKind::TransientIo);
    assert!(!svc.config().daemon_path().exists());
    assert!(std::fs::read_dir(svc.config().bin_dir()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_balance_with_malformed_amount_reads_zero() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServiceConfig::new(dir.path());
    let svc = NodeService::new(config.clone()).unwrap();
    let wallet = svc.vault().create_wallet("main", "secret1").unwrap();
    drop(svc);

    let mut routes = HashMap::new();
    routes.insert(
        format!("/cosmos/bank/v1beta1/balances/{}", wallet.address),
        (200, br#"{"balances":[{"denom":"utkfy","amount":"lots"}]}"#.to_vec()),
    );
    config.api_url = serve(routes).await;

    let svc = NodeService::new(config).unwrap();
    let balance = svc.balance(None).await.unwrap();
    assert_eq!(balance.micro, 0);
    assert_eq!(balance.display, "0 TKFY");
}

#[tokio::test]
async fn test_balance_of_active_wallet() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServiceConfig::new(dir.path());
    let svc = NodeService::new(config.clone()).unwrap();
    let wallet = svc.vault().create_wallet("main", "secret1").unwrap();
    drop(svc);

    let mut routes = HashMap::new();
    routes.insert(
        format!("/cosmos/bank/v1beta1/balances/{}", wallet.address),
        (200, br#"{"balances":[{"denom":"stake","amount":"2500000"}]}"#.to_vec()),
    );
    config.api_url = serve(routes).await;

    let svc = NodeService::new(config).unwrap();
    assert_eq!(svc.balance(None).await.unwrap().display, "2.50 TKFY");
}
