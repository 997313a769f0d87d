use color_eyre::eyre::Result;
use http::{Method, StatusCode};
use httpecho::{Client, EchoServer, Router, ServerConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

/// Helper to start an echo server on an ephemeral port
async fn start_echo_server() -> Result<(tokio::task::JoinHandle<httpecho::Result<()>>, SocketAddr)>
{
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let config = ServerConfig {
        bind_addr: addr,
        max_connections: 100,
        read_timeout: Duration::from_secs(5),
        write_timeout: Duration::from_secs(5),
        ..ServerConfig::default()
    };
    let server = EchoServer::new(config, Router::with_echo());

    let handle = tokio::spawn(async move { server.serve(listener).await });
    Ok((handle, addr))
}

#[tokio::test]
async fn round_trip_post_reflects_method_header_and_body() -> Result<()> {
    let (server_handle, addr) = start_echo_server().await?;

    let mut client = Client::connect(addr).await?;
    let response = client
        .send(Method::POST, "/", &[("X-Test", "1")], b"hello")
        .await?;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("text/html"));

    let body = response.body_text()?;
    assert!(body.contains("METHOD: <br>POST<br><br>"));
    assert!(body.contains("X-Test: 1"));
    assert!(body.contains("hello"));

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn every_method_is_reflected() -> Result<()> {
    let (server_handle, addr) = start_echo_server().await?;

    for method in [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::OPTIONS,
    ] {
        let mut client = Client::connect(addr).await?;
        let response = client.send(method.clone(), "/", &[], b"").await?;

        assert_eq!(response.status, StatusCode::OK);
        let body = response.body_text()?;
        assert!(
            body.contains(&format!("METHOD: <br>{method}<br><br>")),
            "method {method} not reflected in {body:?}"
        );
    }

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn headers_are_listed_in_receipt_order_with_duplicates() -> Result<()> {
    let (server_handle, addr) = start_echo_server().await?;

    let mut client = Client::connect(addr).await?;
    let response = client
        .send(
            Method::GET,
            "/",
            &[("X-First", "1"), ("X-Second", "2"), ("X-First", "3")],
            b"",
        )
        .await?;

    let body = response.body_text()?;
    let first = body.find("X-First: 1").expect("first header missing");
    let second = body.find("X-Second: 2").expect("second header missing");
    let third = body.find("X-First: 3").expect("duplicate header missing");
    assert!(first < second && second < third);

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn empty_body_yields_empty_body_section() -> Result<()> {
    let (server_handle, addr) = start_echo_server().await?;

    let mut client = Client::connect(addr).await?;
    let response = client.send(Method::GET, "/", &[], b"").await?;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body_text()?.ends_with("BODY: <br><br><br>"));

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn identical_requests_get_identical_responses() -> Result<()> {
    let (server_handle, addr) = start_echo_server().await?;

    let mut first_client = Client::connect(addr).await?;
    let first = first_client
        .send(Method::POST, "/", &[("X-Rep", "a")], b"same body")
        .await?;

    let mut second_client = Client::connect(addr).await?;
    let second = second_client
        .send(Method::POST, "/", &[("X-Rep", "a")], b"same body")
        .await?;

    assert_eq!(first, second);

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn concurrent_clients_see_only_their_own_data() -> Result<()> {
    let (server_handle, addr) = start_echo_server().await?;

    let client_count = 8;
    let mut handles = Vec::new();

    for i in 0..client_count {
        let handle = tokio::spawn(async move {
            let mut client = Client::connect(addr).await?;
            let marker = format!("payload-for-client-{i}");
            let response = client.send(Method::POST, "/", &[], marker.as_bytes()).await?;
            let body = response.body_text()?;

            assert!(body.contains(&marker), "client {i} missing own body");
            for other in 0..client_count {
                if other != i {
                    assert!(
                        !body.contains(&format!("payload-for-client-{other}")),
                        "client {i} saw data from client {other}"
                    );
                }
            }
            Ok::<(), httpecho::EchoError>(())
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await??;
    }

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn unknown_path_returns_404() -> Result<()> {
    let (server_handle, addr) = start_echo_server().await?;

    let mut client = Client::connect(addr).await?;
    let response = client.send(Method::GET, "/missing", &[], b"").await?;

    assert_eq!(response.status, StatusCode::NOT_FOUND);

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn malformed_request_is_rejected_with_400() -> Result<()> {
    let (server_handle, addr) = start_echo_server().await?;

    let mut client = Client::connect(addr).await?;
    let response = client.send_raw(b"NOT AN HTTP REQUEST\0\r\n\r\n").await?;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn chunked_request_is_rejected_with_400() -> Result<()> {
    let (server_handle, addr) = start_echo_server().await?;

    let mut client = Client::connect(addr).await?;
    let response = client
        .send_raw(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n")
        .await?;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn invalid_utf8_body_is_echoed_with_substitution() -> Result<()> {
    let (server_handle, addr) = start_echo_server().await?;

    let mut client = Client::connect(addr).await?;
    let response = client
        .send(Method::POST, "/", &[], &[0xff, 0xfe, b'o', b'k'])
        .await?;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.body_text()?;
    assert!(body.contains('\u{FFFD}'));
    assert!(body.contains("ok"));

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn keep_alive_serves_sequential_requests_on_one_connection() -> Result<()> {
    let (server_handle, addr) = start_echo_server().await?;

    let mut client = Client::connect(addr).await?;

    let first = client.send(Method::POST, "/", &[], b"first").await?;
    assert!(first.body_text()?.contains("first"));

    let second = client.send(Method::POST, "/", &[], b"second").await?;
    assert!(second.body_text()?.contains("second"));

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn connection_close_header_is_honored() -> Result<()> {
    let (server_handle, addr) = start_echo_server().await?;

    let mut client = Client::connect(addr).await?;
    let response = client
        .send(Method::GET, "/", &[("Connection", "close")], b"")
        .await?;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("connection"), Some("close"));

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn graceful_shutdown_via_internal_signal() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let config = ServerConfig {
        bind_addr: addr,
        ..ServerConfig::default()
    };
    let server = EchoServer::new(config, Router::with_echo());
    let shutdown = server.shutdown_signal();

    let server_handle = tokio::spawn(async move { server.serve(listener).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Verify server is running
    let mut client = Client::connect(addr).await?;
    let response = client.send(Method::GET, "/", &[], b"").await?;
    assert_eq!(response.status, StatusCode::OK);

    // Ask the server to stop and wait for a clean exit
    shutdown.send(())?;
    server_handle.await??;

    // New connections should no longer be served
    tokio::time::sleep(Duration::from_millis(100)).await;
    match Client::connect(addr).await {
        Ok(mut client) => {
            assert!(client.send(Method::GET, "/", &[], b"").await.is_err());
        }
        Err(_) => {
            // Expected - listener is gone
        }
    }

    Ok(())
}
