use gesturelab::config::CaptureConfig;
use gesturelab::remote::{check_backend, BackendStatus, HttpGestureService};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

/// Serve one request with a fixed status line, then close.
fn answer_once(status: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = Vec::new();
            let mut chunk = [0u8; 512];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&chunk[..n]),
                }
            }
            let response = format!("HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n", status);
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{}", addr)
}

fn service(api_url: String) -> HttpGestureService {
    let config = CaptureConfig {
        api_url,
        request_timeout_ms: 2000,
        ..CaptureConfig::default()
    };
    HttpGestureService::new(&config)
}

#[tokio::test]
async fn test_backend_answering_not_found_is_online() {
    let service = service(answer_once("404 Not Found"));
    assert_eq!(check_backend(&service).await, BackendStatus::Online);
}

#[tokio::test]
async fn test_backend_answering_method_not_allowed_is_online() {
    let service = service(answer_once("405 Method Not Allowed"));
    assert_eq!(check_backend(&service).await, BackendStatus::Online);
}

#[tokio::test]
async fn test_refused_connection_is_offline() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let service = service(format!("http://{}", addr));
    assert_eq!(check_backend(&service).await, BackendStatus::Offline);
}
