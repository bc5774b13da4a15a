use std::time::Duration;

use feedsync_sync::{BookmarkError, BookmarkSink, FeedError, FeedSource, HttpFeedSource, InstapaperClient};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Served Feed</title>
    <link>http://served.example.com/</link>
    <description>Served</description>
    <item>
      <title>First</title>
      <link>http://served.example.com/1</link>
    </item>
  </channel>
</rss>"#;

/// Serve exactly one request with `status` and `body`; the handle yields the
/// raw request text.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        // The client may hang up as soon as it has the status line.
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
        request
    });

    (url, handle)
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn request_body(request: &str) -> &str {
    request.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or("")
}

#[tokio::test]
async fn http_source_fetches_and_parses_feed() {
    let (url, server) = serve_once("200 OK", RSS).await;
    let source = HttpFeedSource::new(Duration::from_secs(5));

    let feed = source.fetch(&url).await.unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("GET / HTTP/1.1"));
    assert_eq!(feed.title, "Served Feed");
    assert_eq!(feed.entries.len(), 1);
    assert_eq!(feed.entries[0].link, "http://served.example.com/1");
}

#[tokio::test]
async fn http_source_reports_error_status() {
    let (url, server) = serve_once("404 Not Found", "missing").await;
    let source = HttpFeedSource::new(Duration::from_secs(5));

    let err = source.fetch(&url).await.unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, FeedError::Status { status: 404 }));
}

#[tokio::test]
async fn instapaper_posts_credentials_link_and_title() {
    let (url, server) = serve_once("201 Created", "").await;
    let client = InstapaperClient::new(
        "me@example.com".to_string(),
        "hunter2".to_string(),
        Duration::from_secs(5),
    )
    .with_api_url(url);

    client
        .add("http://example.com/1", "Tom & Jerry")
        .await
        .unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("POST / HTTP/1.1"));
    assert!(request
        .to_ascii_lowercase()
        .contains("content-type: application/x-www-form-urlencoded"));
    assert_eq!(
        request_body(&request),
        "username=me%40example.com&password=hunter2&url=http%3A%2F%2Fexample.com%2F1&title=Tom+%26+Jerry"
    );
}

#[tokio::test]
async fn instapaper_omits_empty_title() {
    let (url, server) = serve_once("200 OK", "").await;
    let client = InstapaperClient::new(
        "me".to_string(),
        "secret".to_string(),
        Duration::from_secs(5),
    )
    .with_api_url(url);

    client.add("http://example.com/2", "").await.unwrap();
    let request = server.await.unwrap();

    assert!(!request_body(&request).contains("title="));
}

#[tokio::test]
async fn instapaper_rejection_is_api_error() {
    let (url, server) = serve_once("403 Forbidden", "Invalid username or password.").await;
    let client = InstapaperClient::new(
        "me".to_string(),
        "wrong".to_string(),
        Duration::from_secs(5),
    )
    .with_api_url(url);

    let err = client.add("http://example.com/3", "Three").await.unwrap_err();
    server.await.unwrap();

    match err {
        BookmarkError::Api { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "Invalid username or password.");
        }
        other => panic!("Expected Api error, got: {:?}", other),
    }
}
