//! Backend round trips against a scripted local HTTP server.
//!
//! The server answers each connection with the next canned response and
//! records the request bodies it saw, so payload shape, retry behaviour
//! and the fallback path can be checked without a real model.

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use kindred_llm::{
    GenerationRequest, LlmClient, LlmError, LlmProvider, TextGenerator, TextSource,
    fallback_response,
};

/// Serve `responses` in order, one per connection. Returns the base URL and
/// a handle yielding the captured request bodies.
async fn scripted_server(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<Value>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let base = format!("http://{}", listener.local_addr().expect("addr"));

    let handle = tokio::spawn(async move {
        let mut bodies = Vec::new();
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let request = read_request(&mut socket).await;
            bodies.push(serde_json::from_str(&request).unwrap_or(Value::Null));

            let reply = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.expect("write");
            socket.shutdown().await.ok();
        }
        bodies
    });
    (base, handle)
}

/// Read one HTTP request and return its body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.expect("read");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(split) = text.find("\r\n\r\n") {
            let length = text[..split]
                .lines()
                .find_map(|l| {
                    let (k, v) = l.split_once(':')?;
                    k.eq_ignore_ascii_case("content-length")
                        .then(|| v.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= split + 4 + length {
                return String::from_utf8_lossy(&buf[split + 4..split + 4 + length]).into_owned();
            }
        }
    }
    String::new()
}

fn openai(base_url: String, retries: u32) -> LlmClient {
    LlmClient::new(
        LlmProvider::OpenAiCompatible {
            base_url,
            api_key: "test-key".into(),
        },
        "tiny-chat",
        retries,
    )
}

#[tokio::test]
async fn openai_chat_round_trip() {
    let reply = json!({
        "choices": [{ "message": { "content": " *wags* Sure! " } }],
        "usage": { "completion_tokens": 4 }
    });
    let (base, server) = scripted_server(vec![(200, reply.to_string())]).await;

    let request = GenerationRequest::new("want to go outside?")
        .with_system("You are Pip.")
        .with_max_tokens(100)
        .with_stop(vec!["\n\n".into()]);
    let resp = openai(base, 0).generate(&request).await.expect("generate");
    assert_eq!(resp.text, "*wags* Sure!");
    assert_eq!(resp.tokens_generated, 4);
    assert_eq!(resp.model, "tiny-chat");

    let bodies = server.await.expect("server");
    let sent = &bodies[0];
    assert_eq!(sent["model"], "tiny-chat");
    assert_eq!(sent["max_tokens"], 100);
    assert_eq!(sent["stop"], json!(["\n\n"]));
    assert_eq!(sent["messages"][1]["content"], "want to go outside?");
}

#[tokio::test]
async fn server_error_is_retried() {
    let ok = json!({ "choices": [{ "text": "second time lucky" }] });
    let (base, server) =
        scripted_server(vec![(500, "{}".into()), (200, ok.to_string())]).await;

    let resp = openai(base, 1)
        .generate(&GenerationRequest::new("again"))
        .await
        .expect("retry succeeds");
    assert_eq!(resp.text, "second time lucky");
    assert_eq!(server.await.expect("server").len(), 2);
}

#[tokio::test]
async fn retries_exhausted_reports_attempts() {
    let (base, server) =
        scripted_server(vec![(503, "{}".into()), (503, "{}".into())]).await;
    let err = openai(base, 1)
        .generate(&GenerationRequest::new("again"))
        .await
        .unwrap_err();
    match err {
        LlmError::RetriesExhausted { attempts, last_error } => {
            assert_eq!(attempts, 2);
            assert!(last_error.contains("503"));
        }
        other => panic!("unexpected error: {other}"),
    }
    server.await.expect("server");
}

#[tokio::test]
async fn unexpected_body_falls_back() {
    let (base, server) =
        scripted_server(vec![(200, json!({ "weird": true }).to_string())]).await;
    let generator = TextGenerator::new(openai(base, 0), 50, 0.5, 2_000);
    let out = generator
        .generate_request(&GenerationRequest::new("shall we play a game?"))
        .await;
    assert_eq!(out.source, TextSource::Fallback);
    assert_eq!(out.text, fallback_response("play"));
    server.await.expect("server");
}

#[tokio::test]
async fn ollama_round_trip() {
    let reply = json!({ "response": "zzz...", "eval_count": 1 });
    let (base, server) = scripted_server(vec![(200, reply.to_string())]).await;
    let client = LlmClient::new(LlmProvider::Ollama { base_url: base }, "tiny", 0);
    let generator = TextGenerator::new(client, 40, 0.7, 2_000);

    let text = generator.generate("sleepy?", Some(10), None, &[]).await;
    assert_eq!(text, "zzz...");

    let sent = &server.await.expect("server")[0];
    assert_eq!(sent["stream"], false);
    assert_eq!(sent["options"]["num_predict"], 10);
    assert!(sent["options"].get("stop").is_none());
}
