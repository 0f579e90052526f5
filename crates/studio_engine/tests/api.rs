use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use studio_engine::{
    ChatRequest, ChatRole, ChatTurn, ClientSettings, FailureKind, GeminiClient, GenerationApi,
    JobResult, VideoJob,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new(ClientSettings {
        api_base: server.uri(),
        api_key: "test-key".to_string(),
        ..ClientSettings::default()
    })
    .unwrap()
}

#[tokio::test]
async fn generate_images_returns_png_data_uris() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/imagen-4.0-generate-001:predict"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "instances": [{ "prompt": "a red fox" }],
            "parameters": { "sampleCount": 4, "aspectRatio": "1:1" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [
                { "bytesBase64Encoded": "QUFB", "mimeType": "image/png" },
                { "bytesBase64Encoded": "QkJC" }
            ]
        })))
        .mount(&server)
        .await;

    let images = client(&server).generate_images("a red fox").await.unwrap();
    assert_eq!(
        images,
        vec![
            "data:image/png;base64,QUFB".to_string(),
            "data:image/png;base64,QkJC".to_string()
        ]
    );
}

#[tokio::test]
async fn api_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/imagen-4.0-generate-001:predict"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "prompt was blocked", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let err = client(&server).generate_images("x").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(400));
    assert_eq!(err.message, "prompt was blocked");
}

#[tokio::test]
async fn edit_image_sends_inline_parts_and_reads_media() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash-image-preview:generateContent"))
        .and(body_partial_json(json!({
            "generationConfig": { "responseModalities": ["IMAGE", "TEXT"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Done." },
                { "inlineData": { "mimeType": "image/png", "data": "RURJ" } }
            ]}}]
        })))
        .mount(&server)
        .await;

    let output = client(&server)
        .edit_image(
            "data:image/png;base64,SU1H",
            "data:image/png;base64,TUFTSw==",
            "make it blue",
        )
        .await
        .unwrap();
    assert_eq!(output.text, "Done.");
    assert_eq!(output.images, vec!["data:image/png;base64,RURJ".to_string()]);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["data"], "SU1H");
    assert_eq!(parts[1]["inlineData"]["data"], "TUFTSw==");
    assert_eq!(parts[2]["text"], "make it blue");
}

#[tokio::test]
async fn video_submit_and_poll_map_operations() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/veo-2.0-generate-001:predictLongRunning"))
        .and(body_partial_json(json!({ "parameters": { "sampleCount": 1 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "operations/op1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1beta/operations/op1"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/op1",
            "done": true,
            "response": { "generateVideoResponse": { "generatedSamples": [
                { "video": { "uri": "https://files.example/v1/clip?alt=media" } }
            ]}}
        })))
        .mount(&server)
        .await;

    let api = client(&server);
    let job = api.submit_video("a drone shot").await.unwrap();
    assert_eq!(job, VideoJob::pending("operations/op1"));

    let done = api.poll_video(&job).await.unwrap();
    assert!(done.done);
    assert_eq!(
        done.result,
        Some(JobResult::Locator("https://files.example/v1/clip?alt=media".to_string()))
    );
}

#[tokio::test]
async fn inspire_returns_text_and_citations() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(body_partial_json(json!({ "tools": [{ "googleSearch": {} }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Brutalism is back." }] },
                "groundingMetadata": { "groundingChunks": [
                    { "web": { "uri": "https://a.example", "title": "A" } },
                    { "web": { "uri": "https://b.example" } }
                ]}
            }]
        })))
        .mount(&server)
        .await;

    let inspiration = client(&server).inspire("web trends").await.unwrap();
    assert_eq!(inspiration.text, "Brutalism is back.");
    assert_eq!(inspiration.sources.len(), 2);
    assert_eq!(inspiration.sources[0].title.as_deref(), Some("A"));
    assert_eq!(inspiration.sources[1].title, None);
}

#[tokio::test]
async fn review_sends_system_instruction_and_rejects_empty_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = client(&server)
        .review_code("fn main() {}", "rust")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .contains("code reviewer"));
    assert!(body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .contains("```rust\nfn main() {}\n```"));
}

#[tokio::test]
async fn stream_chat_yields_chunks_in_order() {
    let server = MockServer::start().await;
    let body = [
        r#"data: {"candidates":[{"content":{"role":"model","parts":[{"text":"Hel"}]}}]}"#,
        "",
        r#"data: {"candidates":[{"content":{"role":"model","parts":[{"text":"lo"}]}}]}"#,
        "",
        r#"data: {"candidates":[{"content":{"role":"model","parts":[{"text":" world"}]}}]}"#,
        "",
        "",
    ]
    .join("\r\n");
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .and(body_partial_json(json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "hi" }] },
                { "role": "model", "parts": [{ "text": "hello" }] },
                { "role": "user", "parts": [{ "text": "say hello world" }] }
            ],
            "generationConfig": { "temperature": 0.5 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let request = ChatRequest {
        system_instruction: "be brief".to_string(),
        temperature: 0.5,
        turns: vec![
            ChatTurn { role: ChatRole::User, text: "hi".to_string() },
            ChatTurn { role: ChatRole::Model, text: "hello".to_string() },
            ChatTurn { role: ChatRole::User, text: "say hello world".to_string() },
        ],
    };
    let chunks: Vec<String> = client(&server)
        .stream_chat(request)
        .await
        .unwrap()
        .map(|chunk| chunk.unwrap())
        .collect()
        .await;
    assert_eq!(chunks, vec!["Hel", "lo", " world"]);
    assert_eq!(chunks.concat(), "Hello world");
}

#[test]
fn result_url_carries_api_key() {
    let api = GeminiClient::new(ClientSettings {
        api_key: "k1".to_string(),
        ..ClientSettings::default()
    })
    .unwrap();
    let url = api
        .result_url("https://files.example/v1/clip?alt=media")
        .unwrap();
    assert_eq!(url, "https://files.example/v1/clip?alt=media&key=k1");
}
