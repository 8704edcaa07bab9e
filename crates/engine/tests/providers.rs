use std::time::Duration;

use courier_engine::provider::{OllamaProvider, OpenAiCompatProvider};
use courier_engine::{Message, ModelProvider, ModelReply, ModelRequest, ProviderError, ToolCall, ToolPolicy};
use courier_shared::toolbelts::default_registry;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request<'a>(messages: &'a [Message], tools: &'a [courier_shared::Tool]) -> ModelRequest<'a> {
    ModelRequest {
        model: "test-model",
        messages,
        tools,
        policy: ToolPolicy::default(),
        iteration: 2,
    }
}

fn openai(server: &MockServer) -> OpenAiCompatProvider {
    OpenAiCompatProvider::new("groq", "test-key", &format!("{}/v1", server.uri()), Duration::from_secs(5))
        .unwrap()
}

#[tokio::test]
async fn openai_sends_auto_policy_and_parses_tool_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "tool_choice": "auto",
            "parallel_tool_calls": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        { "id": "call_a", "type": "function",
                          "function": { "name": "get_weather", "arguments": "{\"city\":\"Tokyo\"}" } },
                        { "id": "call_b", "type": "function",
                          "function": { "name": "get_weather", "arguments": { "city": "London" } } }
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .mount(&server)
        .await;

    let tools = default_registry().unwrap().tools();
    let messages = vec![Message::system("sys"), Message::user("Weather in Tokyo and London?")];
    let reply = openai(&server).complete(request(&messages, &tools)).await.unwrap();

    assert_eq!(
        reply,
        ModelReply::ToolCalls(vec![
            ToolCall::new("call_a", "get_weather", r#"{"city":"Tokyo"}"#),
            ToolCall::new("call_b", "get_weather", r#"{"city":"London"}"#),
        ])
    );

    let received = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "Weather in Tokyo and London?");
    assert_eq!(body["tools"].as_array().unwrap().len(), 3);
    assert_eq!(body["tools"][0]["type"], "function");
}

#[tokio::test]
async fn openai_text_reply_is_an_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Paris." } }]
        })))
        .mount(&server)
        .await;

    let messages = vec![Message::user("Capital of France?")];
    let reply = openai(&server).complete(request(&messages, &[])).await.unwrap();
    assert_eq!(reply, ModelReply::Answer("Paris.".into()));

    let received = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert!(body.get("tools").is_none());
    assert!(body.get("tool_choice").is_none());
}

#[tokio::test]
async fn openai_http_errors_surface_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let messages = vec![Message::user("hi")];
    let err = openai(&server).complete(request(&messages, &[])).await.unwrap_err();
    match err {
        ProviderError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn openai_without_choices_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let messages = vec![Message::user("hi")];
    let err = openai(&server).complete(request(&messages, &[])).await.unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse(_)));

    server.reset().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;
    let err = openai(&server).complete(request(&messages, &[])).await.unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse(_)));
}

#[tokio::test]
async fn ollama_synthesizes_call_ids_and_encodes_arguments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({ "model": "test-model", "stream": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "test-model",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    { "function": { "name": "calculate", "arguments": { "expression": "42 * 17 + 3" } } },
                    { "function": { "name": "get_weather", "arguments": { "city": "Paris" } } }
                ]
            },
            "done": true
        })))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let tools = default_registry().unwrap().tools();
    let messages = vec![Message::user("go")];
    let reply = provider.complete(request(&messages, &tools)).await.unwrap();

    assert_eq!(
        reply,
        ModelReply::ToolCalls(vec![
            ToolCall::new("call_2_0", "calculate", r#"{"expression":"42 * 17 + 3"}"#),
            ToolCall::new("call_2_1", "get_weather", r#"{"city":"Paris"}"#),
        ])
    );
}

#[tokio::test]
async fn ollama_plain_reply_is_an_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "role": "assistant", "content": "It's 15°C and cloudy in Paris." },
            "done": true
        })))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let messages = vec![Message::user("weather?")];
    let reply = provider.complete(request(&messages, &[])).await.unwrap();
    assert_eq!(reply, ModelReply::Answer("It's 15°C and cloudy in Paris.".into()));
}
