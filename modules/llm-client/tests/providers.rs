//! Provider wire tests against mock endpoints.

use httpmock::prelude::*;
use llm_client::{GeminiJudge, JudgmentProvider, OpenAiJudge};
use serde_json::json;

#[tokio::test]
async fn openai_judge_parses_json_content() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "{\"score\": 85, \"rationale\": \"solid\"}"
                    }
                }]
            }));
        })
        .await;

    let judge = OpenAiJudge::new("test-key", "gpt-4o").with_base_url(server.base_url());
    let value = judge.judge("You are a judge.", "Evaluate this.").await.unwrap();

    assert_eq!(value["score"], 85);
    assert_eq!(value["rationale"], "solid");
}

#[tokio::test]
async fn openai_judge_strips_code_fences() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "```json\n{\"score\": 40}\n```"
                    }
                }]
            }));
        })
        .await;

    let judge = OpenAiJudge::new("test-key", "gpt-4o").with_base_url(server.base_url());
    let value = judge.judge("sys", "user").await.unwrap();

    assert_eq!(value["score"], 40);
}

#[tokio::test]
async fn openai_judge_surfaces_api_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429).body("{\"error\": {\"message\": \"rate limited\"}}");
        })
        .await;

    let judge = OpenAiJudge::new("test-key", "gpt-4o").with_base_url(server.base_url());
    let err = judge.judge("sys", "user").await.unwrap_err();

    assert!(err.to_string().contains("429"));
}

#[tokio::test]
async fn gemini_judge_parses_candidate_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/gemini-2.0-flash:generateContent");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {
                        "parts": [{ "text": "{\"score\": 72, \"analysis\": \"ok\"}" }],
                        "role": "model"
                    }
                }]
            }));
        })
        .await;

    let judge = GeminiJudge::new("test-key", "gemini-2.0-flash").with_base_url(server.base_url());
    let value = judge.judge("sys", "user").await.unwrap();

    assert_eq!(value["score"], 72);
}

#[tokio::test]
async fn gemini_judge_errors_on_empty_candidates() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/gemini-2.0-flash:generateContent");
            then.status(200).json_body(json!({ "candidates": [] }));
        })
        .await;

    let judge = GeminiJudge::new("test-key", "gemini-2.0-flash").with_base_url(server.base_url());
    assert!(judge.judge("sys", "user").await.is_err());
}
