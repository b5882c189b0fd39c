use serde_json::json;

/// `/api/chat` request body with `(role, content)` history pairs.
pub fn chat_body(message: &str, history: &[(&str, &str)]) -> Vec<u8> {
    let history = history
        .iter()
        .map(|(role, content)| {
            return json!({ "role": role, "content": content });
        })
        .collect::<Vec<_>>();

    return json!({ "message": message, "history": history })
        .to_string()
        .into_bytes();
}

/// Alternating user and assistant turns, `turn 0` through `turn {count - 1}`.
pub fn history_fixture(count: usize) -> Vec<(String, String)> {
    return (0..count)
        .map(|idx| {
            let role = if idx % 2 == 0 { "user" } else { "assistant" };
            return (role.to_string(), format!("turn {idx}"));
        })
        .collect();
}

/// A non-streamed OpenAI style chat completion body.
pub fn completion_fixture(content: &str) -> String {
    return json!({
        "id": "chatcmpl-8c1f2e",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "llama-3.3-70b-versatile",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 42, "completion_tokens": 12, "total_tokens": 54 }
    })
    .to_string();
}

/// Groq's error envelope.
pub fn provider_error_fixture(message: &str, code: &str) -> String {
    return json!({
        "error": {
            "message": message,
            "type": "invalid_request_error",
            "code": code
        }
    })
    .to_string();
}
