use std::collections::BTreeMap;

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::errors::{DroidClawError, DroidClawResult};
use crate::llm::provider::LlmProvider;
use crate::llm::sse_parser;
use crate::llm::types::{
    CallConfig, ChatMessage, FunctionCall, LlmResponse, StreamChunkKind, ToolCall, ToolDef,
};

/// Longest request body written to the debug log.
const MAX_LOGGED_BODY: usize = 4096;

pub struct OpenAiCompatibleProvider {
    id: String,
    api_base: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(id: String, api_base: String, api_key: String) -> Self {
        Self {
            id,
            api_base,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.id
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDef>,
        cfg: &CallConfig,
    ) -> DroidClawResult<LlmResponse> {
        let mut body = serde_json::json!({
            "model": cfg.model,
            "messages": &messages,
            "stream": cfg.stream,
            "temperature": cfg.temperature,
        });

        if !tools.is_empty() {
            body["tools"] = serde_json::to_value(&tools)?;
            body["tool_choice"] = serde_json::json!("auto");
        }

        tracing::debug!(
            provider = %self.id,
            model = %cfg.model,
            stream = cfg.stream,
            messages = messages.len(),
            "sending LLM request"
        );
        tracing::debug!(
            body = %{
                // Screen dumps make the body large; only the head is useful in logs.
                let text = body.to_string();
                match text.char_indices().nth(MAX_LOGGED_BODY) {
                    Some((cut, _)) => format!("{}…", &text[..cut]),
                    None => text,
                }
            },
            "request body"
        );

        let mut request = self.client.post(&self.api_base).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(DroidClawError::LlmProvider(format!("{}: {}", status, err_body)));
        }

        if cfg.stream {
            self.handle_stream(response).await
        } else {
            let json: serde_json::Value = response.json().await?;
            let parsed = parse_completion(&json)?;
            tracing::info!(
                content_len = parsed.content.len(),
                tool_calls = parsed.tool_calls.len(),
                "LLM JSON response received"
            );
            Ok(parsed)
        }
    }
}

impl OpenAiCompatibleProvider {
    /// Handle SSE streaming response, accumulating the full reply.
    async fn handle_stream(&self, response: reqwest::Response) -> DroidClawResult<LlmResponse> {
        let mut byte_stream = response.bytes_stream();
        let mut lines = SseLines::default();
        let mut acc = StreamAccumulator::default();
        let mut done = false;

        'stream: while let Some(result) = byte_stream.next().await {
            let bytes = result?;
            for line in lines.push(&bytes) {
                if acc.apply(&line) {
                    done = true;
                    break 'stream;
                }
            }
        }
        if !done {
            if let Some(line) = lines.finish() {
                acc.apply(&line);
            }
        }

        let response = acc.into_response();
        tracing::info!(
            content_len = response.content.len(),
            reasoning_len = response.reasoning.len(),
            tool_calls = response.tool_calls.len(),
            tools = ?response.tool_calls.iter().map(|tc| tc.function.name.as_str()).collect::<Vec<_>>(),
            "LLM stream complete"
        );
        Ok(response)
    }
}

/// Splits a byte stream into lines. Bytes are buffered until a full line is
/// present, so a UTF-8 sequence split across network chunks decodes intact.
#[derive(Default)]
struct SseLines {
    buf: Vec<u8>,
}

impl SseLines {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&raw).trim().to_string());
        }
        lines
    }

    /// Whatever is left once the stream ends without a final newline.
    fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buf);
        let line = String::from_utf8_lossy(&rest).trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}

#[derive(Default)]
struct StreamAccumulator {
    content: String,
    reasoning: String,
    // delta index → (id, type, name, accumulated_arguments)
    tool_calls: BTreeMap<usize, (String, String, String, String)>,
}

impl StreamAccumulator {
    /// Fold one SSE line into the reply. Returns true on `[DONE]`.
    fn apply(&mut self, line: &str) -> bool {
        if line.is_empty() {
            return false;
        }
        match sse_parser::parse_sse_line(line) {
            Ok(Some(chunk)) => match chunk.kind {
                StreamChunkKind::Reasoning => self.reasoning.push_str(&chunk.content),
                StreamChunkKind::Content => self.content.push_str(&chunk.content),
                StreamChunkKind::ToolCall => {
                    merge_tool_call_deltas(&chunk.content, &mut self.tool_calls)
                }
                StreamChunkKind::Done => return true,
            },
            Ok(None) => {}
            Err(e) => {
                tracing::debug!("SSE parse skipped: {e}");
            }
        }
        false
    }

    fn into_response(self) -> LlmResponse {
        LlmResponse {
            content: self.content,
            reasoning: self.reasoning,
            tool_calls: build_tool_calls(self.tool_calls),
        }
    }
}

/// Extract content and tool calls from a non-streaming chat completion body.
pub(crate) fn parse_completion(json: &serde_json::Value) -> DroidClawResult<LlmResponse> {
    let message = &json["choices"][0]["message"];
    if message.is_null() {
        return Err(DroidClawError::LlmProvider(format!(
            "response has no choices[0].message: {json}"
        )));
    }

    let content = message["content"].as_str().unwrap_or("").to_string();
    let reasoning = message["reasoning_content"].as_str().unwrap_or("").to_string();

    let tool_calls: Vec<ToolCall> = message["tool_calls"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter(|tc| tc["function"]["name"].as_str().is_some_and(|n| !n.is_empty()))
                .map(|tc| ToolCall {
                    id: call_id_or_generated(tc["id"].as_str().unwrap_or("")),
                    call_type: tc["type"].as_str().unwrap_or("function").to_string(),
                    function: FunctionCall {
                        name: tc["function"]["name"].as_str().unwrap_or("").to_string(),
                        arguments: tc["function"]["arguments"]
                            .as_str()
                            .unwrap_or("{}")
                            .to_string(),
                    },
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(LlmResponse {
        content,
        reasoning,
        tool_calls,
    })
}

/// Tool results must reference their call; some providers leave the id empty.
fn call_id_or_generated(id: &str) -> String {
    if id.is_empty() {
        format!("call_{}", uuid::Uuid::new_v4().simple())
    } else {
        id.to_string()
    }
}

/// Merge streaming tool-call delta fragments into the accumulator map (keyed by delta index).
fn merge_tool_call_deltas(
    chunk_content: &str,
    builders: &mut BTreeMap<usize, (String, String, String, String)>,
) {
    let Ok(deltas) = serde_json::from_str::<Vec<serde_json::Value>>(chunk_content) else {
        return;
    };
    for delta in deltas {
        let idx = delta["index"].as_u64().unwrap_or(0) as usize;
        let entry = builders.entry(idx).or_default();

        if let Some(id) = delta["id"].as_str() {
            if !id.is_empty() {
                entry.0 = id.to_string();
            }
        }
        if let Some(t) = delta["type"].as_str() {
            if !t.is_empty() {
                entry.1 = t.to_string();
            }
        }
        if let Some(name) = delta["function"]["name"].as_str() {
            if !name.is_empty() {
                entry.2.push_str(name);
            }
        }
        if let Some(args) = delta["function"]["arguments"].as_str() {
            entry.3.push_str(args);
        }
    }
}

/// Convert accumulated tool-call builders into typed `ToolCall` structs.
fn build_tool_calls(
    builders: BTreeMap<usize, (String, String, String, String)>,
) -> Vec<ToolCall> {
    builders
        .into_values()
        .filter(|(_, _, name, _)| !name.is_empty())
        .map(|(id, call_type, name, arguments)| ToolCall {
            id: call_id_or_generated(&id),
            call_type: if call_type.is_empty() {
                "function".to_string()
            } else {
                call_type
            },
            function: FunctionCall {
                name,
                arguments: if arguments.trim().is_empty() {
                    "{}".to_string()
                } else {
                    arguments
                },
            },
        })
        .collect()
}
