//! Streaming follow-up chat over the Gemini `streamGenerateContent` SSE
//! endpoint.
//!
//! Each call opens a fresh channel scoped to the seed turns plus the prior
//! live turns; fragments are forwarded in arrival order and the stream is
//! finite and not restartable.

use crate::gemini_client::{
    BASE_URL, Content, GeminiClient, GenerateContentRequest, GenerateContentResponse, Part,
    map_http_error,
};
use futures::StreamExt;
use mathmate_core::capability::{ChatCapability, ChunkStream};
use mathmate_core::conversation::ChatTurn;
use mathmate_core::error::{MathMateError, Result};
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

/// [`ChatCapability`] implementation backed by a [`GeminiClient`].
#[derive(Clone)]
pub struct GeminiChatClient {
    client: GeminiClient,
}

impl GeminiChatClient {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    fn turn_to_content(turn: &ChatTurn) -> Content {
        Content {
            role: turn.role.as_str().to_string(),
            parts: vec![Part::Text {
                text: turn.text.clone(),
            }],
        }
    }
}

#[async_trait::async_trait]
impl ChatCapability for GeminiChatClient {
    async fn send_streaming(
        &self,
        seed_turns: &[ChatTurn],
        system_instruction: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<ChunkStream> {
        let mut contents: Vec<Content> = seed_turns
            .iter()
            .chain(history.iter())
            .map(Self::turn_to_content)
            .collect();
        contents.push(Self::turn_to_content(&ChatTurn::user(message)));

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(Content {
                role: "system".to_string(),
                parts: vec![Part::Text {
                    text: system_instruction.to_string(),
                }],
            }),
        };

        let url = format!(
            "{}/{model}:streamGenerateContent?alt=sse&key={api_key}",
            BASE_URL,
            model = self.client.model(),
            api_key = self.client.api_key()
        );

        let response = self
            .client
            .http()
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                MathMateError::transport(format!("Gemini streaming request failed: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let (tx, rx) = tokio::sync::mpsc::channel::<Result<String>>(32);
        let mut bytes = response.bytes_stream();

        tokio::spawn(async move {
            let mut buffer = String::new();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        buffer.push_str(&String::from_utf8_lossy(&chunk));
                        while let Some(pos) = buffer.find('\n') {
                            let line: String = buffer.drain(..=pos).collect();
                            if let Some(text) = parse_sse_line(line.trim_end()) {
                                if tx.send(Ok(text)).await.is_err() {
                                    return; // receiver dropped interest
                                }
                            }
                        }
                    }
                    Err(err) => {
                        debug!(error = %err, "chat stream failed mid-flight");
                        let _ = tx
                            .send(Err(MathMateError::stream(format!(
                                "Gemini stream failed: {err}"
                            ))))
                            .await;
                        return;
                    }
                }
            }
            // Trailing data without a newline terminator.
            if let Some(text) = parse_sse_line(buffer.trim_end()) {
                let _ = tx.send(Ok(text)).await;
            }
        });

        Ok(ReceiverStream::new(rx).boxed())
    }
}

/// Extracts the text fragment from one SSE line, if it carries one.
///
/// Lines look like `data: {GenerateContentResponse json}`; blank lines and
/// non-data lines are skipped, as are chunks without a text part.
fn parse_sse_line(line: &str) -> Option<String> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }

    let response: GenerateContentResponse = serde_json::from_str(payload).ok()?;
    response
        .candidates?
        .pop()?
        .content?
        .parts
        .into_iter()
        .find_map(|part| part.text)
}
