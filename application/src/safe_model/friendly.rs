//! User-facing error message generation.
//!
//! When an invocation fails, a short, non-technical explanation is
//! generated by a side-channel call to the *base* client — never the
//! active one, which may be in the misconfigured state that caused the
//! failure in the first place. This module never propagates an error:
//! any problem yields the fixed fallback sentence.

use crate::ports::chat_model::ChatModel;
use counsel_domain::{ErrorKind, Message};
use tracing::warn;

/// Fixed sentence substituted whenever generation itself fails.
pub const FALLBACK_MESSAGE: &str =
    "죄송합니다. 일시적인 오류가 발생했습니다. 잠시 후 다시 시도해 주세요.";

/// Raw technical vocabulary that must never reach the user.
///
/// Matched case-insensitively against the generated reply; a hit discards
/// the reply in favor of [`FALLBACK_MESSAGE`].
pub const BANNED_TERMS: &[&str] = &[
    "api",
    "http",
    "status code",
    "content filter",
    "rate limit",
    "endpoint",
    "exception",
    "traceback",
    "400",
    "401",
    "403",
    "429",
    "500",
    "502",
    "503",
];

const SYSTEM_PROMPT: &str = "당신은 보험 상담 AI 어시스턴트입니다.
현재 고객의 질문을 처리하는 중 기술적인 문제가 발생했습니다.
고객에게 상황을 정중하고 친절하게 설명하고, 적절한 대안을 제시해야 합니다.

**톤앤매너:**
- 정중하고 친절한 어조
- 사과의 표현 포함 (과도하지 않게)
- 긍정적이고 해결 지향적
- 2-3문장으로 간결하게

**피해야 할 표현:**
- 기술 용어 (API, 400 error, content filter 등)
- 시스템 내부 동작 설명
";

/// Generate a short apology-and-retry explanation for a failed invocation.
///
/// Issues one call against `base` with the fixed persona instruction and
/// the raw error embedded in the user turn. Never fails.
pub async fn generate(base: &dyn ChatModel, kind: ErrorKind, raw_message: &str) -> String {
    let instruction = format!(
        "**발생한 에러:**\n{raw_message}\n\n**에러 타입:**\n{kind}\n\n\
         위 정보를 바탕으로, 고객에게 보낼 친절하고 정중한 안내 문구를 2-3문장으로 작성해주세요."
    );
    let messages = [Message::system(SYSTEM_PROMPT), Message::user(instruction)];

    match base.invoke(&messages).await {
        Ok(reply) => {
            let reply = reply.trim();
            if reply.is_empty() || contains_banned_term(reply) {
                FALLBACK_MESSAGE.to_string()
            } else {
                reply.to_string()
            }
        }
        Err(e) => {
            warn!("friendly message generation failed: {e}");
            FALLBACK_MESSAGE.to_string()
        }
    }
}

/// Case-insensitive scan for raw technical vocabulary.
pub fn contains_banned_term(text: &str) -> bool {
    let lowered = text.to_lowercase();
    BANNED_TERMS.iter().any(|term| lowered.contains(term))
}
