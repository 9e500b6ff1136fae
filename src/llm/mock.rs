//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 可预先脚本化一组回复（评估 JSON、讲解文本等），按顺序弹出；
//! 脚本耗尽后回显最后一条 User 消息，便于离线跑通完整学习循环。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::session::{Message, Role};

/// Mock 客户端：先吐脚本化回复，再回显用户输入
#[derive(Debug, Default)]
pub struct MockLlmClient {
    responses: Mutex<VecDeque<String>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一组按顺序返回的回复
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
        }
    }

    pub fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().unwrap().push_back(response.into());
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        if let Some(scripted) = self.responses.lock().unwrap().pop_front() {
            return Ok(scripted);
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        Ok(format!("（Mock 回复）{}", last_user))
    }
}
