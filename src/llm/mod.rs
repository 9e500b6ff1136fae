//! LLM 客户端抽象与实现
//!
//! 生成服务只有一个能力：给定消息序列返回一段文本。教学讲解、提示生成、
//! 补救内容与答案评估都经由它；失败与超时一律降级为学生可读的提示语。

pub mod mock;
pub mod openai;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use traits::LlmClient;

use crate::config::AppConfig;
use crate::session::Message;

/// 按配置创建 LLM 客户端；无 API Key 时退回 Mock（便于离线试用）
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let api_key = std::env::var("SHIFU_API_KEY")
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .ok();

    if provider != "mock" && api_key.is_some() {
        tracing::info!("Using OpenAI-compatible LLM ({})", cfg.llm.model);
        Arc::new(OpenAiClient::new(
            cfg.llm.base_url.as_deref(),
            &cfg.llm.model,
            api_key.as_deref(),
        ))
    } else {
        tracing::warn!("No API key set or provider=mock, using Mock LLM");
        Arc::new(MockLlmClient::new())
    }
}

/// 限时补全：超时计入普通错误，由调用方降级处理
pub async fn complete_with_timeout(
    llm: &dyn LlmClient,
    messages: &[Message],
    timeout: Duration,
) -> Result<String, String> {
    match tokio::time::timeout(timeout, llm.complete(messages)).await {
        Ok(result) => result,
        Err(_) => Err(format!("request timed out after {}s", timeout.as_secs())),
    }
}

/// 生成服务不可用时回给学生的提示语
pub fn service_unavailable_reply(err: &str) -> String {
    format!("AI 服务暂时不可用，请检查配置。错误信息：{}", err)
}
