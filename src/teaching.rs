//! 教学内容生成
//!
//! 把学科知识库拼成系统提示词，调用生成服务产出：苏格拉底式讲解、
//! 针对当前题目的三层提示、连续失败后的补救教学内容，以及学科欢迎语。
//! 服务失败或超时一律降级为可见的提示语，不向上抛错。

use std::sync::Arc;
use std::time::Duration;

use crate::content::{KnowledgeItem, Question, Subject, Topic};
use crate::grading::ErrorCategory;
use crate::llm::{complete_with_timeout, service_unavailable_reply, LlmClient};
use crate::session::{Message, Session};

/// 教学生成器
pub struct Instructor {
    llm: Arc<dyn LlmClient>,
    request_timeout: Duration,
    /// 送入 LLM 的历史消息条数上限
    max_context_messages: usize,
}

impl Instructor {
    pub fn new(llm: Arc<dyn LlmClient>, request_timeout: Duration, max_context_messages: usize) -> Self {
        Self {
            llm,
            request_timeout,
            max_context_messages,
        }
    }

    /// 学科导师的系统提示词：角色设定 + 当前学科知识库
    fn system_prompt(&self, subject: Subject, knowledge: &[KnowledgeItem]) -> String {
        let mut knowledge_text = String::new();
        for k in knowledge {
            knowledge_text.push_str(&format!(
                "【知识点:{}】\n主题:{}\n内容:{}\n要点:{}\n常见误区:{}\n教学提示:{}\n---\n",
                k.title,
                k.topic_name,
                k.content,
                k.key_points.join("、"),
                k.common_mistakes.join("、"),
                k.intuition_pumps.join("、"),
            ));
        }

        format!(
            "你是一位专业的{}学科 AI 导师，具有丰富的教学经验。\n\n\
             ## 你的教学风格\n\
             1. 采用苏格拉底式提问法，引导学生思考\n\
             2. 善于用生动的比喻和实例解释抽象概念\n\
             3. 根据学生的理解程度调整教学策略\n\
             4. 对学生的回答给予建设性反馈\n\n\
             ## 当前学科知识库\n{}\n\
             ## 教学原则\n\
             1. 从简单到复杂，循序渐进\n\
             2. 多用“你觉得呢？”“为什么会这样？”等引导性问题\n\
             3. 及时发现并纠正学生的误区\n\
             4. 知识点讲解完毕后，主动提出进行练习\n\n\
             ## 输出要求\n\
             - 使用简洁明了的语言，适当使用 emoji 增加亲和力\n\
             - 每次回复不超过300字\n\
             - 直接发送要回应的内容，不要展示思考过程",
            subject.display_name(),
            knowledge_text,
        )
    }

    /// 正常教学回复：系统提示 + 截断的近期对话历史
    ///
    /// 调度器已把本轮用户消息写入历史，这里不再重复追加。
    pub async fn teach(
        &self,
        session: &Session,
        knowledge: &[KnowledgeItem],
    ) -> String {
        let mut messages = vec![Message::system(self.system_prompt(session.subject, knowledge))];
        messages.extend_from_slice(session.recent_messages(self.max_context_messages));

        self.generate(&messages).await
    }

    /// 连续失败后的补救教学：换一种讲法，按推断的错误类别调整策略
    pub async fn remediate(
        &self,
        session: &Session,
        topic_name: &str,
        failures: u32,
        category: Option<ErrorCategory>,
        knowledge: &[KnowledgeItem],
    ) -> String {
        let category_line = match category {
            Some(c) => format!("学生的主要问题是：{}。\n", c.description()),
            None => String::new(),
        };
        let prompt = format!(
            "学生在学习“{}”时已经连续失败{}次，请切换教学策略：\n{}\n\
             1. 用更简单的语言重新解释核心概念\n\
             2. 提供一个更生活化的例子\n\
             3. 将知识点拆分成更小的步骤\n\
             4. 给予学生鼓励\n\n\
             请生成补救教学内容：",
            topic_name, failures, category_line,
        );

        let messages = vec![
            Message::system(self.system_prompt(session.subject, knowledge)),
            Message::user(prompt),
        ];
        self.generate(&messages).await
    }

    /// 为当前题目生成三层提示（不直接给最终答案或选项字母）
    pub async fn hints_for(
        &self,
        session: &Session,
        question: &Question,
        knowledge: &[KnowledgeItem],
    ) -> String {
        let options_text = question
            .options
            .as_ref()
            .map(|opts| format!("选项：{}\n", opts.join("\n")))
            .unwrap_or_default();

        let prompt = format!(
            "你正在辅导学生解题。学生希望获得提示，但你不能直接给出最终答案或选项字母。\n\n\
             题目类型：{}\n题目：{}\n{}\n\
             要求：\n\
             - 输出三个层次的提示\n\
             - 只给思路/方法/检查要点，不要直接说正确答案是什么\n\
             - 严格使用格式：\n\n\
             【解题提示】\n\
             提示1（思路引导）: ...\n\
             提示2（方法建议）: ...\n\
             提示3（检查要点）: ...",
            question.question_type.label(),
            question.content,
            options_text,
        );

        let messages = vec![
            Message::system(self.system_prompt(session.subject, knowledge)),
            Message::user(prompt),
        ];
        self.generate(&messages).await
    }

    /// 学科欢迎语（创建会话时使用，不经过生成服务）
    pub fn welcome_message(&self, subject: Subject, topics: &[Topic]) -> String {
        let topic_list = topics
            .iter()
            .map(|t| format!("  • {}", t.name))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "👋 欢迎来到 {name} 学习空间！\n\n\
             我是你的 AI 学习导师，将陪伴你一起学习和进步。\n\n\
             📚 当前可学习的主题：\n{topics}\n\n\
             💡 你可以：\n\
             1. 直接告诉我你想学习什么\n\
             2. 问我任何关于 {name} 的问题\n\
             3. 让我给你出题练习\n\n\
             准备好了吗？让我们开始学习之旅！🚀",
            name = subject.display_name(),
            topics = topic_list,
        )
    }

    async fn generate(&self, messages: &[Message]) -> String {
        match complete_with_timeout(self.llm.as_ref(), messages, self.request_timeout).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("teaching generation failed: {}", e);
                service_unavailable_reply(&e)
            }
        }
    }
}
