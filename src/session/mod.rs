//! 学习会话模型
//!
//! 一个会话对应「一名学生 × 一个学科」的持续对话，记录当前阶段、理解等级、
//! 连续失败次数与完整消息历史；存储见 [`store`]。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::Subject;

pub mod store;

pub use store::{create_session_store, MemorySessionStore, SessionStore, SqliteSessionStore, StoreError};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 单条消息
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// 理解等级：评估器给出的粗粒度掌握信号，驱动阶段迁移
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeLevel {
    /// 深度理解，可进行迁移测试
    A,
    /// 基本理解，需要更多练习
    B,
    /// 理解不足，需要重新学习
    C,
}

impl GradeLevel {
    /// 解析评估结果里的等级文本；闭集 {A, B, C} 之外一律归一化为 C
    pub fn from_label(label: &str) -> GradeLevel {
        match label.trim().to_uppercase().as_str() {
            "A" => GradeLevel::A,
            "B" => GradeLevel::B,
            _ => GradeLevel::C,
        }
    }
}

/// 会话阶段（状态机的状态）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// 学习中（初始态）
    Learning,
    /// 评估中：有一道练习题等待作答
    Assessing,
    /// 迁移测试：用应用题检验举一反三
    TransferTest,
    /// 已掌握（单主题终态，之后可回到学习）
    Mastered,
    /// 补救教学：连续失败后切换教学策略
    Remediation,
}

/// 学习会话
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub student_id: String,
    pub subject: Subject,
    /// 当前聚焦的主题；学习阶段从消息中识别后绑定
    pub topic_id: Option<String>,
    pub phase: Phase,
    pub current_grade: GradeLevel,
    /// 评估阶段连续答错计数；答对或进入补救教学时清零
    pub consecutive_failures: u32,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(student_id: impl Into<String>, subject: Subject) -> Self {
        let now = Utc::now();
        Self {
            id: format!("session_{}", uuid::Uuid::new_v4()),
            student_id: student_id.into(),
            subject,
            topic_id: None,
            phase: Phase::Learning,
            current_grade: GradeLevel::C,
            consecutive_failures: 0,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 最近 n 条消息（供 LLM 上下文使用）
    pub fn recent_messages(&self, n: usize) -> &[Message] {
        &self.messages[self.messages.len().saturating_sub(n)..]
    }
}
