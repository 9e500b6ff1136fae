//! Shifu - Rust AI 导学系统
//!
//! 以「教学 → 评估 → 迁移测试 → 补救教学」四阶段循环带领学生掌握知识点。
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **content**: 学科内容库（主题、题目、知识点）与预置内容
//! - **session**: 学习会话模型与会话存储（内存 / SQLite）
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **intent**: 轻量意图识别（想练习 / 想要提示）
//! - **grading**: 答案评估（结构化结果解析 + 规则兜底）
//! - **teaching**: 教学内容生成（讲解、分层提示、补救教学、欢迎语）
//! - **tutor**: 四阶段编排（状态机调度、选题、回合结果）

pub mod config;
pub mod content;
pub mod grading;
pub mod intent;
pub mod llm;
pub mod session;
pub mod teaching;
pub mod tutor;

pub use tutor::{Tutor, TurnResult};
