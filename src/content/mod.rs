//! 学科内容库
//!
//! 题目、知识点与主题的内存存储，预置内容见 [`preset`]。内容由外部工具编写，
//! 对编排层只读；编排层只通过本模块的查询接口取数。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod preset;

/// 学科
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Chinese,
    Math,
    English,
    History,
    Politics,
}

impl Subject {
    pub const ALL: [Subject; 5] = [
        Subject::Chinese,
        Subject::Math,
        Subject::English,
        Subject::History,
        Subject::Politics,
    ];

    /// 中文显示名
    pub fn display_name(&self) -> &'static str {
        match self {
            Subject::Chinese => "语文",
            Subject::Math => "数学",
            Subject::English => "英语",
            Subject::History => "历史",
            Subject::Politics => "政治",
        }
    }

    /// 从英文标识或中文名解析
    pub fn parse(s: &str) -> Option<Subject> {
        match s.trim().to_lowercase().as_str() {
            "chinese" | "语文" => Some(Subject::Chinese),
            "math" | "数学" => Some(Subject::Math),
            "english" | "英语" => Some(Subject::English),
            "history" | "历史" => Some(Subject::History),
            "politics" | "政治" => Some(Subject::Politics),
            _ => None,
        }
    }
}

/// 题目类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// 选择题
    Choice,
    /// 判断题
    Judgment,
    /// 问答题
    Qa,
    /// 填空题
    Fill,
    /// 应用题（常用于迁移测试）
    Application,
}

impl QuestionType {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::Choice => "选择题",
            QuestionType::Judgment => "判断题",
            QuestionType::Qa => "问答题",
            QuestionType::Fill => "填空题",
            QuestionType::Application => "应用题",
        }
    }
}

/// 题目（只读内容记录）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub subject: Subject,
    pub topic_id: String,
    pub topic_name: String,
    pub question_type: QuestionType,
    /// 难度 1-5
    pub difficulty: u8,
    pub content: String,
    /// 选择题选项，按原始顺序展示
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    pub explanation: String,
    /// 迁移测试题只在迁移测试阶段使用
    pub is_transfer: bool,
    pub created_at: DateTime<Utc>,
}

/// 知识点：只作为生成服务的上下文，编排层不在其字段上分支
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: String,
    pub subject: Subject,
    pub topic_id: String,
    pub topic_name: String,
    pub title: String,
    pub content: String,
    pub key_points: Vec<String>,
    /// 常见误区
    pub common_mistakes: Vec<String>,
    /// 直觉泵 / 教学提示
    pub intuition_pumps: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// 主题（从知识点聚合而来）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
}

/// 内容库：题目与知识点的内存存储
#[derive(Default)]
pub struct ContentStore {
    questions: HashMap<String, Question>,
    knowledge: HashMap<String, KnowledgeItem>,
}

impl ContentStore {
    /// 空内容库（测试用）
    pub fn new() -> Self {
        Self::default()
    }

    /// 带预置内容的内容库
    pub fn with_preset() -> Self {
        let mut store = Self::new();
        preset::seed(&mut store);
        store
    }

    pub fn add_question(&mut self, q: Question) {
        self.questions.insert(q.id.clone(), q);
    }

    pub fn add_knowledge(&mut self, k: KnowledgeItem) {
        self.knowledge.insert(k.id.clone(), k);
    }

    pub fn get_question(&self, id: &str) -> Option<&Question> {
        self.questions.get(id)
    }

    pub fn all_questions(&self) -> Vec<Question> {
        self.questions.values().cloned().collect()
    }

    pub fn all_knowledge(&self) -> Vec<KnowledgeItem> {
        self.knowledge.values().cloned().collect()
    }

    /// 某学科的全部题目
    pub fn questions_for_subject(&self, subject: Subject) -> Vec<Question> {
        self.questions
            .values()
            .filter(|q| q.subject == subject)
            .cloned()
            .collect()
    }

    /// 某主题的全部题目
    pub fn questions_for_topic(&self, subject: Subject, topic_id: &str) -> Vec<Question> {
        self.questions
            .values()
            .filter(|q| q.subject == subject && q.topic_id == topic_id)
            .cloned()
            .collect()
    }

    /// 某主题的迁移测试题
    pub fn transfer_questions(&self, subject: Subject, topic_id: &str) -> Vec<Question> {
        self.questions
            .values()
            .filter(|q| q.subject == subject && q.topic_id == topic_id && q.is_transfer)
            .cloned()
            .collect()
    }

    /// 某学科的全部知识点
    pub fn knowledge_for_subject(&self, subject: Subject) -> Vec<KnowledgeItem> {
        self.knowledge
            .values()
            .filter(|k| k.subject == subject)
            .cloned()
            .collect()
    }

    /// 某学科的主题列表（按知识点聚合去重，按 id 排序保证稳定输出）
    pub fn topics_for_subject(&self, subject: Subject) -> Vec<Topic> {
        let mut topics: HashMap<&str, &str> = HashMap::new();
        for k in self.knowledge.values() {
            if k.subject == subject {
                topics.insert(&k.topic_id, &k.topic_name);
            }
        }
        let mut result: Vec<Topic> = topics
            .into_iter()
            .map(|(id, name)| Topic {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
        result.sort_by(|a, b| a.id.cmp(&b.id));
        result
    }

    pub fn question_count(&self, subject: Subject) -> usize {
        self.questions.values().filter(|q| q.subject == subject).count()
    }

    pub fn knowledge_count(&self, subject: Subject) -> usize {
        self.knowledge.values().filter(|k| k.subject == subject).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_parse() {
        assert_eq!(Subject::parse("math"), Some(Subject::Math));
        assert_eq!(Subject::parse("语文"), Some(Subject::Chinese));
        assert_eq!(Subject::parse(" English "), Some(Subject::English));
        assert_eq!(Subject::parse("physics"), None);
    }

    #[test]
    fn test_preset_covers_all_subjects() {
        let store = ContentStore::with_preset();
        for subject in Subject::ALL {
            assert!(store.question_count(subject) >= 3, "{:?} 题目不足", subject);
            assert!(store.knowledge_count(subject) >= 2, "{:?} 知识点不足", subject);
            assert!(!store.topics_for_subject(subject).is_empty());
        }
    }

    #[test]
    fn test_transfer_questions_filtered() {
        let store = ContentStore::with_preset();
        for subject in Subject::ALL {
            for topic in store.topics_for_subject(subject) {
                for q in store.transfer_questions(subject, &topic.id) {
                    assert!(q.is_transfer);
                }
            }
        }
        // 学科全集里必须既有普通题也有迁移题
        let all = store.questions_for_subject(Subject::Math);
        assert!(all.iter().any(|q| q.is_transfer));
        assert!(all.iter().any(|q| !q.is_transfer));
    }

    #[test]
    fn test_topics_sorted_and_deduped() {
        let store = ContentStore::with_preset();
        let topics = store.topics_for_subject(Subject::Chinese);
        let mut ids: Vec<&str> = topics.iter().map(|t| t.id.as_str()).collect();
        let original = ids.clone();
        ids.sort();
        ids.dedup();
        assert_eq!(original, ids);
    }
}
