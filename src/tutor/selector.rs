//! 选题与题面渲染
//!
//! 评估阶段只从非迁移题中选，迁移测试只从迁移题中选；会话绑定了主题时
//! 按主题取题，否则全学科取题，均为等概率随机。

use rand::seq::IndexedRandom;

use crate::content::{ContentStore, Question};
use crate::session::Session;

/// 为评估阶段选一道练习题（排除迁移题）
pub(super) fn pick_assessment_question(store: &ContentStore, session: &Session) -> Option<Question> {
    let mut pool = match &session.topic_id {
        Some(topic_id) => store.questions_for_topic(session.subject, topic_id),
        None => store.questions_for_subject(session.subject),
    };
    pool.retain(|q| !q.is_transfer);
    pool.choose(&mut rand::rng()).cloned()
}

/// 为迁移测试选一道迁移题；无主题时在全学科范围按迁移标记过滤
pub(super) fn pick_transfer_question(store: &ContentStore, session: &Session) -> Option<Question> {
    let pool = match &session.topic_id {
        Some(topic_id) => store.transfer_questions(session.subject, topic_id),
        None => {
            let mut all = store.questions_for_subject(session.subject);
            all.retain(|q| q.is_transfer);
            all
        }
    };
    pool.choose(&mut rand::rng()).cloned()
}

/// 渲染题面：类型标签、难度星级、题干与原始顺序的选项
pub(super) fn format_question(question: &Question) -> String {
    let mut text = format!(
        "【{}】难度：{}\n\n{}\n",
        question.question_type.label(),
        "⭐".repeat(usize::from(question.difficulty.max(1))),
        question.content,
    );
    if let Some(options) = &question.options {
        text.push('\n');
        for opt in options {
            text.push_str(opt);
            text.push('\n');
        }
    }
    text
}
