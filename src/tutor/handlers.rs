//! 阶段处理器
//!
//! 每个处理器都是 (会话, 消息, 可用内容) 的纯函数，产出 [`TurnOutcome`]；
//! 会话字段的实际写入统一由调度器在提交时完成，处理器不就地修改会话。

use crate::content::KnowledgeItem;
use crate::session::{GradeLevel, Phase, Session};

use super::orchestrator::{QuestionKind, Tutor};
use super::selector;

/// 一个回合的处理结论：回复文本、下一阶段与待提交的会话变更
pub(super) struct TurnOutcome {
    pub response: String,
    pub phase: Phase,
    pub grade: GradeLevel,
    pub failures: u32,
    /// 学习阶段识别到的新主题绑定；None 表示保持原值
    pub new_topic: Option<String>,
    pub is_question: bool,
    pub question: Option<crate::content::Question>,
    pub mastered: bool,
    /// 待绑定的在答题目
    pub bind: Option<(QuestionKind, crate::content::Question)>,
}

impl TurnOutcome {
    /// 纯回复结论：阶段给定，等级与失败计数保持会话现值
    fn reply(session: &Session, response: String, phase: Phase) -> Self {
        Self {
            response,
            phase,
            grade: session.current_grade,
            failures: session.consecutive_failures,
            new_topic: None,
            is_question: false,
            question: None,
            mastered: false,
            bind: None,
        }
    }
}

impl Tutor {
    /// 学习阶段：练习意图转入评估；否则识别主题并产出教学回复
    pub(super) async fn handle_learning(
        &self,
        session: &Session,
        message: &str,
        knowledge: &[KnowledgeItem],
    ) -> TurnOutcome {
        if self.intent.wants_practice(message) {
            return self.start_assessment(session).await;
        }

        // 消息提到已知主题名或 id 时绑定该主题（比较前统一为字符串）
        let mut new_topic = None;
        for topic in self.content.topics_for_subject(session.subject) {
            if (!topic.name.is_empty() && message.contains(topic.name.as_str()))
                || (!topic.id.is_empty() && message.contains(topic.id.as_str()))
            {
                new_topic = Some(topic.id);
                break;
            }
        }

        let response = self.instructor.teach(session, knowledge).await;
        let mut outcome = TurnOutcome::reply(session, response, Phase::Learning);
        outcome.new_topic = new_topic;
        outcome
    }

    /// 评估阶段：提示优先于评分；按评估结论决定升入迁移测试、回到学习、
    /// 继续作答或转入补救教学
    pub(super) async fn handle_assessing(
        &self,
        session: &Session,
        message: &str,
        knowledge: &[KnowledgeItem],
    ) -> TurnOutcome {
        let Some(question) = self.live_question(&session.id, QuestionKind::Assessment).await
        else {
            return TurnOutcome::reply(
                session,
                "未找到当前题目，我们重新开始一题练习吧。回复“出题/练习”即可。".to_string(),
                Phase::Learning,
            );
        };

        // 提示请求绝不送入评估器
        if self.intent.wants_hint(message) {
            let hints = self.instructor.hints_for(session, &question, knowledge).await;
            let mut outcome = TurnOutcome::reply(
                session,
                format!("{}\n\n你可以继续作答：", hints),
                Phase::Assessing,
            );
            outcome.is_question = true;
            outcome.question = Some(question);
            return outcome;
        }

        let verdict = self.grader.evaluate(&question, message).await;

        if verdict.is_correct {
            if verdict.grade == GradeLevel::A {
                return self.start_transfer_test(session, verdict.feedback).await;
            }
            let mut outcome = TurnOutcome::reply(
                session,
                format!("{}\n\n继续努力！你想继续学习还是做更多练习？", verdict.feedback),
                Phase::Learning,
            );
            outcome.grade = verdict.grade;
            outcome.failures = 0;
            return outcome;
        }

        let failures = session.consecutive_failures + 1;

        if failures >= self.max_failures {
            let remediation = self
                .instructor
                .remediate(
                    session,
                    &question.topic_name,
                    failures,
                    verdict.error_category,
                    knowledge,
                )
                .await;
            let mut outcome = TurnOutcome::reply(
                session,
                format!(
                    "{}\n\n---\n\n🔄 让我换一种方式来帮助你理解：\n\n{}",
                    verdict.feedback, remediation
                ),
                Phase::Remediation,
            );
            outcome.grade = GradeLevel::C;
            // 进入补救教学即清零
            outcome.failures = 0;
            return outcome;
        }

        // 未到阈值：留在评估阶段，同一道题继续作答
        let mut outcome = TurnOutcome::reply(
            session,
            format!("{}\n\n别灰心！你可以继续作答，或者说“给我提示”。", verdict.feedback),
            Phase::Assessing,
        );
        outcome.grade = verdict.grade;
        outcome.failures = failures;
        outcome.is_question = true;
        outcome.question = Some(question);
        outcome
    }

    /// 迁移测试阶段：A/B 或判对即为通过（已掌握）；否则带 B 等级回到学习
    pub(super) async fn handle_transfer(
        &self,
        session: &Session,
        message: &str,
        knowledge: &[KnowledgeItem],
    ) -> TurnOutcome {
        let Some(question) = self.live_question(&session.id, QuestionKind::Transfer).await else {
            return TurnOutcome::reply(
                session,
                "未找到迁移测试题目，我们先回到学习吧。".to_string(),
                Phase::Learning,
            );
        };

        if self.intent.wants_hint(message) {
            let hints = self.instructor.hints_for(session, &question, knowledge).await;
            let mut outcome = TurnOutcome::reply(
                session,
                format!("{}\n\n你可以继续作答：", hints),
                Phase::TransferTest,
            );
            outcome.is_question = true;
            outcome.question = Some(question);
            return outcome;
        }

        let verdict = self.grader.evaluate(&question, message).await;

        if verdict.is_correct || matches!(verdict.grade, GradeLevel::A | GradeLevel::B) {
            let mut outcome = TurnOutcome::reply(
                session,
                format!(
                    "🎊 **恭喜！迁移测试通过！**\n\n{}\n\n✅ 你已经真正掌握了这个知识点！\n\n想继续学习其他内容吗？",
                    verdict.feedback
                ),
                Phase::Mastered,
            );
            outcome.grade = GradeLevel::A;
            outcome.failures = 0;
            outcome.mastered = true;
            return outcome;
        }

        let mut outcome = TurnOutcome::reply(
            session,
            format!(
                "{}\n\n迁移测试未通过，没关系！我们回顾一下基础知识再挑战。\n\n你想我从哪部分开始讲？",
                verdict.feedback
            ),
            Phase::Learning,
        );
        // 能走到迁移阶段说明基础已过关，保留 B 等级
        outcome.grade = GradeLevel::B;
        outcome
    }

    /// 补救教学阶段：任何消息都产出教学回复并回到学习
    pub(super) async fn handle_remediation(
        &self,
        session: &Session,
        knowledge: &[KnowledgeItem],
    ) -> TurnOutcome {
        let response = self.instructor.teach(session, knowledge).await;
        let mut outcome = TurnOutcome::reply(session, response, Phase::Learning);
        outcome.grade = GradeLevel::C;
        outcome.failures = 0;
        outcome
    }

    /// 开始评估：选题并绑定为评估阶段在答题目；无题可选时留在学习阶段
    async fn start_assessment(&self, session: &Session) -> TurnOutcome {
        let Some(question) = selector::pick_assessment_question(&self.content, session) else {
            return TurnOutcome::reply(
                session,
                "📚 当前主题暂无练习题，让我们继续学习吧！".to_string(),
                Phase::Learning,
            );
        };

        let question_text = selector::format_question(&question);
        let mut outcome = TurnOutcome::reply(
            session,
            format!(
                "📝 好的，让我们来做一道练习题！\n\n{}\n请输入你的答案（需要提示就说“给我提示”）：",
                question_text
            ),
            Phase::Assessing,
        );
        outcome.is_question = true;
        outcome.question = Some(question.clone());
        outcome.bind = Some((QuestionKind::Assessment, question));
        outcome
    }

    /// 开始迁移测试：无迁移题可选时视为该主题已掌握，不阻塞学生进度
    async fn start_transfer_test(&self, session: &Session, prev_feedback: String) -> TurnOutcome {
        let Some(question) = selector::pick_transfer_question(&self.content, session) else {
            let mut outcome = TurnOutcome::reply(
                session,
                format!(
                    "{}\n\n🎊 太棒了！你已经掌握了这个知识点！\n\n想要学习其他内容吗？",
                    prev_feedback
                ),
                Phase::Mastered,
            );
            outcome.grade = GradeLevel::A;
            outcome.failures = 0;
            outcome.mastered = true;
            return outcome;
        };

        let question_text = selector::format_question(&question);
        let mut outcome = TurnOutcome::reply(
            session,
            format!(
                "{}\n\n---\n\n🚀 **迁移测试**\n\n你对基础知识掌握得很好！现在挑战一道应用题，看看你能否举一反三：\n\n{}\n请认真思考后作答（需要提示就说“给我提示”）：",
                prev_feedback, question_text
            ),
            Phase::TransferTest,
        );
        outcome.grade = GradeLevel::A;
        outcome.failures = 0;
        outcome.is_question = true;
        outcome.question = Some(question.clone());
        outcome.bind = Some((QuestionKind::Transfer, question));
        outcome
    }
}
