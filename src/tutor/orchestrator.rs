//! 会话调度器
//!
//! [`Tutor`] 在进程启动时构造一次，持有内容库、会话存储、LLM 与在答题目表；
//! 每条入站消息经 `handle_turn` 走一遍「入历史 → 阶段处理 → 提交 → 持久化」。
//! 持久化失败只记日志，回合结果照常返回（可用性优先于持久性）。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::content::{ContentStore, Question};
use crate::grading::Grader;
use crate::intent::IntentClassifier;
use crate::llm::LlmClient;
use crate::session::{GradeLevel, Message, Phase, Session, SessionStore};
use crate::teaching::Instructor;

/// 在答题目的维度：评估题与迁移题分开登记，过期的评估题不会被误认成迁移题
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    Assessment,
    Transfer,
}

/// 每回合返回给传输层的唯一契约
#[derive(Clone, Debug)]
pub struct TurnResult {
    pub response: String,
    pub phase: Phase,
    pub grade: GradeLevel,
    pub is_question: bool,
    pub question: Option<Question>,
    pub mastered: bool,
}

/// 学习编排器
pub struct Tutor {
    pub(super) content: Arc<ContentStore>,
    pub(super) sessions: Arc<dyn SessionStore>,
    pub(super) intent: IntentClassifier,
    pub(super) instructor: Instructor,
    pub(super) grader: Grader,
    pub(super) max_failures: u32,
    /// 在答题目表：(会话 id, 维度) → 题目，出新题即覆盖
    live_questions: RwLock<HashMap<(String, QuestionKind), Question>>,
}

impl Tutor {
    pub fn new(
        content: Arc<ContentStore>,
        sessions: Arc<dyn SessionStore>,
        llm: Arc<dyn LlmClient>,
        cfg: &AppConfig,
    ) -> Self {
        let request_timeout = Duration::from_secs(cfg.llm.timeouts.request);
        Self {
            instructor: Instructor::new(
                llm.clone(),
                request_timeout,
                cfg.app.max_context_messages,
            ),
            grader: Grader::new(llm, request_timeout),
            intent: IntentClassifier::default(),
            max_failures: cfg.app.max_failures,
            live_questions: RwLock::new(HashMap::new()),
            content,
            sessions,
        }
    }

    /// 创建会话并写入欢迎语；持久化失败同样只记日志
    pub async fn create_session(&self, student_id: &str, subject: crate::content::Subject) -> Session {
        let mut session = Session::new(student_id, subject);
        let topics = self.content.topics_for_subject(subject);
        let welcome = self.instructor.welcome_message(subject, &topics);
        session.messages.push(Message::assistant(welcome));

        if let Err(e) = self.sessions.save(&session).await {
            tracing::warn!(session = %session.id, error = %e, "failed to persist new session");
        }
        tracing::info!(session = %session.id, subject = ?subject, "session created");
        session
    }

    pub async fn load_session(&self, id: &str) -> Option<Session> {
        self.sessions.load(id).await
    }

    /// 处理一条学生消息：阶段调度、历史记录、状态提交与持久化
    pub async fn handle_turn(&self, session: &mut Session, user_message: &str) -> TurnResult {
        tracing::debug!(session = %session.id, phase = ?session.phase, "handling turn");

        let knowledge = self.content.knowledge_for_subject(session.subject);
        session.messages.push(Message::user(user_message));

        let outcome = match session.phase {
            // 已掌握后继续对话视同重新进入学习
            Phase::Learning | Phase::Mastered => {
                self.handle_learning(session, user_message, &knowledge).await
            }
            Phase::Assessing => self.handle_assessing(session, user_message, &knowledge).await,
            Phase::TransferTest => self.handle_transfer(session, user_message, &knowledge).await,
            Phase::Remediation => self.handle_remediation(session, &knowledge).await,
        };

        session.messages.push(Message::assistant(outcome.response.clone()));
        session.phase = outcome.phase;
        session.current_grade = outcome.grade;
        session.consecutive_failures = outcome.failures;
        if let Some(topic_id) = outcome.new_topic {
            session.topic_id = Some(topic_id);
        }
        if let Some((kind, question)) = outcome.bind {
            self.bind_live_question(&session.id, kind, question).await;
        }
        session.updated_at = Utc::now();

        if let Err(e) = self.sessions.save(session).await {
            // 可用性优先：回合结果照常返回，故障留给运维观察
            tracing::warn!(session = %session.id, error = %e, "session persist failed, turn result still returned");
        }

        TurnResult {
            response: outcome.response,
            phase: outcome.phase,
            grade: outcome.grade,
            is_question: outcome.is_question,
            question: outcome.question,
            mastered: outcome.mastered,
        }
    }

    /// 取某会话指定维度的在答题目；迁移标记与维度不符视为无在答题目，
    /// 防止跨阶段串题
    pub(super) async fn live_question(
        &self,
        session_id: &str,
        kind: QuestionKind,
    ) -> Option<Question> {
        self.live_questions
            .read()
            .await
            .get(&(session_id.to_string(), kind))
            .filter(|q| q.is_transfer == (kind == QuestionKind::Transfer))
            .cloned()
    }

    async fn bind_live_question(&self, session_id: &str, kind: QuestionKind, question: Question) {
        self.live_questions
            .write()
            .await
            .insert((session_id.to_string(), kind), question);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{QuestionType, Subject};
    use crate::llm::MockLlmClient;
    use crate::session::MemorySessionStore;

    const WRONG: &str = r#"{"is_correct": false, "grade": "C", "feedback": "答错了"}"#;
    const CORRECT_A: &str = r#"{"is_correct": true, "grade": "A", "feedback": "非常好"}"#;
    const CORRECT_B: &str = r#"{"is_correct": true, "grade": "B", "feedback": "基本正确"}"#;

    fn make_question(id: &str, is_transfer: bool) -> Question {
        Question {
            id: id.to_string(),
            subject: Subject::Math,
            topic_id: "t1".to_string(),
            topic_name: "一元二次方程".to_string(),
            question_type: QuestionType::Qa,
            difficulty: 2,
            content: "题干".to_string(),
            options: None,
            correct_answer: "参考答案".to_string(),
            explanation: "解析".to_string(),
            is_transfer,
            created_at: Utc::now(),
        }
    }

    fn make_tutor(responses: Vec<&str>, with_transfer: bool) -> Tutor {
        let mut store = ContentStore::new();
        store.add_question(make_question("q_practice", false));
        if with_transfer {
            store.add_question(make_question("q_transfer", true));
        }
        Tutor::new(
            Arc::new(store),
            Arc::new(MemorySessionStore::new()),
            Arc::new(MockLlmClient::with_responses(responses)),
            &AppConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_quiz_intent_starts_assessment() {
        let tutor = make_tutor(vec![], true);
        let mut session = tutor.create_session("stu", Subject::Math).await;

        let result = tutor.handle_turn(&mut session, "let's do a quiz").await;
        assert_eq!(result.phase, Phase::Assessing);
        assert!(result.is_question);
        let question = result.question.unwrap();
        assert_eq!(question.id, "q_practice");
        // 题目已绑定到该会话
        let live = tutor
            .live_question(&session.id, QuestionKind::Assessment)
            .await
            .unwrap();
        assert_eq!(live.id, "q_practice");
    }

    #[tokio::test]
    async fn test_assessing_without_live_question_redirects() {
        let tutor = make_tutor(vec![], true);
        let mut session = tutor.create_session("stu", Subject::Math).await;
        session.phase = Phase::Assessing;

        let result = tutor.handle_turn(&mut session, "我的答案是5").await;
        assert_eq!(result.phase, Phase::Learning);
        assert!(!result.is_question);
        assert!(result.question.is_none());
    }

    #[tokio::test]
    async fn test_stale_binding_of_wrong_kind_is_ignored() {
        let tutor = make_tutor(vec![], true);
        let mut session = tutor.create_session("stu", Subject::Math).await;

        // 把迁移题伪造成评估维度的绑定：查表时应因标记不符按无题处理
        tutor
            .bind_live_question(&session.id, QuestionKind::Assessment, make_question("qx", true))
            .await;
        session.phase = Phase::Assessing;

        let result = tutor.handle_turn(&mut session, "答案").await;
        assert_eq!(result.phase, Phase::Learning);
        assert!(!result.is_question);
    }

    #[tokio::test]
    async fn test_correct_a_starts_transfer_test() {
        let tutor = make_tutor(vec![CORRECT_A], true);
        let mut session = tutor.create_session("stu", Subject::Math).await;
        session.consecutive_failures = 2;

        tutor.handle_turn(&mut session, "出题").await;
        let result = tutor.handle_turn(&mut session, "我的回答").await;

        assert_eq!(result.phase, Phase::TransferTest);
        assert_eq!(result.grade, GradeLevel::A);
        assert_eq!(session.consecutive_failures, 0);
        assert!(result.is_question);
        assert!(result.question.unwrap().is_transfer);
        assert!(!result.mastered);
    }

    #[tokio::test]
    async fn test_correct_a_masters_when_no_transfer_questions() {
        let tutor = make_tutor(vec![CORRECT_A], false);
        let mut session = tutor.create_session("stu", Subject::Math).await;

        tutor.handle_turn(&mut session, "练习").await;
        let result = tutor.handle_turn(&mut session, "我的回答").await;

        assert_eq!(result.phase, Phase::Mastered);
        assert!(result.mastered);
        assert_eq!(result.grade, GradeLevel::A);
    }

    #[tokio::test]
    async fn test_correct_below_a_returns_to_learning() {
        let tutor = make_tutor(vec![CORRECT_B], true);
        let mut session = tutor.create_session("stu", Subject::Math).await;
        session.consecutive_failures = 1;

        tutor.handle_turn(&mut session, "做题").await;
        let result = tutor.handle_turn(&mut session, "我的回答").await;

        assert_eq!(result.phase, Phase::Learning);
        assert_eq!(result.grade, GradeLevel::B);
        assert_eq!(session.consecutive_failures, 0);
        assert!(!result.is_question);
    }

    #[tokio::test]
    async fn test_failure_escalation_to_remediation() {
        // 三次答错后进入补救教学；第三回合评估 + 补救各一次 LLM 调用
        let tutor = make_tutor(vec![WRONG, WRONG, WRONG, "换一种讲法"], true);
        let mut session = tutor.create_session("stu", Subject::Math).await;

        tutor.handle_turn(&mut session, "练习").await;

        let r1 = tutor.handle_turn(&mut session, "错误答案1").await;
        assert_eq!(r1.phase, Phase::Assessing);
        assert_eq!(session.consecutive_failures, 1);

        let r2 = tutor.handle_turn(&mut session, "错误答案2").await;
        assert_eq!(r2.phase, Phase::Assessing);
        assert_eq!(session.consecutive_failures, 2);

        let r3 = tutor.handle_turn(&mut session, "错误答案3").await;
        assert_eq!(r3.phase, Phase::Remediation);
        assert_eq!(r3.grade, GradeLevel::C);
        // 进入补救教学即清零，计数从不超过阈值
        assert_eq!(session.consecutive_failures, 0);
        assert!(r3.response.contains("换一种讲法"));

        // 补救阶段任何消息都回到学习
        let r4 = tutor.handle_turn(&mut session, "明白了").await;
        assert_eq!(r4.phase, Phase::Learning);
        assert_eq!(r4.grade, GradeLevel::C);
        assert_eq!(session.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_hint_requests_idempotent_and_never_graded() {
        // 只脚本化提示文本：若提示被误送评估器，队列顺序会被打乱导致断言失败
        let tutor = make_tutor(vec!["提示一", "提示二", "提示三"], true);
        let mut session = tutor.create_session("stu", Subject::Math).await;

        tutor.handle_turn(&mut session, "出题").await;
        let before_grade = session.current_grade;

        for expected in ["提示一", "提示二", "提示三"] {
            let result = tutor.handle_turn(&mut session, "给我提示").await;
            assert_eq!(result.phase, Phase::Assessing);
            assert_eq!(result.grade, before_grade);
            assert!(result.is_question);
            assert_eq!(result.question.unwrap().id, "q_practice");
            assert!(result.response.contains(expected));
        }
        assert_eq!(session.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_transfer_b_masters() {
        let tutor = make_tutor(vec![CORRECT_A, "迁移提示", CORRECT_B], true);
        let mut session = tutor.create_session("stu", Subject::Math).await;

        tutor.handle_turn(&mut session, "练习").await;
        tutor.handle_turn(&mut session, "答对升入迁移").await;
        assert_eq!(session.phase, Phase::TransferTest);

        // 迁移阶段的提示请求同样不评分、不换阶段、不换题
        let hint = tutor.handle_turn(&mut session, "给我提示").await;
        assert_eq!(hint.phase, Phase::TransferTest);
        assert!(hint.response.contains("迁移提示"));
        assert_eq!(hint.question.unwrap().id, "q_transfer");

        let result = tutor.handle_turn(&mut session, "迁移题回答").await;
        assert_eq!(result.phase, Phase::Mastered);
        assert!(result.mastered);
        assert_eq!(result.grade, GradeLevel::A);
    }

    #[tokio::test]
    async fn test_transfer_fail_returns_to_learning_with_b() {
        let tutor = make_tutor(vec![CORRECT_A, WRONG], true);
        let mut session = tutor.create_session("stu", Subject::Math).await;

        tutor.handle_turn(&mut session, "练习").await;
        tutor.handle_turn(&mut session, "答对升入迁移").await;

        let result = tutor.handle_turn(&mut session, "迁移题答错").await;
        assert_eq!(result.phase, Phase::Learning);
        assert_eq!(result.grade, GradeLevel::B);
        assert!(!result.mastered);
    }

    #[tokio::test]
    async fn test_transfer_without_live_question_redirects() {
        let tutor = make_tutor(vec![], true);
        let mut session = tutor.create_session("stu", Subject::Math).await;
        session.phase = Phase::TransferTest;

        let result = tutor.handle_turn(&mut session, "答案").await;
        assert_eq!(result.phase, Phase::Learning);
        assert!(!result.is_question);
    }

    #[tokio::test]
    async fn test_learning_topic_detection() {
        let mut store = ContentStore::new();
        store.add_question(make_question("q_practice", false));
        // 主题从知识点聚合，先放一个知识点
        store.add_knowledge(crate::content::KnowledgeItem {
            id: "k1".to_string(),
            subject: Subject::Math,
            topic_id: "t1".to_string(),
            topic_name: "一元二次方程".to_string(),
            title: "解法".to_string(),
            content: "内容".to_string(),
            key_points: vec![],
            common_mistakes: vec![],
            intuition_pumps: vec![],
            tags: vec![],
            created_at: Utc::now(),
        });
        let tutor = Tutor::new(
            Arc::new(store),
            Arc::new(MemorySessionStore::new()),
            Arc::new(MockLlmClient::new()),
            &AppConfig::default(),
        );

        let mut session = tutor.create_session("stu", Subject::Math).await;
        assert!(session.topic_id.is_none());

        tutor.handle_turn(&mut session, "我想学一元二次方程").await;
        assert_eq!(session.topic_id.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_no_questions_available_keeps_learning() {
        let tutor = Tutor::new(
            Arc::new(ContentStore::new()),
            Arc::new(MemorySessionStore::new()),
            Arc::new(MockLlmClient::new()),
            &AppConfig::default(),
        );
        let mut session = tutor.create_session("stu", Subject::Math).await;

        let result = tutor.handle_turn(&mut session, "出题练习").await;
        assert_eq!(result.phase, Phase::Learning);
        assert!(!result.is_question);
        assert!(result.response.contains("暂无练习题"));
    }

    #[tokio::test]
    async fn test_message_log_grows_per_turn() {
        let tutor = make_tutor(vec![], true);
        let mut session = tutor.create_session("stu", Subject::Math).await;
        let baseline = session.messages.len();

        tutor.handle_turn(&mut session, "你好").await;
        // 每回合恰好追加一条 user 与一条 assistant
        assert_eq!(session.messages.len(), baseline + 2);
        assert_eq!(session.messages[baseline].role, crate::session::Role::User);
        assert_eq!(
            session.messages[baseline + 1].role,
            crate::session::Role::Assistant
        );
    }
}
