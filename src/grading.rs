//! 答案评估
//!
//! 优先让生成服务输出结构化 JSON 评估结果（is_correct / grade / feedback，
//! 可选 error_category 等），从回复文本中扫描第一个字段齐全的 JSON 块；
//! 解析不到时静默走确定性规则兜底。等级在闭集 {A, B, C} 之外一律归一化为 C。

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::content::{Question, QuestionType};
use crate::llm::{complete_with_timeout, service_unavailable_reply, LlmClient};
use crate::session::{GradeLevel, Message};

/// 判断题的肯定 / 否定词表（中英双语）
const AFFIRMATIVE_TOKENS: [&str; 7] = ["正确", "对", "true", "yes", "right", "correct", "√"];
const NEGATIVE_TOKENS: [&str; 7] = ["错误", "错", "false", "no", "wrong", "incorrect", "×"];

/// 推断的错误类别，用于补救教学的策略选择
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 概念理解偏差
    ConceptGap,
    /// 粗心
    Careless,
    /// 方法选择不当
    MethodError,
    /// 回答不完整
    Incomplete,
}

impl ErrorCategory {
    /// 宽松解析：认不出的类别返回 None，不视为错误
    pub fn parse(s: &str) -> Option<ErrorCategory> {
        match s.trim().to_lowercase().as_str() {
            "concept" | "concept_gap" | "概念" | "概念不清" => Some(ErrorCategory::ConceptGap),
            "careless" | "粗心" | "粗心大意" => Some(ErrorCategory::Careless),
            "method" | "method_error" | "方法" | "方法不当" => Some(ErrorCategory::MethodError),
            "incomplete" | "不完整" | "表述不完整" => Some(ErrorCategory::Incomplete),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorCategory::ConceptGap => "核心概念理解有偏差",
            ErrorCategory::Careless => "思路正确但细节出错",
            ErrorCategory::MethodError => "解题方法选择不当",
            ErrorCategory::Incomplete => "回答不完整、缺少关键要点",
        }
    }
}

/// 一次评估的最终结论
#[derive(Clone, Debug)]
pub struct Verdict {
    pub is_correct: bool,
    pub grade: GradeLevel,
    pub feedback: String,
    pub error_category: Option<ErrorCategory>,
}

/// 生成服务返回的结构化评估结果；is_correct / grade / feedback 为必填，
/// 缺任何一个则该 JSON 块不被接受
#[derive(Debug, Deserialize)]
struct RawVerdict {
    is_correct: bool,
    grade: String,
    feedback: String,
    #[serde(default)]
    error_category: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    improvement_suggestion: Option<String>,
}

/// 评估器：调用生成服务给学生回答定级，失败时规则兜底
pub struct Grader {
    llm: Arc<dyn LlmClient>,
    request_timeout: Duration,
}

impl Grader {
    pub fn new(llm: Arc<dyn LlmClient>, request_timeout: Duration) -> Self {
        Self {
            llm,
            request_timeout,
        }
    }

    /// 评估学生对一道题的自由文本回答
    pub async fn evaluate(&self, question: &Question, student_answer: &str) -> Verdict {
        let messages = build_messages(question, student_answer);
        let response =
            match complete_with_timeout(self.llm.as_ref(), &messages, self.request_timeout).await {
                Ok(text) => text,
                // 服务故障也走兜底路径，故障信息作为反馈可见
                Err(e) => service_unavailable_reply(&e),
            };

        if let Some(raw) = extract_verdict(&response) {
            return finalize(question, raw);
        }

        // 结构化解析失败：确定性规则兜底，原始回复作为反馈
        let is_correct = simple_check(question, student_answer);
        let grade = if is_correct { GradeLevel::A } else { GradeLevel::C };
        let feedback = if response.trim().is_empty() {
            default_feedback(question, is_correct, grade)
        } else {
            response
        };
        Verdict {
            is_correct,
            grade,
            feedback,
            error_category: None,
        }
    }
}

fn build_messages(question: &Question, student_answer: &str) -> Vec<Message> {
    let mut prompt = format!(
        "请评估学生对以下问题的回答：\n\n\
         ## 问题信息\n\
         - 类型：{}\n\
         - 题目：{}\n\
         - 正确答案：{}\n\
         - 解析：{}\n",
        question.question_type.label(),
        question.content,
        question.correct_answer,
        question.explanation,
    );
    if let Some(options) = &question.options {
        prompt.push_str(&format!("- 选项：{}\n", options.join(" / ")));
    }
    prompt.push_str(&format!(
        "\n## 学生回答\n{}\n\n\
         ## 评估要求\n\
         从答案正确性、理解深度、表达清晰度三个维度评估并给出等级。\n\n\
         ## 输出格式（请严格按照此格式输出 JSON）\n\
         {{\n\
             \"is_correct\": true/false,\n\
             \"grade\": \"A/B/C\",\n\
             \"feedback\": \"对学生的反馈\",\n\
             \"error_category\": \"concept/careless/method/incomplete（答错时给出）\",\n\
             \"error_description\": \"错在哪里\",\n\
             \"improvement_suggestion\": \"如何改进\"\n\
         }}\n\n\
         等级标准：\n\
         - A级：完全正确，理解深刻\n\
         - B级：基本正确，但有小错误或理解不够深入\n\
         - C级：理解有误，需要重新学习",
        student_answer,
    ));

    vec![
        Message::system("你是一位严谨但友善的评估专家，擅长分析学生的学习情况。请用 JSON 格式输出评估结果。"),
        Message::user(prompt),
    ]
}

/// 把结构化结果收敛成最终结论：等级归一化、反馈补全、错误分析拼接
fn finalize(question: &Question, raw: RawVerdict) -> Verdict {
    let grade = GradeLevel::from_label(&raw.grade);
    let error_category = raw.error_category.as_deref().and_then(ErrorCategory::parse);

    let mut feedback = raw.feedback.trim().to_string();
    if feedback.is_empty() {
        feedback = default_feedback(question, raw.is_correct, grade);
    }
    if !raw.is_correct {
        if let Some(desc) = raw.error_description.as_deref().filter(|s| !s.trim().is_empty()) {
            feedback.push_str(&format!("\n\n【错误分析】{}", desc.trim()));
        }
        if let Some(tip) = raw
            .improvement_suggestion
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            feedback.push_str(&format!("\n\n【改进建议】{}", tip.trim()));
        }
    }

    Verdict {
        is_correct: raw.is_correct,
        grade,
        feedback,
        error_category,
    }
}

/// 从文本中提取第一个字段齐全的 JSON 评估块
///
/// 生成服务经常在 JSON 前后夹带说明文字，也可能输出多个 JSON 块；
/// 从每个 `{` 起尝试配平，第一个能解析且必填字段齐全的块胜出
/// （外层块缺字段时会继续尝试其内层块）。
fn extract_verdict(text: &str) -> Option<RawVerdict> {
    let mut search = 0;
    while let Some(pos) = text[search..].find('{') {
        let start = search + pos;
        if let Some(block) = balanced_block(text, start) {
            if let Ok(raw) = serde_json::from_str::<RawVerdict>(block) {
                return Some(raw);
            }
        }
        search = start + 1;
    }
    None
}

/// 从 start 处的 `{` 开始取配平的 JSON 块（忽略字符串内部的花括号）
fn balanced_block(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        let idx = start + offset;
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}

/// 确定性规则兜底
fn simple_check(question: &Question, answer: &str) -> bool {
    let correct = question.correct_answer.trim().to_lowercase();
    let student = answer.trim().to_lowercase();
    if student.is_empty() {
        return false;
    }

    match question.question_type {
        // 选择题：双向子串匹配（学生可能答“B”也可能抄整个选项）
        QuestionType::Choice => correct.contains(&student) || student.contains(&correct),
        // 判断题：按参考答案所属词表检查学生文本的极性
        QuestionType::Judgment => {
            if AFFIRMATIVE_TOKENS.contains(&correct.as_str()) {
                AFFIRMATIVE_TOKENS.iter().any(|k| student.contains(k))
            } else {
                NEGATIVE_TOKENS.iter().any(|k| student.contains(k))
            }
        }
        // 问答 / 填空 / 应用：参考答案按空白切词，命中过半判对；
        // 单词参考答案命中即判对，零词参考答案恒判错
        QuestionType::Qa | QuestionType::Fill | QuestionType::Application => {
            let tokens: Vec<&str> = correct.split_whitespace().collect();
            if tokens.is_empty() {
                return false;
            }
            let matches = tokens.iter().filter(|t| student.contains(**t)).count();
            matches * 2 >= tokens.len()
        }
    }
}

/// 生成服务没有给出可用反馈时的固定反馈
fn default_feedback(question: &Question, is_correct: bool, grade: GradeLevel) -> String {
    if is_correct {
        if grade == GradeLevel::A {
            format!(
                "🎉 太棒了！你完全理解了这个知识点！\n\n📝 解析：{}",
                question.explanation
            )
        } else {
            format!(
                "✅ 答对了！但还可以理解得更深入。\n\n📝 解析：{}",
                question.explanation
            )
        }
    } else {
        format!(
            "❌ 这道题做错了，没关系，让我们一起分析一下。\n\n✨ 正确答案：{}\n📝 解析：{}",
            question.correct_answer, question.explanation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Subject;
    use crate::llm::MockLlmClient;
    use async_trait::async_trait;
    use chrono::Utc;

    fn make_question(question_type: QuestionType, correct_answer: &str) -> Question {
        Question {
            id: "q1".to_string(),
            subject: Subject::Math,
            topic_id: "math_quadratic".to_string(),
            topic_name: "一元二次方程".to_string(),
            question_type,
            difficulty: 2,
            content: "题干".to_string(),
            options: None,
            correct_answer: correct_answer.to_string(),
            explanation: "解析".to_string(),
            is_transfer: false,
            created_at: Utc::now(),
        }
    }

    fn grader_with(responses: Vec<&str>) -> Grader {
        Grader::new(
            Arc::new(MockLlmClient::with_responses(responses)),
            Duration::from_secs(5),
        )
    }

    struct FailingLlm;

    #[async_trait]
    impl crate::llm::LlmClient for FailingLlm {
        async fn complete(&self, _messages: &[Message]) -> Result<String, String> {
            Err("connection refused".to_string())
        }
    }

    #[test]
    fn test_extract_verdict_with_surrounding_prose() {
        let text = r#"好的，我的评估如下：
{"is_correct": true, "grade": "A", "feedback": "很好"}
希望对你有帮助！"#;
        let raw = extract_verdict(text).unwrap();
        assert!(raw.is_correct);
        assert_eq!(raw.grade, "A");
        assert_eq!(raw.feedback, "很好");
    }

    #[test]
    fn test_extract_verdict_skips_invalid_blocks() {
        // 第一个块缺必填字段，应跳过并接受第二个
        let text = r#"{"note": "not a verdict"} 然后 {"is_correct": false, "grade": "C", "feedback": "再想想"}"#;
        let raw = extract_verdict(text).unwrap();
        assert!(!raw.is_correct);
        assert_eq!(raw.grade, "C");
    }

    #[test]
    fn test_extract_verdict_nested_block() {
        // 外层包裹时取得内层有效块
        let text = r#"{"result": {"is_correct": true, "grade": "B", "feedback": "ok"}}"#;
        let raw = extract_verdict(text).unwrap();
        assert_eq!(raw.grade, "B");
    }

    #[test]
    fn test_extract_verdict_ignores_braces_in_strings() {
        let text = r#"{"is_correct": true, "grade": "A", "feedback": "注意 {花括号} 不影响解析"}"#;
        let raw = extract_verdict(text).unwrap();
        assert!(raw.feedback.contains("花括号"));
    }

    #[test]
    fn test_extract_verdict_none_on_plain_text() {
        assert!(extract_verdict("这道题你答得不错，继续加油！").is_none());
    }

    #[tokio::test]
    async fn test_evaluate_structured_roundtrip() {
        let grader = grader_with(vec![
            r#"{"is_correct": true, "grade": "A", "feedback": "完全正确"}"#,
        ]);
        let q = make_question(QuestionType::Qa, "参考答案");
        let verdict = grader.evaluate(&q, "学生的回答").await;
        assert!(verdict.is_correct);
        assert_eq!(verdict.grade, GradeLevel::A);
        assert_eq!(verdict.feedback, "完全正确");
    }

    #[tokio::test]
    async fn test_evaluate_normalizes_unknown_grade() {
        let grader = grader_with(vec![
            r#"{"is_correct": false, "grade": "S", "feedback": "等级非法"}"#,
        ]);
        let q = make_question(QuestionType::Qa, "参考答案");
        let verdict = grader.evaluate(&q, "回答").await;
        assert_eq!(verdict.grade, GradeLevel::C);
    }

    #[tokio::test]
    async fn test_evaluate_appends_error_sections() {
        let grader = grader_with(vec![
            r#"{"is_correct": false, "grade": "C", "feedback": "答错了",
                "error_category": "concept",
                "error_description": "混淆了比喻和拟人",
                "improvement_suggestion": "先找本体和喻体"}"#,
        ]);
        let q = make_question(QuestionType::Choice, "B");
        let verdict = grader.evaluate(&q, "A").await;
        assert_eq!(verdict.error_category, Some(ErrorCategory::ConceptGap));
        assert!(verdict.feedback.contains("【错误分析】混淆了比喻和拟人"));
        assert!(verdict.feedback.contains("【改进建议】先找本体和喻体"));
    }

    #[tokio::test]
    async fn test_fallback_judgment_polarity() {
        // 不可解析的回复触发兜底：参考答案是肯定词，学生文本只有否定词，判错
        let grader = grader_with(vec!["这是一段没有 JSON 的闲聊"]);
        let q = make_question(QuestionType::Judgment, "correct");
        let verdict = grader.evaluate(&q, "wrong, definitely false").await;
        assert!(!verdict.is_correct);
        assert_eq!(verdict.grade, GradeLevel::C);
        // 兜底路径用原始回复作为反馈
        assert_eq!(verdict.feedback, "这是一段没有 JSON 的闲聊");
    }

    #[tokio::test]
    async fn test_service_failure_degrades_to_fallback() {
        let grader = Grader::new(Arc::new(FailingLlm), Duration::from_secs(5));
        let q = make_question(QuestionType::Choice, "B");
        let verdict = grader.evaluate(&q, "我选B").await;
        assert!(verdict.is_correct);
        assert_eq!(verdict.grade, GradeLevel::A);
        assert!(verdict.feedback.contains("AI 服务暂时不可用"));
    }

    #[test]
    fn test_simple_check_choice_both_directions() {
        let q = make_question(QuestionType::Choice, "B");
        assert!(simple_check(&q, "b"));
        assert!(simple_check(&q, "我选 B 因为是拟人"));
        assert!(!simple_check(&q, "我选 A"));
        assert!(!simple_check(&q, "   "));

        let q2 = make_question(QuestionType::Choice, "B. 拟人");
        assert!(simple_check(&q2, "拟人"));
    }

    #[test]
    fn test_simple_check_judgment_vocabularies() {
        let affirmative = make_question(QuestionType::Judgment, "正确");
        assert!(simple_check(&affirmative, "我认为是对的"));
        assert!(!simple_check(&affirmative, "说不清"));

        let negative = make_question(QuestionType::Judgment, "错误");
        assert!(simple_check(&negative, "这句话是错的"));
        assert!(simple_check(&negative, "false"));
        assert!(!simple_check(&negative, "我觉得很有道理"));
    }

    #[test]
    fn test_simple_check_keyword_threshold() {
        let q = make_question(QuestionType::Qa, "price mechanism supply demand");
        // 4 个关键词命中 2 个，过半判对
        assert!(simple_check(&q, "it is about price and demand"));
        // 只命中 1 个，判错
        assert!(!simple_check(&q, "something about price"));
    }

    #[test]
    fn test_simple_check_single_token_determinative() {
        let q = make_question(QuestionType::Fill, "written");
        assert!(simple_check(&q, "the letter was written by tom"));
        assert!(!simple_check(&q, "the letter was wrote by tom"));
    }

    #[test]
    fn test_simple_check_empty_reference_always_wrong() {
        let q = make_question(QuestionType::Qa, "   ");
        assert!(!simple_check(&q, "任何回答"));
    }

    #[test]
    fn test_error_category_lenient_parse() {
        assert_eq!(ErrorCategory::parse(" Concept "), Some(ErrorCategory::ConceptGap));
        assert_eq!(ErrorCategory::parse("方法不当"), Some(ErrorCategory::MethodError));
        assert_eq!(ErrorCategory::parse("别的什么"), None);
    }
}
