//! 意图识别
//!
//! 轻量关键词检测（不调用 LLM）：识别「想练习」与「想要提示」两类意图。
//! 两个检测器相互独立；在评估 / 迁移测试阶段，提示意图优先于答案评估，
//! 提示请求绝不能被当作答案送去评分。

/// 意图识别器：持有可替换的中英文关键词表
pub struct IntentClassifier {
    practice_keywords: Vec<String>,
    hint_keywords: Vec<String>,
}

impl IntentClassifier {
    pub fn new(
        practice_keywords: impl IntoIterator<Item = impl Into<String>>,
        hint_keywords: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            practice_keywords: practice_keywords.into_iter().map(Into::into).collect(),
            hint_keywords: hint_keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// 是否在请求练习 / 出题
    pub fn wants_practice(&self, message: &str) -> bool {
        let m = message.to_lowercase();
        self.practice_keywords.iter().any(|k| m.contains(k.as_str()))
    }

    /// 是否在请求提示（卡住了 / 不会做）
    pub fn wants_hint(&self, message: &str) -> bool {
        let m = message.to_lowercase();
        self.hint_keywords.iter().any(|k| m.contains(k.as_str()))
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(
            ["练习", "做题", "测试", "出题", "考考我", "quiz", "test", "practice"],
            [
                "给我提示", "提示", "给点提示", "来点提示", "不会", "思路", "怎么做",
                "hint", "stuck", "how do i",
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wants_practice_bilingual() {
        let classifier = IntentClassifier::default();
        assert!(classifier.wants_practice("我想做题"));
        assert!(classifier.wants_practice("考考我吧"));
        assert!(classifier.wants_practice("let's do a quiz"));
        assert!(classifier.wants_practice("I need more PRACTICE"));
        assert!(!classifier.wants_practice("讲讲修辞手法"));
    }

    #[test]
    fn test_wants_hint_bilingual() {
        let classifier = IntentClassifier::default();
        assert!(classifier.wants_hint("给我提示"));
        assert!(classifier.wants_hint("这道题怎么做"));
        assert!(classifier.wants_hint("我不会"));
        assert!(classifier.wants_hint("I'm stuck"));
        assert!(classifier.wants_hint("How do I start?"));
        assert!(!classifier.wants_hint("答案是B"));
    }

    #[test]
    fn test_detectors_independent() {
        let classifier = IntentClassifier::default();
        // 两个检测器可以同时为真，优先级由阶段处理器决定
        let msg = "不会做，再出题练习一下？";
        assert!(classifier.wants_practice(msg));
        assert!(classifier.wants_hint(msg));
    }
}
