use crate::infrastructure::document::attr;
use crate::infrastructure::NodeRef;
use phf::phf_map;

/// 段落样式标记类型
///
/// 由节点的 `data-custom-style` 属性（没有时退回 `class`）推导，不单独存储。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    QuizTitle,
    QuizType,
    /// 诊断测验的难度分区，保存标记后面的等级文本（尚未校验）
    QuizSection(String),
    QuestionStem,
    QuestionOption,
    QuestionRationale,
    /// 跨页续写的段落，保存被续写的类型
    Continued(Box<ElementType>),
    Unclassified,
}

static EXACT_MARKERS: phf::Map<&'static str, ElementType> = phf_map! {
    "QuizType" => ElementType::QuizType,
    "QuestionStem" => ElementType::QuestionStem,
    "QuestionOption" => ElementType::QuestionOption,
    "QuestionRationale" => ElementType::QuestionRationale,
};

const CONTINUED: &str = "Continued";
const QUIZ_TITLE: &str = "QuizTitle";
const QUIZ_SECTION: &str = "QuizSection";

impl ElementType {
    /// 对节点分类
    pub fn of(node: &NodeRef) -> Self {
        attr(node, "data-custom-style")
            .filter(|value| !value.trim().is_empty())
            .or_else(|| attr(node, "class"))
            .map(|marker| Self::from_marker(&marker))
            .unwrap_or(ElementType::Unclassified)
    }

    /// 从样式名分类，样式名中的空白会被忽略（"Question Stem" 等同 "QuestionStem"）
    pub fn from_marker(marker: &str) -> Self {
        let compact: String = marker.chars().filter(|c| !c.is_whitespace()).collect();

        if compact.contains(CONTINUED) {
            let base = compact.replacen(CONTINUED, "", 1);
            return match Self::from_marker(&base) {
                ElementType::Unclassified => ElementType::Unclassified,
                base => ElementType::Continued(Box::new(base)),
            };
        }

        if compact.starts_with(QUIZ_TITLE) {
            return ElementType::QuizTitle;
        }

        if let Some(rest) = compact.strip_prefix(QUIZ_SECTION) {
            let token = rest.trim_matches(|c: char| c == '-' || c == '_' || c == ':');
            return ElementType::QuizSection(token.to_string());
        }

        EXACT_MARKERS
            .get(compact.as_str())
            .cloned()
            .unwrap_or(ElementType::Unclassified)
    }

    pub fn is_quiz_title(&self) -> bool {
        matches!(self, ElementType::QuizTitle)
    }

    /// 在错误信息中使用的标记名
    pub fn marker_name(&self) -> String {
        match self {
            ElementType::QuizTitle => QUIZ_TITLE.to_string(),
            ElementType::QuizType => "QuizType".to_string(),
            ElementType::QuizSection(token) => format!("{}{}", QUIZ_SECTION, token),
            ElementType::QuestionStem => "QuestionStem".to_string(),
            ElementType::QuestionOption => "QuestionOption".to_string(),
            ElementType::QuestionRationale => "QuestionRationale".to_string(),
            ElementType::Continued(base) => format!("{}{}", base.marker_name(), CONTINUED),
            ElementType::Unclassified => "Unclassified".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::Document;
    use rstest::rstest;

    #[rstest]
    #[case("QuizTitle", ElementType::QuizTitle)]
    #[case("QuizTitle1", ElementType::QuizTitle)]
    #[case("QuizType", ElementType::QuizType)]
    #[case("QuestionStem", ElementType::QuestionStem)]
    #[case("Question Option", ElementType::QuestionOption)]
    #[case("QuestionRationale", ElementType::QuestionRationale)]
    #[case("QuizSectionBeginner", ElementType::QuizSection("Beginner".to_string()))]
    #[case("QuizSection-Advanced", ElementType::QuizSection("Advanced".to_string()))]
    #[case("QuestionStemContinued", ElementType::Continued(Box::new(ElementType::QuestionStem)))]
    #[case("Question Rationale Continued", ElementType::Continued(Box::new(ElementType::QuestionRationale)))]
    #[case("Body Text", ElementType::Unclassified)]
    #[case("Code Block", ElementType::Unclassified)]
    fn classifies_markers(#[case] marker: &str, #[case] expected: ElementType) {
        assert_eq!(ElementType::from_marker(marker), expected);
    }

    #[test]
    fn custom_style_takes_precedence_over_class() {
        let doc = Document::parse(
            r#"<div data-custom-style="QuestionOption" class="QuestionStem">x</div><h1 class="QuizTitle">T</h1><p>plain</p>"#,
        )
        .unwrap();
        let kids = doc.top_level_elements();
        assert_eq!(ElementType::of(&kids[0]), ElementType::QuestionOption);
        assert_eq!(ElementType::of(&kids[1]), ElementType::QuizTitle);
        assert_eq!(ElementType::of(&kids[2]), ElementType::Unclassified);
    }

    #[test]
    fn marker_names_round_trip_for_messages() {
        let continued = ElementType::from_marker("QuestionStemContinued");
        assert_eq!(continued.marker_name(), "QuestionStemContinued");
    }
}
