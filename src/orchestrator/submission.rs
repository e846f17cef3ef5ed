//! 批量提交 - 编排层
//!
//! 把解析好的测验写入题库。顺序固定：
//! 1. 为全部测验分配 activity ID
//! 2. 逐个测验：分配 question ID → 提交 questions → 分配 item ID → 提交 items
//! 3. 一次性提交全部 activities
//!
//! 每类记录按 `batch_size` 分块，块与块之间顺序等待。

use crate::clients::{Action, ItemBankApi, Namespace};
use crate::config::Config;
use crate::error::{ApiError, AppResult};
use crate::models::Quiz;
use crate::services::IdAllocator;
use serde_json::{json, Value};
use tracing::{debug, info};

/// 提交统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionStats {
    pub quizzes: usize,
    pub questions: usize,
    pub items: usize,
}

/// 按块提交记录，请求体为 `{key: [...]}`
///
/// 返回提交的记录数；记录为空时不发送请求。
pub async fn submit_chunked(
    api: &dyn ItemBankApi,
    action: Action,
    endpoint: &str,
    key: &str,
    records: &[Value],
    batch_size: usize,
) -> AppResult<usize> {
    if records.is_empty() {
        return Ok(0);
    }

    let batch_size = batch_size.max(1);
    let total_batches = records.len().div_ceil(batch_size);
    for (index, chunk) in records.chunks(batch_size).enumerate() {
        info!(
            "📤 {} {} 第 {}/{} 批 ({} 条)",
            action,
            endpoint,
            index + 1,
            total_batches,
            chunk.len()
        );
        let response = api.submit(action, endpoint, &json!({ key: chunk })).await?;
        if !response.meta.status {
            return Err(ApiError::BadResponse {
                endpoint: endpoint.to_string(),
                status: None,
                message: response.meta.message,
            }
            .into());
        }
    }
    Ok(records.len())
}

/// 按 reference 读取实体，不跟随分页
pub async fn get_entities(api: &dyn ItemBankApi, endpoint: &str, refs: &[String]) -> AppResult<Vec<Value>> {
    if refs.is_empty() {
        return Ok(Vec::new());
    }

    let response = api
        .submit(Action::Get, endpoint, &json!({ "references": refs }))
        .await?;
    if let Some(next) = &response.meta.next {
        debug!("{} 还有下一页 ({})，未继续读取", endpoint, next);
    }

    match response.data {
        Value::Null => Ok(Vec::new()),
        data => Ok(serde_json::from_value(data)?),
    }
}

pub struct Submitter<'a> {
    api: &'a dyn ItemBankApi,
    allocator: IdAllocator<'a>,
    batch_size: usize,
}

impl<'a> Submitter<'a> {
    pub fn new(api: &'a dyn ItemBankApi, config: &Config) -> Self {
        Self {
            api,
            allocator: IdAllocator::new(api, config.id_retry_limit),
            batch_size: config.batch_size,
        }
    }

    /// 提交全部测验，成功后每个测验、题目都带有 ref ID
    pub async fn submit_all(&self, quizzes: &mut [Quiz]) -> AppResult<SubmissionStats> {
        let mut stats = SubmissionStats::default();

        let activity_ids = self.allocator.allocate(Namespace::Activities, quizzes.len()).await?;
        for (quiz, id) in quizzes.iter_mut().zip(activity_ids) {
            quiz.ref_id = Some(id);
        }

        for quiz in quizzes.iter_mut() {
            info!("🚀 提交测验 \"{}\" ({} 道题)", quiz.title, quiz.questions.len());
            stats.questions += self.submit_questions(quiz).await?;
            stats.items += self.submit_items(quiz).await?;
        }

        let activities: Vec<Value> = quizzes.iter().map(Quiz::activity_json).collect();
        stats.quizzes = submit_chunked(
            self.api,
            Action::Set,
            Namespace::Activities.endpoint(),
            "activities",
            &activities,
            self.batch_size,
        )
        .await?;

        info!(
            "✓ 提交完成: {} 个测验, {} 道题, {} 个 item",
            stats.quizzes, stats.questions, stats.items
        );
        Ok(stats)
    }

    async fn submit_questions(&self, quiz: &mut Quiz) -> AppResult<usize> {
        let ids = self
            .allocator
            .allocate(Namespace::Questions, quiz.questions.len())
            .await?;
        for (question, id) in quiz.questions.iter_mut().zip(ids) {
            question.question_ref_id = Some(id);
        }

        let records: Vec<Value> = quiz.questions.iter().map(|q| q.question_json()).collect();
        submit_chunked(
            self.api,
            Action::Set,
            Namespace::Questions.endpoint(),
            "questions",
            &records,
            self.batch_size,
        )
        .await
    }

    async fn submit_items(&self, quiz: &mut Quiz) -> AppResult<usize> {
        let ids = self
            .allocator
            .allocate(Namespace::Items, quiz.questions.len())
            .await?;
        for (question, id) in quiz.questions.iter_mut().zip(ids) {
            question.item_ref_id = Some(id);
        }

        let records: Vec<Value> = quiz.questions.iter().map(|q| q.item_json()).collect();
        submit_chunked(
            self.api,
            Action::Set,
            Namespace::Items.endpoint(),
            "items",
            &records,
            self.batch_size,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mock::MockItemBank;
    use crate::config::ParseOptions;
    use crate::models::{McqOption, Question, QuestionParts, QuestionVariant, QuizKind};
    use pretty_assertions::assert_eq;

    fn question(stem: &str) -> Question {
        let parts = QuestionParts {
            stem: stem.to_string(),
            options: vec![McqOption {
                label: "<p>a</p>".into(),
                value: "0".into(),
            }],
            correct_options: vec!["0".into()],
            rationales: vec![],
        };
        Question::assemble(
            parts,
            QuestionVariant::Standard {
                has_rationales: false,
            },
            &ParseOptions::default(),
        )
        .unwrap()
    }

    fn quiz(title: &str, questions: usize) -> Quiz {
        let mut quiz = Quiz::new(QuizKind::Standard, title, "P");
        for i in 0..questions {
            quiz.questions.push(question(&format!("<p>q{}</p>", i)));
        }
        quiz
    }

    #[tokio::test]
    async fn chunks_records_in_order() {
        let api = MockItemBank::new();
        let records: Vec<Value> = (0..5).map(|i| json!({ "n": i })).collect();
        let sent = submit_chunked(&api, Action::Set, "questions", "questions", &records, 2)
            .await
            .unwrap();
        assert_eq!(sent, 5);

        let calls = api.calls_to(Action::Set, "questions");
        let sizes: Vec<usize> = calls
            .iter()
            .map(|c| c.request["questions"].as_array().unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(calls[2].request["questions"][0]["n"], 4);
    }

    #[tokio::test]
    async fn empty_records_make_no_call() {
        let api = MockItemBank::new();
        let sent = submit_chunked(&api, Action::Set, "items", "items", &[], 50).await.unwrap();
        assert_eq!(sent, 0);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn submits_questions_then_items_then_activities() {
        let api = MockItemBank::new();
        let config = Config {
            batch_size: 50,
            ..Config::default()
        };
        let mut quizzes = vec![quiz("First", 2), quiz("Second", 1)];

        let stats = Submitter::new(&api, &config).submit_all(&mut quizzes).await.unwrap();
        assert_eq!(
            stats,
            SubmissionStats {
                quizzes: 2,
                questions: 3,
                items: 3
            }
        );

        let writes: Vec<String> = api
            .calls()
            .into_iter()
            .filter(|c| c.action == Action::Set)
            .map(|c| c.endpoint)
            .collect();
        assert_eq!(
            writes,
            vec!["questions", "items", "questions", "items", "activities"]
        );

        // activity 引用 item，item 引用 question
        let first = &quizzes[0];
        let activity = first.activity_json();
        assert_eq!(activity["reference"], json!(first.ref_id.clone().unwrap()));
        assert_eq!(activity["data"]["items"], json!(first.item_refs()));
        let item = first.questions[1].item_json();
        assert_eq!(
            item["questions"][0]["reference"],
            json!(first.questions[1].question_ref_id.clone().unwrap())
        );
    }

    #[tokio::test]
    async fn retries_colliding_identifiers() {
        let api = MockItemBank::new().with_collisions(1);
        let mut quizzes = vec![quiz("Only", 1)];
        Submitter::new(&api, &Config::default())
            .submit_all(&mut quizzes)
            .await
            .unwrap();

        // 第一次 activity ID 检查冲突，重新生成后再检查
        let checks = api.calls_to(Action::Get, "activities");
        assert_eq!(checks.len(), 2);
        assert_ne!(checks[0].request, checks[1].request);
        assert_eq!(checks[1].request["references"][0], json!(quizzes[0].ref_id.clone().unwrap()));
    }
}
