//! HTTP implementation of the backend collaborators.
//!
//! One `reqwest` client per service, JSON bodies, one call per logical
//! operation. Success is any 2xx with a JSON payload; failure is the status
//! code, surfaced as [`ApiError::HttpStatus`].

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use academ_core::model::{
    Difficulty, Evaluation, ModuleId, OptionLetter, Question, QuestionId, StudentId, TopicId,
};

use crate::contract::{
    AnswerEvaluator, AssessmentRecorder, AttemptRecord, FinalExamSource, QuestionGenerator,
    StudyCoach, StudyContext, TopicDirectory,
};
use crate::error::ApiError;

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Base URL for the student-facing service.
#[derive(Clone, Debug)]
pub struct StudentApiConfig {
    pub base_url: String,
}

impl StudentApiConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("ACADEM_STUDENT_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000".into());
        Self { base_url }
    }
}

/// Base URL for the teacher-facing service.
///
/// Carried for configuration completeness; the teacher portal endpoints are
/// consumed by excluded UI layers and have no client here.
#[derive(Clone, Debug)]
pub struct TeacherApiConfig {
    pub base_url: String,
}

impl TeacherApiConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("ACADEM_TEACHER_API_URL")
            .unwrap_or_else(|_| "http://localhost:8001".into());
        Self { base_url }
    }
}

//
// ─── CLIENT ────────────────────────────────────────────────────────────────────
//

/// HTTP client for the student-facing service.
#[derive(Clone)]
pub struct StudentApi {
    client: Client,
    base_url: String,
}

impl StudentApi {
    #[must_use]
    pub fn new(config: StudentApiConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url,
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(StudentApiConfig::from_env())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::parse(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::parse(response).await
    }

    async fn post_ack(&self, path: &str, body: &impl Serialize) -> Result<(), ApiError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(())
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl QuestionGenerator for StudentApi {
    async fn generate(
        &self,
        student: &StudentId,
        module: &ModuleId,
        difficulty: Difficulty,
    ) -> Result<Question, ApiError> {
        let payload = GenerateQuestionRequest {
            student_id: student.as_str(),
            module_id: module.as_str(),
            difficulty: difficulty.as_str(),
        };
        self.post_json("/agent/question/generate", &payload).await
    }
}

#[async_trait]
impl FinalExamSource for StudentApi {
    async fn final_questions(&self, module: &ModuleId) -> Result<Vec<Question>, ApiError> {
        self.get_json(&format!(
            "/student/assessment/final-questions/{}",
            module.as_str()
        ))
        .await
    }
}

#[async_trait]
impl AnswerEvaluator for StudentApi {
    async fn evaluate(
        &self,
        student: &StudentId,
        question: &str,
        answer: OptionLetter,
        question_id: Option<&QuestionId>,
    ) -> Result<Evaluation, ApiError> {
        let payload = EvaluateRequest {
            student_id: student.as_str(),
            question,
            answer: answer.as_str(),
            question_id: question_id.map(QuestionId::as_str),
        };
        let body: EvaluateResponse = self.post_json("/agent/question/evaluate", &payload).await?;
        Ok(Evaluation {
            is_correct: body.is_correct,
            feedback: body.feedback,
        })
    }
}

#[async_trait]
impl AssessmentRecorder for StudentApi {
    async fn record(
        &self,
        student: &StudentId,
        module: &ModuleId,
        score: f64,
        passed: bool,
        attempts: &[AttemptRecord],
    ) -> Result<(), ApiError> {
        let payload = RecordRequest {
            student_id: student.as_str(),
            module_id: module.as_str(),
            score,
            passed,
            attempts,
        };
        self.post_ack("/student/assessment/record", &payload).await
    }
}

#[async_trait]
impl TopicDirectory for StudentApi {
    async fn topic_name(&self, topic: &TopicId) -> Result<String, ApiError> {
        let body: TopicResponse = self
            .get_json(&format!("/curriculum/topic/{}", topic.as_str()))
            .await?;
        Ok(body.topic_name)
    }
}

#[async_trait]
impl StudyCoach for StudentApi {
    async fn advise(
        &self,
        student: &StudentId,
        message: &str,
        context: &StudyContext,
    ) -> Result<String, ApiError> {
        let payload = LearnRequest {
            student_id: student.as_str(),
            message,
            context,
        };
        let body: LearnResponse = self.post_json("/agent/learn", &payload).await?;
        Ok(body.response)
    }
}

//
// ─── WIRE SHAPES ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct GenerateQuestionRequest<'a> {
    student_id: &'a str,
    module_id: &'a str,
    difficulty: &'a str,
}

#[derive(Debug, Serialize)]
struct EvaluateRequest<'a> {
    student_id: &'a str,
    question: &'a str,
    answer: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    question_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EvaluateResponse {
    is_correct: bool,
    feedback: String,
}

#[derive(Debug, Serialize)]
struct RecordRequest<'a> {
    student_id: &'a str,
    module_id: &'a str,
    score: f64,
    passed: bool,
    attempts: &'a [AttemptRecord],
}

#[derive(Debug, Deserialize)]
struct TopicResponse {
    topic_name: String,
}

#[derive(Debug, Serialize)]
struct LearnRequest<'a> {
    student_id: &'a str,
    message: &'a str,
    context: &'a StudyContext,
}

#[derive(Debug, Deserialize)]
struct LearnResponse {
    response: String,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
