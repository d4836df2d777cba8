// Content tools backed by the text-generation service

use crate::tools::{Tool, ToolDescriptor};
use serde::Deserialize;
use std::sync::Arc;
use study_core::{GenerationRequest, TextGenerator, ToolResult};

/// Tool that builds a weekly study plan
pub struct StudyPlanTool {
    generator: Arc<dyn TextGenerator>,
}

impl StudyPlanTool {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[derive(Debug, Deserialize)]
struct StudyPlanArgs {
    subject: String,
    duration_weeks: i64,
    daily_hours: f64,
}

#[async_trait::async_trait]
impl Tool for StudyPlanTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::builder(
            "generateStudyPlan",
            "Generates a personalized study plan for a subject, duration, and daily hours in markdown.",
        )
        .param::<String>("subject", "Subject to plan for")
        .param::<i64>("duration_weeks", "Length of the plan in weeks")
        .param::<f64>("daily_hours", "Average hours of study per day")
        .build()
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult<String> {
        let args: StudyPlanArgs = serde_json::from_value(arguments)?;
        tracing::info!(subject = %args.subject, "Generating study plan");

        let prompt = format!(
            "Generate a personalized study plan for '{}' over {} weeks, \
             assuming an average of {} hours of study per day. \
             Include a weekly breakdown of topics, learning objectives, suggested daily activities, \
             and recommended types of resources. Format clearly using markdown. \
             Return only the plan, no conversational filler.",
            args.subject, args.duration_weeks, args.daily_hours
        );
        self.generator
            .generate(GenerationRequest::new(prompt, 0.7, 2000))
            .await
    }
}

/// Tool that condenses text into its key points
pub struct SummarizeTextTool {
    generator: Arc<dyn TextGenerator>,
}

impl SummarizeTextTool {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[derive(Debug, Deserialize)]
struct SummarizeArgs {
    text: String,
}

#[async_trait::async_trait]
impl Tool for SummarizeTextTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::builder(
            "summarizeText",
            "Summarizes provided text into key points or a concise overview.",
        )
        .param::<String>("text", "Text to summarize")
        .build()
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult<String> {
        let args: SummarizeArgs = serde_json::from_value(arguments)?;
        tracing::info!(text_length = args.text.chars().count(), "Summarizing text");

        let prompt = format!(
            "Please provide a concise summary of the following text, highlighting the main ideas \
             and key points. Return only the summary, no conversational filler:\n\n{}",
            args.text
        );
        self.generator
            .generate(GenerationRequest::new(prompt, 0.5, 500))
            .await
    }
}

/// Tool that writes a multiple-choice quiz
pub struct QuizTool {
    generator: Arc<dyn TextGenerator>,
}

impl QuizTool {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[derive(Debug, Deserialize)]
struct QuizArgs {
    topic: String,
    num_questions: i64,
}

#[async_trait::async_trait]
impl Tool for QuizTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::builder(
            "generateQuiz",
            "Generates a multiple-choice quiz on a topic with a given number of questions.",
        )
        .param::<String>("topic", "Quiz topic")
        .param::<i64>("num_questions", "Number of questions")
        .build()
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult<String> {
        let args: QuizArgs = serde_json::from_value(arguments)?;
        tracing::info!(topic = %args.topic, num_questions = args.num_questions, "Generating quiz");

        let prompt = format!(
            "Generate a {}-question multiple-choice quiz about '{}'. \
             For each question, provide 4 options (A, B, C, D) and clearly indicate the correct answer. \
             Format the output using markdown, with questions numbered and options lettered. \
             Return only the quiz content, no conversational filler.",
            args.num_questions, args.topic
        );
        self.generator
            .generate(GenerationRequest::new(prompt, 0.7, 1000))
            .await
    }
}

/// Tool that writes front/back flashcards
pub struct FlashcardsTool {
    generator: Arc<dyn TextGenerator>,
}

impl FlashcardsTool {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[derive(Debug, Deserialize)]
struct FlashcardsArgs {
    topic: String,
    num_cards: i64,
}

#[async_trait::async_trait]
impl Tool for FlashcardsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::builder(
            "generateFlashcards",
            "Generates study flashcards for a topic with a specified number of cards.",
        )
        .param::<String>("topic", "Flashcard topic")
        .param::<i64>("num_cards", "Number of cards")
        .build()
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult<String> {
        let args: FlashcardsArgs = serde_json::from_value(arguments)?;
        tracing::info!(topic = %args.topic, num_cards = args.num_cards, "Generating flashcards");

        let prompt = format!(
            "Generate {} study flashcards for the topic '{}'. \
             For each flashcard, provide a clear 'Front' and a concise 'Back'. \
             Format each flashcard clearly using markdown. Return only the content.",
            args.num_cards, args.topic
        );
        self.generator
            .generate(GenerationRequest::new(prompt, 0.7, 1500))
            .await
    }
}

/// Tool that suggests books, courses and other material
pub struct RecommendResourcesTool {
    generator: Arc<dyn TextGenerator>,
}

impl RecommendResourcesTool {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[derive(Debug, Deserialize)]
struct RecommendArgs {
    subject: String,
    proficiency_level: String,
    num_resources: i64,
}

#[async_trait::async_trait]
impl Tool for RecommendResourcesTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::builder(
            "recommendResources",
            "Recommends study resources for a subject and proficiency level.",
        )
        .param::<String>("subject", "Subject being learned")
        .param::<String>("proficiency_level", "Learner level, e.g. beginner")
        .param::<i64>("num_resources", "Number of resources to recommend")
        .build()
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult<String> {
        let args: RecommendArgs = serde_json::from_value(arguments)?;
        tracing::info!(
            subject = %args.subject,
            proficiency_level = %args.proficiency_level,
            "Recommending resources"
        );

        let prompt = format!(
            "Recommend {} study resources for a '{}' level student learning '{}'. \
             Include a mix of types like books, online courses, websites, tutorials, or articles. \
             For each resource, provide its name, a brief description, and where it can be accessed. \
             Format as a numbered list with clear descriptions. Return only the list.",
            args.num_resources, args.proficiency_level, args.subject
        );
        self.generator
            .generate(GenerationRequest::new(prompt, 0.7, 1000))
            .await
    }
}
