//! Sequential crew runtime.
//!
//! Runs a list of [`TaskSpec`]s one after another against a single model
//! adapter. Before each model call the agent's tools are run and their
//! observations are placed in the prompt, together with the answers of every
//! earlier step.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tracing::{debug, info, warn};

use super::{financial_crew_steps, AgentSpec, TaskSpec};
use crate::config::LLMConfig;
use crate::llm::LLMAdapter;
use crate::tools::{ToolContext, Toolbox};
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};

#[derive(Debug, Clone)]
pub struct CrewSettings {
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl CrewSettings {
    pub fn from_config(config: &LLMConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: Some(config.max_tokens),
            temperature: Some(config.temperature),
        }
    }
}

/// Values substituted into goals and task descriptions.
#[derive(Debug, Clone)]
pub struct CrewInputs {
    pub query: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TaskOutput {
    pub agent: String,
    pub description: String,
    pub raw: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CrewOutput {
    /// Answer of the final step.
    pub raw: String,
    pub tasks_output: Vec<TaskOutput>,
}

pub struct Crew {
    llm: Arc<dyn LLMAdapter>,
    toolbox: Toolbox,
    steps: Vec<TaskSpec>,
    settings: CrewSettings,
    // Keyed by role; shared across runs so max_rpm holds per worker process.
    limiters: HashMap<&'static str, Arc<DefaultDirectRateLimiter>>,
}

impl Crew {
    pub fn new(
        llm: Arc<dyn LLMAdapter>,
        toolbox: Toolbox,
        steps: Vec<TaskSpec>,
        settings: CrewSettings,
    ) -> Self {
        let limiters = steps
            .iter()
            .map(|step| {
                let rpm = NonZeroU32::new(step.agent.max_rpm).unwrap_or(NonZeroU32::MIN);
                (
                    step.agent.role,
                    Arc::new(RateLimiter::direct(Quota::per_minute(rpm))),
                )
            })
            .collect();

        Self {
            llm,
            toolbox,
            steps,
            settings,
            limiters,
        }
    }

    /// The four-step financial analysis crew.
    pub fn financial(llm: Arc<dyn LLMAdapter>, toolbox: Toolbox, settings: CrewSettings) -> Self {
        Self::new(llm, toolbox, financial_crew_steps(), settings)
    }

    /// Run every step in order and return all answers.
    pub async fn kickoff(&self, inputs: &CrewInputs) -> AppResult<CrewOutput> {
        info!(
            steps = self.steps.len(),
            query = %inputs.query,
            path = %inputs.path.display(),
            "Crew kickoff"
        );

        let ctx = ToolContext::new(inputs.query.clone(), inputs.path.clone());
        let mut tasks_output: Vec<TaskOutput> = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let description = interpolate(step.description, inputs);
            info!(step = index + 1, agent = step.agent.role, "Starting task");

            let mut observations = Vec::with_capacity(step.agent.tools.len());
            for tool in &step.agent.tools {
                let observation = self.toolbox.run(*tool, &ctx).await;
                observations.push((tool.name(), observation));
            }

            let request = LLMRequest {
                model: self.settings.model.clone(),
                messages: vec![LLMMessage::user(user_prompt(
                    &description,
                    step.expected_output,
                    &observations,
                    &tasks_output,
                ))],
                max_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
                system_instruction: Some(system_prompt(&step.agent, &self.steps, inputs)),
            };

            let raw = self.execute(&step.agent, &request).await?;
            info!(
                step = index + 1,
                agent = step.agent.role,
                answer_len = raw.len(),
                "Task complete"
            );

            tasks_output.push(TaskOutput {
                agent: step.agent.role.to_string(),
                description,
                raw,
            });
        }

        let raw = tasks_output
            .last()
            .map(|t| t.raw.clone())
            .ok_or_else(|| AppError::Internal("Crew has no tasks to run".to_string()))?;

        Ok(CrewOutput { raw, tasks_output })
    }

    async fn execute(&self, agent: &AgentSpec, request: &LLMRequest) -> AppResult<String> {
        let attempts = agent.max_iter.max(1);

        for attempt in 1..=attempts {
            if let Some(limiter) = self.limiters.get(agent.role) {
                limiter.until_ready().await;
            }

            let response = self.llm.create_chat_completion(request).await?;
            let answer = response.content.trim();
            if !answer.is_empty() {
                return Ok(answer.to_string());
            }

            warn!(agent = agent.role, attempt, "Model returned an empty answer");
        }

        Err(AppError::LLMApi(format!(
            "{} produced no answer after {} attempt(s)",
            agent.role, attempts
        )))
    }
}

fn interpolate(template: &str, inputs: &CrewInputs) -> String {
    template
        .replace("{query}", &inputs.query)
        .replace("{path}", &inputs.path.to_string_lossy())
}

fn system_prompt(agent: &AgentSpec, roster: &[TaskSpec], inputs: &CrewInputs) -> String {
    let mut prompt = format!(
        "You are {}. {}\nYour personal goal is: {}",
        agent.role,
        agent.backstory,
        interpolate(agent.goal, inputs)
    );

    if !agent.tools.is_empty() {
        prompt.push_str("\n\nYou have access to the following tools, already run for you:\n");
        for tool in &agent.tools {
            prompt.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
        }
    }

    if agent.allow_delegation {
        let coworkers: Vec<&str> = roster
            .iter()
            .map(|step| step.agent.role)
            .filter(|role| *role != agent.role)
            .collect();
        if !coworkers.is_empty() {
            prompt.push_str(&format!(
                "\nYou may rely on the work of your coworkers: {}.",
                coworkers.join(", ")
            ));
        }
    }

    debug!(agent = agent.role, prompt_len = prompt.len(), "System prompt built");
    prompt
}

fn user_prompt(
    description: &str,
    expected_output: &str,
    observations: &[(&str, String)],
    context: &[TaskOutput],
) -> String {
    let mut prompt = format!(
        "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n",
        description, expected_output
    );

    for (tool, observation) in observations {
        prompt.push_str(&format!("\nTool: {}\nObservation:\n{}\n", tool, observation));
    }

    if !context.is_empty() {
        prompt.push_str("\nThis is the context you're working with:\n");
        for output in context {
            prompt.push_str(&format!("\n## {}\n{}\n", output.agent, output.raw));
        }
    }

    prompt.push_str("\nBegin! Give your best, complete final answer.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockAdapter, MockResponse};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn settings() -> CrewSettings {
        CrewSettings {
            model: "mock".to_string(),
            max_tokens: Some(256),
            temperature: Some(0.0),
        }
    }

    fn inputs(path: PathBuf) -> CrewInputs {
        CrewInputs {
            query: "Summarize risk factors".to_string(),
            path,
        }
    }

    #[tokio::test]
    async fn test_runs_steps_in_order_with_context() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Revenue 500 million. Debt 200. Market volatility.").unwrap();

        let mock = Arc::new(MockAdapter::with_responses([
            MockResponse::text("verified"),
            MockResponse::text("analysis"),
            MockResponse::text("advice"),
            MockResponse::text("risks"),
        ]));
        let crew = Crew::financial(mock.clone(), Toolbox::default(), settings());

        let output = crew.kickoff(&inputs(file.path().to_path_buf())).await.unwrap();
        assert_eq!(output.raw, "risks");
        assert_eq!(output.tasks_output.len(), 4);
        assert_eq!(output.tasks_output[0].agent, "Financial Document Verifier");

        let requests = mock.requests();
        assert_eq!(requests.len(), 4);

        // Query is interpolated into the analyst's task and goal
        let analyst = &requests[1];
        assert!(analyst.messages[0].content.contains("user's query: Summarize risk factors."));
        assert!(analyst
            .system_instruction
            .as_deref()
            .unwrap()
            .contains("financial data: Summarize risk factors"));

        // Tool observations reach the prompt
        assert!(analyst.messages[0].content.contains("Revenue 500 million"));
        assert!(requests[0].messages[0].content.contains("Web search unavailable"));
        assert!(requests[2].messages[0].content.contains("=== INVESTMENT ANALYSIS REPORT ==="));
        assert!(requests[3].messages[0].content.contains("=== RISK ASSESSMENT REPORT ==="));

        // Later steps see earlier answers
        let last = &requests[3].messages[0].content;
        assert!(last.contains("verified") && last.contains("analysis") && last.contains("advice"));
    }

    #[tokio::test]
    async fn test_verifier_reads_the_document() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "ACME Corp Annual Report. Revenue 500 million.").unwrap();

        let mock = Arc::new(MockAdapter::echo());
        let crew = Crew::financial(mock.clone(), Toolbox::default(), settings());
        crew.kickoff(&inputs(file.path().to_path_buf())).await.unwrap();

        let verifier = &mock.requests()[0].messages[0].content;
        assert!(verifier.contains("Tool: Read Financial Document"));
        assert!(verifier.contains("ACME Corp Annual Report. Revenue 500 million."));
        assert!(verifier.contains("Tool: Search the internet"));
    }

    #[tokio::test]
    async fn test_delegation_names_coworkers() {
        let mock = Arc::new(MockAdapter::echo());
        let crew = Crew::financial(mock.clone(), Toolbox::default(), settings());
        crew.kickoff(&inputs(PathBuf::from("/nonexistent.pdf"))).await.unwrap();

        let requests = mock.requests();
        let verifier = requests[0].system_instruction.as_deref().unwrap();
        assert!(verifier.contains("coworkers: Senior Financial Analyst"));
        let advisor = requests[2].system_instruction.as_deref().unwrap();
        assert!(!advisor.contains("coworkers"));
    }

    #[tokio::test]
    async fn test_model_error_fails_the_run() {
        let mock = Arc::new(MockAdapter::with_responses([
            MockResponse::text("verified"),
            MockResponse::error("quota exceeded"),
        ]));
        let crew = Crew::financial(mock.clone(), Toolbox::default(), settings());

        let err = crew
            .kickoff(&inputs(PathBuf::from("/nonexistent.pdf")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LLMApi(ref m) if m == "quota exceeded"));
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_answer_is_retried_up_to_max_iter() {
        let mut step = crate::agents::verifier::task();
        step.agent.max_iter = 2;
        step.agent.max_rpm = 60;

        let mock = Arc::new(MockAdapter::with_responses([
            MockResponse::text("   "),
            MockResponse::text("second try"),
        ]));
        let crew = Crew::new(mock.clone(), Toolbox::default(), vec![step.clone()], settings());
        let output = crew
            .kickoff(&inputs(PathBuf::from("/nonexistent.pdf")))
            .await
            .unwrap();
        assert_eq!(output.raw, "second try");
        assert_eq!(mock.remaining_responses(), 0);

        let mock = Arc::new(MockAdapter::with_responses([
            MockResponse::text(""),
            MockResponse::text(""),
        ]));
        let crew = Crew::new(mock, Toolbox::default(), vec![step], settings());
        let err = crew
            .kickoff(&inputs(PathBuf::from("/nonexistent.pdf")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LLMApi(_)));
    }
}
