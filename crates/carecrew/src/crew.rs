//! The medical crew: a diagnostician and a treatment advisor.

use async_trait::async_trait;
use carecrew_core::{AgentRole, Crew, CrewBuilder, TaskSpec};
use carecrew_model::ModelProvider;
use carecrew_openai_model::{OpenAIConfigBuilder, OpenAIProvider};

use crate::config::AppConfig;
use crate::pipeline::{KickoffInputs, Pipeline, PipelineError, PipelineResult};
use crate::tools::{ScrapeWebsiteTool, SerperSearchTool, http_client};

pub const DIAGNOSTICIAN: &str = "Medical Diagnostician";
pub const TREATMENT_ADVISOR: &str = "Treatment Advisor";

pub fn diagnostician() -> AgentRole {
    AgentRole::new(
        DIAGNOSTICIAN,
        "Analyze patient symptoms and medical history to provide a \
         preliminary diagnosis.",
        "This agent specializes in diagnosing medical conditions based on \
         patient-reported symptoms and medical history. It uses advanced \
         algorithms and medical knowledge to identify potential health issues.",
    )
    .with_tool(SerperSearchTool::NAME)
    .with_tool(ScrapeWebsiteTool::NAME)
}

pub fn treatment_advisor() -> AgentRole {
    AgentRole::new(
        TREATMENT_ADVISOR,
        "Recommend appropriate treatment plans based on the diagnosis \
         provided by the Medical Diagnostician.",
        "This agent specializes in creating treatment plans tailored to \
         individual patient needs. It considers the diagnosis, patient \
         history, and current best practices in medicine to recommend \
         effective treatments.",
    )
    .with_tool(SerperSearchTool::NAME)
    .with_tool(ScrapeWebsiteTool::NAME)
}

pub fn diagnose_task() -> TaskSpec {
    TaskSpec::new(
        "1. Analyze the patient's symptoms ({symptoms}) and medical history \
         ({medical_history}).\n\
         2. Provide a preliminary diagnosis with possible conditions based on \
         the provided information.\n\
         3. Limit the diagnosis to the most likely conditions.",
        "A preliminary diagnosis with a list of possible conditions.",
        DIAGNOSTICIAN,
    )
}

pub fn treatment_task() -> TaskSpec {
    TaskSpec::new(
        "1. Based on the diagnosis, recommend appropriate treatment plans \
         step by step.\n\
         2. Consider the patient's medical history ({medical_history}) and \
         current symptoms ({symptoms}).\n\
         3. Provide detailed treatment recommendations, including \
         medications, lifestyle changes, and follow-up care.",
        "A comprehensive treatment plan tailored to the patient's needs.",
        TREATMENT_ADVISOR,
    )
}

/// Assembles the two-step medical crew around `provider`.
pub fn build_crew<P: ModelProvider + 'static>(
    provider: P,
    search: SerperSearchTool,
    scrape: ScrapeWebsiteTool,
) -> Result<Crew, carecrew_core::Error> {
    CrewBuilder::with_model_provider(provider)
        .with_tool(search)
        .with_tool(scrape)
        .with_agent(diagnostician())
        .with_agent(treatment_advisor())
        .with_task(diagnose_task())
        .with_task(treatment_task())
        .build()
}

/// The production [`Pipeline`], backed by the medical crew.
pub struct CrewPipeline {
    crew: Crew,
}

impl CrewPipeline {
    #[inline]
    pub fn new(crew: Crew) -> Self {
        Self { crew }
    }

    /// Wires the crew to OpenAI and Serper as configured.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let openai_config =
            OpenAIConfigBuilder::with_api_key(config.openai_api_key.clone())
                .with_base_url(config.openai_base_url.clone())
                .with_model(config.openai_model.clone())
                .with_temperature(config.openai_temperature)
                .with_max_tokens(config.openai_max_tokens)
                .build();
        let client = http_client()?;
        let search = SerperSearchTool::new(
            client.clone(),
            config.serper_api_key.clone(),
            &config.serper_base_url,
        );
        let scrape = ScrapeWebsiteTool::new(client)?;
        let crew = build_crew(OpenAIProvider::new(openai_config), search, scrape)
            .map_err(|err| anyhow::anyhow!("invalid crew definition: {err}"))?;
        Ok(Self::new(crew))
    }
}

#[async_trait]
impl Pipeline for CrewPipeline {
    async fn kickoff(
        &self,
        inputs: &KickoffInputs,
    ) -> Result<PipelineResult, PipelineError> {
        let output = self.crew.kickoff(&inputs.to_map()).await?;
        Ok(PipelineResult::Other(Box::new(output)))
    }
}
