// Auditflow - routes a query to the right workflow and prints the report

use auditflow::config::AppConfig;
use auditflow::routing::{
    GuidanceWorkflow, MethodologyWorkflow, OllamaRouteModel, Query, QueryClassifier,
    ResearchWorkflow, Router, TranslateWorkflow, WorkflowLabel, WorkflowRegistry,
};
use auditflow::search::{SearchIndexClient, WebSearchClient};
use auditflow::translation::{
    AzureBlobStore, AzureDocumentTranslator, LanguageResolver, ObjectStore, StorageLocator,
    TranslationOrchestrator,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (forced_label, query_text) = parse_args(&args);

    let Some(query_text) = query_text else {
        print_usage();
        return Ok(());
    };

    println!("📋 Auditflow");
    println!("================================\n");

    let config = AppConfig::from_env();
    let router = build_router(&config);

    let query = Query::new(query_text);
    let report = match forced_label {
        Some(label) => router.handle_as(&query, label).await,
        None => router.handle(&query).await,
    };

    println!("🎯 Workflow: {}\n", report.label);
    println!("{}", report.render());

    Ok(())
}

fn build_router(config: &AppConfig) -> Router {
    let model = OllamaRouteModel::new(&config.router);
    let classifier = QueryClassifier::new(Arc::new(model));

    let mut registry = WorkflowRegistry::new();

    match SearchIndexClient::new(&config.search) {
        Ok(search) => {
            let search = Arc::new(search);
            registry.register(Arc::new(MethodologyWorkflow::new(
                search.clone(),
                config.search.methodology_index.clone(),
            )));
            registry.register(Arc::new(GuidanceWorkflow::new(
                search,
                config.search.guidance_index.clone(),
            )));
        }
        Err(e) => eprintln!("⚠️  Knowledge workflows unavailable: {}", e),
    }

    match WebSearchClient::new(&config.web) {
        Ok(web) => registry.register(Arc::new(ResearchWorkflow::new(Arc::new(web)))),
        Err(e) => eprintln!("⚠️  Research workflow unavailable: {}", e),
    }

    let store: Option<Arc<dyn ObjectStore>> = match (
        &config.storage.blob_account,
        &config.storage.blob_sas_token,
    ) {
        (Some(account), Some(token)) => Some(Arc::new(AzureBlobStore::new(
            account,
            token,
            config.storage.containers.clone(),
        ))),
        _ => None,
    };

    match (&config.translator.endpoint, &config.translator.api_key) {
        (Some(endpoint), Some(api_key)) => {
            let backend = Arc::new(AzureDocumentTranslator::new(
                endpoint,
                api_key,
                store.clone(),
            ));
            let locator = StorageLocator::new(&config.storage, store.clone());
            let orchestrator =
                TranslationOrchestrator::new(backend, store, &config.translator);
            registry.register(Arc::new(TranslateWorkflow::new(locator, orchestrator)));
        }
        _ => eprintln!("⚠️  Translate workflow unavailable: TRANSLATOR_ENDPOINT or TRANSLATOR_API_KEY is not set"),
    }

    Router::new(classifier, registry)
}

fn parse_args(args: &[String]) -> (Option<WorkflowLabel>, Option<String>) {
    let mut forced = None;
    let mut words = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--mode" {
            forced = iter.next().and_then(|mode| parse_label(mode));
        } else {
            words.push(arg.clone());
        }
    }

    let query = if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    };
    (forced, query)
}

fn parse_label(mode: &str) -> Option<WorkflowLabel> {
    let wanted = mode.trim().to_uppercase();
    WorkflowLabel::routable()
        .into_iter()
        .find(|label| wanted == label.as_str())
}

fn print_usage() {
    println!("Auditflow - query routing and document translation");
    println!();
    println!("Usage: auditflow [--mode WORKFLOW] <query...>");
    println!();
    println!("The query is classified into one of four workflows:");
    println!("  METHODOLOGY  - audit methodology and procedure questions");
    println!("  GUIDANCE     - internal guideline and policy questions");
    println!("  RESEARCH     - general questions answered from the web");
    println!("  TRANSLATE    - document translation requests");
    println!();
    println!("Pass --mode to skip classification and force a workflow.");
    println!();
    let codes: Vec<&str> = LanguageResolver::supported_codes().collect();
    println!("Supported target languages: {}", codes.join(", "));
    println!();
    println!("Environment variables:");
    println!("  ROUTER_MODEL         - classification model (default: gpt-oss:20b)");
    println!("  ROUTER_ENDPOINT      - Ollama endpoint (default: http://localhost:11434)");
    println!("  SEARCH_ENDPOINT      - semantic search service endpoint");
    println!("  SEARCH_API_KEY       - semantic search API key");
    println!("  SERPER_API_KEY       - web search API key");
    println!("  TRANSLATOR_ENDPOINT  - document translation endpoint");
    println!("  TRANSLATOR_API_KEY   - document translation API key");
    println!("  DOCUMENTS_DIR        - highest-priority local documents directory");
    println!("  BLOB_ACCOUNT         - blob storage account name");
    println!("  BLOB_SAS_TOKEN       - blob storage SAS token");
    println!("  BLOB_CONTAINERS      - comma-separated container names");
    println!();
    println!("Examples:");
    println!("  auditflow what are the revenue sampling procedures");
    println!("  auditflow translate report.pdf to spanish");
    println!("  auditflow --mode RESEARCH latest IFRS 17 developments");
}
