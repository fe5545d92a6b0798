/*!
 * Integration tests for provider behavior without a live model server
 */

use std::sync::Arc;
use subalign::app_config::{Config, EntityRecognizerKind};
use subalign::app_controller::Controller;
use subalign::errors::ProviderError;
use subalign::providers::ollama::{parse_entity_response, Ollama, OllamaEmbedder, OllamaEntityRecognizer};
use subalign::providers::{Embedder, EntityRecognizer};

// Nothing listens on the discard port
const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:9";

fn unreachable_client() -> Arc<Ollama> {
    Arc::new(Ollama::new_with_config(UNREACHABLE_ENDPOINT, 2, 1, 10))
}

/// Network failures surface as connection errors after the retries
#[tokio::test]
async fn test_embed_withUnreachableEndpoint_shouldReturnConnectionError() {
    let embedder = OllamaEmbedder::new(unreachable_client(), "paraphrase-multilingual");

    let result = embedder.embed(&["Hello".to_string()]).await;
    assert!(matches!(result, Err(ProviderError::ConnectionError(_))));
}

/// Empty batches never reach the network
#[tokio::test]
async fn test_embed_withEmptyBatch_shouldSkipRequest() {
    let embedder = OllamaEmbedder::new(unreachable_client(), "paraphrase-multilingual");
    assert!(embedder.embed(&[]).await.unwrap().is_empty());
    assert_eq!(embedder.model_name(), "paraphrase-multilingual");
}

/// Blank captions have no entities and need no request
#[tokio::test]
async fn test_recognize_withBlankText_shouldSkipRequest() {
    let recognizer = OllamaEntityRecognizer::new(unreachable_client(), "llama3.2:3b", "English");
    assert!(recognizer.recognize("   ").await.unwrap().is_empty());
}

/// The connection check reports an unreachable server
#[tokio::test]
async fn test_check_connection_withUnreachableEndpoint_shouldFail() {
    let mut config = Config::default();
    config.models.endpoint = UNREACHABLE_ENDPOINT.to_string();
    config.models.retry_count = 0;
    config.models.entity_recognizer = EntityRecognizerKind::Ollama;

    let controller = Controller::with_config(config).unwrap();
    let error = controller.check_connection().await.unwrap_err();
    assert!(format!("{:#}", error).contains("127.0.0.1:9"));
}

/// Controllers refuse invalid configurations
#[test]
fn test_controller_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.models.endpoint = "::not a url::".to_string();
    assert!(Controller::with_config(config).is_err());
}

/// Typical LLM answers parse into entity sets
#[test]
fn test_parse_entity_response_withCommonShapes_shouldParse() {
    let plain = parse_entity_response(r#"["Berlin", "1989"]"#).unwrap();
    assert_eq!(plain.len(), 2);

    let wrapped = parse_entity_response("Sure!\n{\"entities\": [\"NASA\"]}\nHope this helps.").unwrap();
    assert!(wrapped.contains("NASA"));

    let empty = parse_entity_response(r#"{"entities": []}"#).unwrap();
    assert!(empty.is_empty());

    assert!(parse_entity_response(r#"{"names": ["x"]}"#).is_err());
}
