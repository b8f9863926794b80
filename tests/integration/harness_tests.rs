use anyhow::Result;
use std::sync::Arc;

use embedprobe::config::{Config, EnvSnapshot, FileConfig, REPORTED_VARS};
use embedprobe::embeddings::Memory;
use embedprobe::harness::{print_banner, Harness, Outcome, END_BANNER, START_BANNER};

use crate::helpers::mock_embeddings::{FailingEmbedder, MockEmbedder};

struct Captured {
    outcome: Outcome,
    stdout: String,
    stderr: String,
}

async fn run_with<F>(env: &EnvSnapshot, build: F) -> Captured
where
    F: FnOnce(&Config) -> Result<Memory>,
{
    let config = Config::resolve(FileConfig::default(), env).unwrap();
    let mut out = Vec::new();
    let mut err = Vec::new();

    print_banner(&mut out).unwrap();
    let outcome = Harness::new(&config, env)
        .run_with(&mut out, &mut err, build)
        .await
        .unwrap();

    Captured {
        outcome,
        stdout: String::from_utf8(out).unwrap(),
        stderr: String::from_utf8(err).unwrap(),
    }
}

fn mock(dimension: usize) -> impl FnOnce(&Config) -> Result<Memory> {
    move |_: &Config| Ok(Memory::from_provider(Arc::new(MockEmbedder::new(dimension))))
}

fn split_routing_env() -> EnvSnapshot {
    EnvSnapshot::from_pairs([
        ("OPENAI_BASE_URL", "https://openrouter.ai/api/v1"),
        ("EMBEDDING", "openai:text-embedding-3-small"),
        ("FAST_LLM", "openrouter:google/gemini-2.0-flash-001"),
        ("SMART_LLM", "openrouter:anthropic/claude-3.5-sonnet"),
    ])
}

#[tokio::test]
async fn test_success_report() {
    let run = run_with(&split_routing_env(), mock(1536)).await;

    assert!(run.outcome.is_success());
    assert!(run
        .stdout
        .contains("✅ SUCCESS: Generated embeddings using provider: openai"));
    assert!(run.stdout.contains("Model: text-embedding-3-small"));
    assert!(run.stdout.contains("Embedding vector length: 1536"));
    assert!(run.stdout.contains("First few values: ["));
    assert!(!run.stdout.contains("ERROR"));
    assert!(run.stderr.is_empty());
}

#[tokio::test]
async fn test_banners_frame_the_report() {
    let run = run_with(&split_routing_env(), mock(8)).await;
    let lines: Vec<&str> = run.stdout.lines().collect();

    assert_eq!(lines[0], "");
    assert_eq!(lines[1], START_BANNER);
    assert_eq!(lines[3], "Current configuration:");
    assert_eq!(lines.last().copied(), Some(END_BANNER));
}

#[tokio::test]
async fn test_run_itself_starts_at_configuration_block() {
    let config = Config::default();
    let env = EnvSnapshot::default();
    let mut out = Vec::new();
    let mut err = Vec::new();

    Harness::new(&config, &env)
        .run_with(&mut out, &mut err, mock(8))
        .await
        .unwrap();

    let stdout = String::from_utf8(out).unwrap();
    assert!(stdout.starts_with("Current configuration:\n"));
    assert!(!stdout.contains(START_BANNER));
}

#[tokio::test]
async fn test_set_but_empty_variable_is_echoed_verbatim() {
    let env = EnvSnapshot::from_pairs([("OPENAI_BASE_URL", "")]);
    let run = run_with(&env, mock(8)).await;

    assert!(run.stdout.lines().any(|l| l == "OPENAI_BASE_URL: "));
    assert!(run.stdout.contains("OPENAI_EMBEDDINGS_BASE_URL: None"));
}

#[tokio::test]
async fn test_environment_lines_in_fixed_order_with_unset_marker() {
    let run = run_with(&split_routing_env(), mock(8)).await;
    let lines: Vec<&str> = run.stdout.lines().collect();

    let reported: Vec<&str> = lines[4..9].to_vec();
    assert_eq!(
        reported,
        vec![
            "OPENAI_BASE_URL: https://openrouter.ai/api/v1",
            "OPENAI_EMBEDDINGS_BASE_URL: None",
            "EMBEDDING: openai:text-embedding-3-small",
            "FAST_LLM: openrouter:google/gemini-2.0-flash-001",
            "SMART_LLM: openrouter:anthropic/claude-3.5-sonnet",
        ]
    );

    for name in REPORTED_VARS {
        let prefix = format!("{}: ", name);
        assert_eq!(
            run.stdout.lines().filter(|l| l.starts_with(&prefix)).count(),
            1
        );
    }
}

#[tokio::test]
async fn test_all_unset_still_prints_every_line() {
    let run = run_with(&EnvSnapshot::default(), mock(8)).await;

    for name in REPORTED_VARS {
        assert!(run.stdout.contains(&format!("{}: None", name)));
    }
}

#[tokio::test]
async fn test_dimension_is_stable_across_runs() {
    let env = split_routing_env();
    let first = run_with(&env, mock(768)).await;
    let second = run_with(&env, mock(768)).await;

    match (first.outcome, second.outcome) {
        (
            Outcome::Success { dimension: a, .. },
            Outcome::Success { dimension: b, .. },
        ) => {
            assert_eq!(a, 768);
            assert_eq!(a, b);
        }
        other => panic!("expected two successes, got {:?}", other),
    }
}

#[tokio::test]
async fn test_preview_values_are_finite() {
    let run = run_with(&split_routing_env(), mock(384)).await;

    let Outcome::Success { preview, .. } = run.outcome else {
        panic!("expected success");
    };
    assert_eq!(preview.len(), 3);
    assert!(preview.iter().all(|v| v.is_finite()));
}

#[tokio::test]
async fn test_embedding_failure_is_reported_and_banner_still_printed() {
    let run = run_with(&split_routing_env(), |_| {
        Ok(Memory::from_provider(Arc::new(FailingEmbedder {
            message: "invalid_api_key: Incorrect API key provided",
        })))
    })
    .await;

    assert!(!run.outcome.is_success());
    assert!(run
        .stdout
        .contains("❌ ERROR testing embeddings: invalid_api_key: Incorrect API key provided"));
    assert!(!run.stdout.contains("SUCCESS"));
    assert!(run.stdout.trim_end().ends_with(END_BANNER));
    assert!(run.stderr.contains("invalid_api_key"));
}

#[tokio::test]
async fn test_client_construction_failure_is_caught() {
    // No API key anywhere: the real factory fails while building the client
    let run = run_with(&split_routing_env(), |config| {
        Memory::new(&config.embedding_provider, &config.embedding_model, config)
    })
    .await;

    match &run.outcome {
        Outcome::Failed { message } => assert!(message.contains("API key")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(run.stdout.contains("❌ ERROR testing embeddings:"));
    assert!(run.stdout.contains(END_BANNER));
}

#[tokio::test]
#[ignore] // Requires OPENAI_API_KEY (or OPENAI_EMBEDDINGS_API_KEY) and network access
async fn test_live_openai_embeddings() {
    let env = EnvSnapshot::capture();
    let config = Config::resolve(FileConfig::default(), &env).unwrap();
    let mut out = Vec::new();
    let mut err = Vec::new();

    let outcome = Harness::new(&config, &env)
        .run(&mut out, &mut err)
        .await
        .unwrap();

    let stdout = String::from_utf8(out).unwrap();
    assert!(outcome.is_success(), "{}", stdout);
    assert!(stdout.contains("Embedding vector length:"));
}
