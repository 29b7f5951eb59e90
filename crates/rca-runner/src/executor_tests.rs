use super::*;
use crate::recipes::{ConversationalQa, DocumentQa, ShortAnswerQa};
use anyhow::bail;
use async_trait::async_trait;
use rca_agents::AgentRegistry;
use rca_api::MemoizedClient;
use rca_api::testing::ScriptedTransport;
use rca_cache::MemoryCache;
use serde_json::json;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn context_over(transport: Arc<ScriptedTransport>) -> RecipeContext {
    let client = MemoizedClient::new(transport, Arc::new(MemoryCache::new()), Some("KEY".into()));
    RecipeContext::new(AgentRegistry::new(Arc::new(client)))
}

fn offline_context() -> RecipeContext {
    context_over(Arc::new(ScriptedTransport::new()))
}

fn write_inputs(dir: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(name, text)| {
            let path = dir.join(name);
            std::fs::write(&path, text).unwrap();
            path
        })
        .collect()
}

/// Echoes the document id; fails on ids containing "bad".
struct Echo {
    mode: Mode,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Echo {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Recipe for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    async fn run(
        &self,
        _ctx: &RecipeContext,
        document: Option<&Document>,
        args: &Value,
    ) -> Result<Value> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        match document {
            Some(doc) if doc.id.contains("bad") => bail!("cannot read {}", doc.id),
            Some(doc) => Ok(json!({ "id": doc.id, "len": doc.text.len() })),
            None => Ok(json!({ "standalone": true, "args": args })),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_two_documents_give_two_entries_keyed_by_id() {
    let tmp = tempfile::tempdir().unwrap();
    let inputs = write_inputs(tmp.path(), &[("one.txt", "1"), ("two.txt", "22")]);
    let recipe = Arc::new(Echo::new(Mode::Machine));

    let results = RecipeExecutor::new(recipe.clone(), offline_context())
        .with_inputs(inputs)
        .with_machine_concurrency(5)
        .run(&json!({}))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    let ids: Vec<&str> = results.entries().iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["one.txt", "two.txt"]);
    assert_eq!(results.get("two.txt").unwrap()["len"], 2);
    assert_eq!(recipe.peak.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_no_inputs_runs_once_standalone() {
    let results = RecipeExecutor::new(Arc::new(Echo::new(Mode::Machine)), offline_context())
        .run(&json!({"x": 1}))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    let value = results.get(STANDALONE_KEY).unwrap();
    assert_eq!(value["args"]["x"], 1);
}

#[tokio::test(start_paused = true)]
async fn test_human_mode_runs_one_at_a_time() {
    let tmp = tempfile::tempdir().unwrap();
    let inputs = write_inputs(tmp.path(), &[("a", ""), ("b", ""), ("c", "")]);
    let recipe = Arc::new(Echo::new(Mode::Human));
    let executor = RecipeExecutor::new(recipe.clone(), offline_context())
        .with_inputs(inputs)
        .with_machine_concurrency(5);

    assert_eq!(executor.concurrency(), 1);
    executor.run(&json!({})).await.unwrap();
    assert_eq!(recipe.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failure_aborts_batch_by_default() {
    let tmp = tempfile::tempdir().unwrap();
    let inputs = write_inputs(tmp.path(), &[("good.txt", ""), ("bad.txt", "")]);

    let err = RecipeExecutor::new(Arc::new(Echo::new(Mode::Machine)), offline_context())
        .with_inputs(inputs)
        .run(&json!({}))
        .await
        .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("Recipe 'echo' failed on bad.txt"), "{message}");
    assert!(message.contains("cannot read bad.txt"), "{message}");
}

#[tokio::test(start_paused = true)]
async fn test_keep_going_reports_failures_and_keeps_the_rest() {
    let tmp = tempfile::tempdir().unwrap();
    let inputs = write_inputs(
        tmp.path(),
        &[("first.txt", ""), ("bad.txt", ""), ("last.txt", "")],
    );

    let results = RecipeExecutor::new(Arc::new(Echo::new(Mode::Machine)), offline_context())
        .with_inputs(inputs)
        .with_keep_going(true)
        .run(&json!({}))
        .await
        .unwrap();

    let ids: Vec<&str> = results.entries().iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["first.txt", "last.txt"]);
    assert_eq!(results.failures().len(), 1);
    assert_eq!(results.failures()[0].0, "bad.txt");
}

#[tokio::test]
async fn test_missing_input_file_fails_before_running() {
    let tmp = tempfile::tempdir().unwrap();
    let recipe = Arc::new(Echo::new(Mode::Machine));
    let err = RecipeExecutor::new(recipe.clone(), offline_context())
        .with_inputs(vec![tmp.path().join("nope.txt")])
        .run(&json!({}))
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("nope.txt"));
    assert_eq!(recipe.peak.load(Ordering::SeqCst), 0);
}

// --- built-in recipes ---

#[tokio::test]
async fn test_short_answer_recipe_end_to_end() {
    let transport = Arc::new(ScriptedTransport::always(json!({"result": "2,462 miles"})));
    let results = RecipeExecutor::new(
        Arc::new(ShortAnswerQa::new(Mode::Machine)),
        context_over(Arc::clone(&transport)),
    )
    .run(&json!({}))
    .await
    .unwrap();

    assert_eq!(results.get(STANDALONE_KEY), Some(&json!("2,462 miles")));
    assert!(transport.requests()[0]
        .query
        .contains("i=How%20far%20is%20Los%20Angeles%20from%20New%20York%3F"));
}

#[tokio::test]
async fn test_conversational_recipe_threads_follow_ups() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .push(Ok(json!({
                "result": "302.6 square miles",
                "conversationID": "C1",
                "host": "h1",
                "s": "4"
            })))
            .push(Ok(json!({"result": "27,000 people per square mile"}))),
    );
    let results = RecipeExecutor::new(
        Arc::new(ConversationalQa::new(Mode::Machine)),
        context_over(Arc::clone(&transport)),
    )
    .run(&json!({}))
    .await
    .unwrap();

    let answers = results.get(STANDALONE_KEY).unwrap();
    assert_eq!(answers[0]["question"], "What is the size of New York City?");
    assert_eq!(answers[1]["answer"], "27,000 people per square mile");

    let sent = transport.requests();
    assert!(sent[1].query.contains("conversationid=C1"));
    assert_eq!(sent[1].host.as_deref(), Some("h1"));
}

#[tokio::test]
async fn test_document_recipe_answers_each_question_line() {
    let tmp = tempfile::tempdir().unwrap();
    let inputs = write_inputs(
        tmp.path(),
        &[("geo.txt", "Notes\nHow tall is Everest?\nHow deep is the Mariana Trench?\n")],
    );
    let transport = Arc::new(ScriptedTransport::always(json!({"result": "very"})));

    let recipe = Arc::new(DocumentQa::new(Mode::Machine));
    let results = RecipeExecutor::new(recipe.clone(), context_over(Arc::clone(&transport)))
        .with_inputs(inputs)
        .run(&json!({"units": "metric"}))
        .await
        .unwrap();

    let rows = recipe.to_json("geo.txt", results.get("geo.txt").unwrap());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["question"], "How tall is Everest?");
    assert_eq!(transport.call_count(), 2);
    assert!(transport.requests().iter().all(|r| r.query.ends_with("&units=metric")));
}

#[tokio::test]
async fn test_document_recipe_without_input_is_an_error() {
    let err = RecipeExecutor::new(Arc::new(DocumentQa::new(Mode::Machine)), offline_context())
        .run(&json!({}))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("--input"));
}
