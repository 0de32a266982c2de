//! End-to-end pipeline scenarios over a deterministic completion service.

use async_trait::async_trait;
use recipe_harvest::writer::parse_metadata_block;
use recipe_harvest::{
    pipeline, Classification, CompletionService, IdentityTracker, RawMessage, RecipeCandidate,
    RecipeWriter, ServiceError,
};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::tempdir;

/// Completion service double scripted per message text.
#[derive(Default)]
struct ScriptedService {
    classifications: HashMap<String, Classification>,
    extractions: HashMap<String, Vec<RecipeCandidate>>,
    completions: HashMap<String, RecipeCandidate>,
    classify_errors: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedService {
    fn record(&self, kind: &str, text: &str) {
        self.calls.lock().unwrap().push(format!("{kind}:{text}"));
    }

    fn calls_of(&self, kind: &str) -> usize {
        let prefix = format!("{kind}:");
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(&prefix))
            .count()
    }
}

#[async_trait]
impl CompletionService for ScriptedService {
    async fn classify(&self, text: &str) -> Result<Classification, ServiceError> {
        self.record("classify", text);
        if self.classify_errors.contains(text) {
            return Err(ServiceError::Response("scripted failure".to_string()));
        }
        Ok(self.classifications.get(text).cloned().unwrap_or_default())
    }

    async fn extract(&self, text: &str) -> Result<RecipeCandidate, ServiceError> {
        self.record("extract", text);
        Ok(self
            .extractions
            .get(text)
            .and_then(|candidates| candidates.first().cloned())
            .unwrap_or_default())
    }

    async fn extract_all(&self, text: &str) -> Result<Vec<RecipeCandidate>, ServiceError> {
        self.record("extract_all", text);
        Ok(self.extractions.get(text).cloned().unwrap_or_default())
    }

    async fn complete(&self, text: &str) -> Result<RecipeCandidate, ServiceError> {
        self.record("complete", text);
        Ok(self.completions.get(text).cloned().unwrap_or_default())
    }
}

fn recipe_class(categories: &[&str]) -> Classification {
    Classification {
        is_recipe: true,
        categories: categories.iter().map(|c| c.to_string()).collect(),
    }
}

fn message(id: &str, text: &str) -> RawMessage {
    RawMessage {
        id: id.to_string(),
        thread_id: "thread-1".to_string(),
        // 2024-01-02T03:04:05Z
        created_at: 1_704_164_645.0,
        text: text.to_string(),
    }
}

fn candidate(title: &str, ingredients: &[&str], steps: &[&str]) -> RecipeCandidate {
    RecipeCandidate {
        title: title.to_string(),
        ingredients: ingredients.iter().map(|i| i.to_string()).collect(),
        steps: steps.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn persisted_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn scenario_a_complete_first_pass_skips_completion() {
    let corpus = tempdir().unwrap();
    let writer = RecipeWriter::new(corpus.path());
    let mut tracker = IdentityTracker::new();

    let text = "Борщ: свёкла, капуста, картофель, морковь, лук, томатная паста...";
    let borscht = candidate(
        "Борщ",
        &["свёкла", "капуста", "картофель", "морковь", "лук", "томатная паста"],
        &["сварить бульон", "добавить свёклу", "добавить капусту", "варить", "подавать"],
    );

    let mut service = ScriptedService::default();
    service.classifications.insert(text.to_string(), recipe_class(&["soup"]));
    service.extractions.insert(text.to_string(), vec![borscht]);

    let summary = pipeline::run(&service, &mut tracker, &writer, &[message("m1", text)]).await;

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.written, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(service.calls_of("complete"), 0);

    let path = corpus.path().join("2024/01/02/borshch.md");
    assert!(path.exists());
    let content = fs::read_to_string(&path).unwrap();
    let fields = parse_metadata_block(&content).unwrap();
    assert_eq!(fields.get("source_message_id").unwrap(), "m1");
    assert_eq!(fields.get("source_thread").unwrap(), "thread-1");
    assert!(fields.get("source_recipe_index").is_none());
    assert!(content.contains("tags: [recipe, soup]"));
    assert!(content.contains("- томатная паста"));
    assert!(content.contains("5. подавать"));
}

#[tokio::test]
async fn scenario_b_incomplete_candidate_uses_completer_output() {
    let corpus = tempdir().unwrap();
    let writer = RecipeWriter::new(corpus.path());
    let mut tracker = IdentityTracker::new();

    let text = "Вчера делал плов, только рис запомнил";
    let partial = candidate("Плов", &["рис"], &[]);
    let repaired = candidate(
        "Плов",
        &["рис", "баранина", "морковь", "лук", "зира"],
        &["обжарить мясо", "добавить рис", "тушить"],
    );

    let mut service = ScriptedService::default();
    service.classifications.insert(text.to_string(), recipe_class(&["meat"]));
    service.extractions.insert(text.to_string(), vec![partial]);
    service.completions.insert(text.to_string(), repaired);

    let summary = pipeline::run(&service, &mut tracker, &writer, &[message("m1", text)]).await;

    assert_eq!(summary.written, 1);
    assert_eq!(service.calls_of("complete"), 1);

    let content = fs::read_to_string(corpus.path().join("2024/01/02/plov.md")).unwrap();
    // The completer's output was written, not the partial extraction
    assert!(content.contains("- зира"));
    assert!(content.contains("3. тушить"));
}

#[tokio::test]
async fn scenario_b_still_incomplete_after_completion_is_dropped() {
    let corpus = tempdir().unwrap();
    let writer = RecipeWriter::new(corpus.path());
    let mut tracker = IdentityTracker::new();

    let text = "что-то про еду";
    let mut service = ScriptedService::default();
    service.classifications.insert(text.to_string(), recipe_class(&[]));
    service
        .extractions
        .insert(text.to_string(), vec![candidate("Еда", &["соль"], &[])]);
    // Completer output below the 5-ingredient / 3-step bar
    service.completions.insert(
        text.to_string(),
        candidate("Еда", &["соль", "перец", "вода", "мука"], &["смешать", "готовить", "есть"]),
    );

    let summary = pipeline::run(&service, &mut tracker, &writer, &[message("m1", text)]).await;

    assert_eq!(summary.written, 0);
    assert_eq!(summary.skipped, 1);
    assert!(persisted_files(corpus.path()).is_empty());
    // No identity recorded: the message is eligible for retry
    assert!(tracker.is_empty());
}

#[tokio::test]
async fn scenario_c_multi_recipe_fan_out_with_indices() {
    let corpus = tempdir().unwrap();
    let writer = RecipeWriter::new(corpus.path());
    let mut tracker = IdentityTracker::new();

    let text = "Салат и суп в одном сообщении";
    let salad = candidate(
        "Салат из свёклы",
        &["свёкла", "чеснок", "майонез"],
        &["отварить", "натереть", "заправить"],
    );
    let soup = candidate(
        "Суп грибной",
        &["грибы", "картофель", "лук"],
        &["обжарить", "сварить"],
    );

    let mut service = ScriptedService::default();
    service
        .classifications
        .insert(text.to_string(), recipe_class(&["vegetables", "soup"]));
    service.extractions.insert(text.to_string(), vec![salad, soup]);

    let summary = pipeline::run(&service, &mut tracker, &writer, &[message("m1", text)]).await;

    assert_eq!(summary.written, 2);
    let files = persisted_files(corpus.path());
    assert_eq!(files.len(), 2);

    let salad_content =
        fs::read_to_string(corpus.path().join("2024/01/02/salat-iz-svekly.md")).unwrap();
    let soup_content =
        fs::read_to_string(corpus.path().join("2024/01/02/sup-gribnoi-1.md")).unwrap();

    let salad_fields = parse_metadata_block(&salad_content).unwrap();
    assert!(salad_fields.get("source_recipe_index").is_none());
    let soup_fields = parse_metadata_block(&soup_content).unwrap();
    assert_eq!(soup_fields.get("source_recipe_index").unwrap(), "1");

    // Identity uniqueness across the produced corpus
    let mut identities = HashSet::new();
    for file in &files {
        let fields = parse_metadata_block(&fs::read_to_string(file).unwrap()).unwrap();
        let key = (
            fields.get("source_message_id").cloned(),
            fields.get("source_recipe_index").cloned(),
        );
        assert!(identities.insert(key));
    }
}

#[tokio::test]
async fn scenario_c_slug_collision_gets_suffix() {
    let corpus = tempdir().unwrap();
    let writer = RecipeWriter::new(corpus.path());
    let mut tracker = IdentityTracker::new();

    let text = "Два супа";
    let first = candidate("Суп", &["вода", "соль"], &["кипятить", "солить"]);
    let second = candidate("Суп", &["вода", "перец"], &["кипятить", "перчить"]);

    let mut service = ScriptedService::default();
    service.classifications.insert(text.to_string(), recipe_class(&["soup"]));
    service.extractions.insert(text.to_string(), vec![first, second]);

    let summary = pipeline::run(&service, &mut tracker, &writer, &[message("m1", text)]).await;

    assert_eq!(summary.written, 2);
    assert!(corpus.path().join("2024/01/02/sup.md").exists());
    assert!(corpus.path().join("2024/01/02/sup-1.md").exists());
}

#[tokio::test]
async fn scenario_d_empty_extraction_leaves_message_retryable() {
    let corpus = tempdir().unwrap();
    let writer = RecipeWriter::new(corpus.path());
    let mut tracker = IdentityTracker::new();

    let text = "Рецепт был, но сервис вернул мусор";
    let mut service = ScriptedService::default();
    service.classifications.insert(text.to_string(), recipe_class(&[]));
    // No scripted extraction: extract_all yields an empty list

    let messages = [message("m1", text)];
    let summary = pipeline::run(&service, &mut tracker, &writer, &messages).await;

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.written, 0);
    assert!(persisted_files(corpus.path()).is_empty());
    assert!(tracker.is_empty());

    // Next run the message is scanned again
    let summary = pipeline::run(&service, &mut tracker, &writer, &messages).await;
    assert_eq!(summary.scanned, 1);
    assert_eq!(service.calls_of("classify"), 2);
}

#[tokio::test]
async fn classification_short_circuit_prevents_extraction() {
    let corpus = tempdir().unwrap();
    let writer = RecipeWriter::new(corpus.path());
    let mut tracker = IdentityTracker::new();

    let text = "Привет, как дела?";
    let service = ScriptedService::default(); // classifies everything as not-a-recipe

    let summary = pipeline::run(&service, &mut tracker, &writer, &[message("m1", text)]).await;

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.written, 0);
    assert_eq!(service.calls_of("classify"), 1);
    assert_eq!(service.calls_of("extract_all"), 0);
    assert!(persisted_files(corpus.path()).is_empty());
}

#[tokio::test]
async fn classification_error_skips_message_without_identity() {
    let corpus = tempdir().unwrap();
    let writer = RecipeWriter::new(corpus.path());
    let mut tracker = IdentityTracker::new();

    let text = "борщ";
    let mut service = ScriptedService::default();
    service.classify_errors.insert(text.to_string());

    let summary = pipeline::run(&service, &mut tracker, &writer, &[message("m1", text)]).await;

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.written, 0);
    assert!(tracker.is_empty());
    assert_eq!(service.calls_of("extract_all"), 0);
}

#[tokio::test]
async fn second_run_over_unchanged_corpus_is_a_no_op() {
    let corpus = tempdir().unwrap();
    let writer = RecipeWriter::new(corpus.path());

    let text = "Борщ с шестью ингредиентами";
    let borscht = candidate(
        "Борщ",
        &["свёкла", "капуста", "картофель", "морковь", "лук", "паста"],
        &["бульон", "свёкла", "капуста", "варить", "подавать"],
    );

    let mut service = ScriptedService::default();
    service.classifications.insert(text.to_string(), recipe_class(&["soup"]));
    service.extractions.insert(text.to_string(), vec![borscht]);

    let messages = [message("m1", text)];

    // First run starts from an on-disk scan of the empty corpus
    let mut tracker = IdentityTracker::load(corpus.path());
    let first = pipeline::run(&service, &mut tracker, &writer, &messages).await;
    assert_eq!(first.written, 1);
    let files_after_first = persisted_files(corpus.path());

    // Second, independent run rebuilds its identity set from the corpus
    let mut tracker = IdentityTracker::load(corpus.path());
    assert_eq!(tracker.len(), 1);
    let second = pipeline::run(&service, &mut tracker, &writer, &messages).await;

    assert_eq!(second.scanned, 0);
    assert_eq!(second.written, 0);
    assert_eq!(persisted_files(corpus.path()), files_after_first);
    assert_eq!(tracker.len(), 1);
    // The pre-check saved every service call on the second run
    assert_eq!(service.calls_of("classify"), 1);
    assert_eq!(service.calls_of("extract_all"), 1);
}

#[tokio::test]
async fn completeness_gate_holds_for_every_persisted_file() {
    let corpus = tempdir().unwrap();
    let writer = RecipeWriter::new(corpus.path());
    let mut tracker = IdentityTracker::new();

    let text = "сообщение с полным и пустым кандидатом";
    let good = candidate("Щи", &["капуста", "вода"], &["варить", "подавать"]);
    let empty = RecipeCandidate::default();

    let mut service = ScriptedService::default();
    service.classifications.insert(text.to_string(), recipe_class(&["soup"]));
    service.extractions.insert(text.to_string(), vec![good, empty]);
    // Completer cannot rescue the empty candidate either
    service
        .completions
        .insert(text.to_string(), RecipeCandidate::default());

    let summary = pipeline::run(&service, &mut tracker, &writer, &[message("m1", text)]).await;
    assert_eq!(summary.written, 1);
    assert_eq!(summary.skipped, 1);

    for file in persisted_files(corpus.path()) {
        let content = fs::read_to_string(&file).unwrap();
        let fields = parse_metadata_block(&content).unwrap();
        assert!(!fields.get("title").unwrap().trim().is_empty());
        let ingredients = fields.get("ingredients").unwrap();
        let steps = fields.get("steps").unwrap();
        assert!(ingredients.matches('"').count() / 2 >= 2);
        assert!(steps.matches('"').count() / 2 >= 2);
    }
}

#[tokio::test]
async fn existing_path_records_identity_without_rewriting() {
    let corpus = tempdir().unwrap();
    let writer = RecipeWriter::new(corpus.path());
    let mut tracker = IdentityTracker::new();

    // A manually placed file at the derived path
    let path = corpus.path().join("2024/01/02/sup.md");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "hand-made\n").unwrap();

    let text = "суп";
    let mut service = ScriptedService::default();
    service.classifications.insert(text.to_string(), recipe_class(&["soup"]));
    service.extractions.insert(
        text.to_string(),
        vec![candidate("Суп", &["вода", "соль"], &["кипятить", "солить"])],
    );

    let summary = pipeline::run(&service, &mut tracker, &writer, &[message("m1", text)]).await;

    assert_eq!(summary.written, 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), "hand-made\n");
    // Identity still recorded so the message is not reprocessed
    assert!(!tracker.is_empty());
}
