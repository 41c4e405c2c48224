use tack_core::cli::Invocation;
use tack_core::commands::{dispatch, run_shell};
use tack_core::config::Config;
use tack_core::render::Renderer;
use tack_core::{Category, TaskStore};
use tempfile::tempdir;

fn shell(store: &mut TaskStore, cfg: &Config, input: &[u8]) -> (usize, String) {
    let mut out = Vec::new();
    let failed = run_shell(store, cfg, &mut Renderer::plain(), input, &mut out, false)
        .expect("shell session");
    (failed, String::from_utf8(out).expect("utf-8 warnings"))
}

fn run(store: &mut TaskStore, cfg: &Config, words: &[&str]) -> anyhow::Result<()> {
    let tokens = words.iter().map(|s| s.to_string()).collect();
    let inv = Invocation::from_tokens(cfg, tokens)?;
    dispatch(store, cfg, &mut Renderer::plain(), inv)
}

#[test]
fn add_done_delete_are_saved_immediately() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("tasks.json");
    let cfg = Config::default();
    let mut store = TaskStore::open(&path).expect("open");

    run(&mut store, &cfg, &["add", "draft", "slides", "cat:work"]).expect("add work");
    run(&mut store, &cfg, &["add", "buy", "bread"]).expect("add general");
    run(&mut store, &cfg, &["study", "add", "chapter", "4"]).expect("add study");

    let on_disk = TaskStore::open(&path).expect("reopen");
    let summary: Vec<(&str, Category)> = on_disk
        .tasks()
        .iter()
        .map(|task| (task.text.as_str(), task.category))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("draft slides", Category::Work),
            ("buy bread", Category::General),
            ("chapter 4", Category::Study),
        ]
    );

    run(&mut store, &cfg, &["study", "done", "1"]).expect("done");
    let on_disk = TaskStore::open(&path).expect("reopen");
    assert!(on_disk.tasks()[2].completed);
    assert!(!on_disk.tasks()[0].completed);

    run(&mut store, &cfg, &["work", "delete", "1"]).expect("delete");
    let on_disk = TaskStore::open(&path).expect("reopen");
    assert_eq!(on_disk.len(), 2);
    assert_eq!(on_disk.tasks()[0].text, "buy bread");
}

#[test]
fn rejected_commands_leave_the_file_alone() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("tasks.json");
    let cfg = Config::default();
    let mut store = TaskStore::open(&path).expect("open");

    assert!(run(&mut store, &cfg, &["add"]).is_err());
    assert!(run(&mut store, &cfg, &["done", "1"]).is_err());
    assert!(!path.exists());

    run(&mut store, &cfg, &["add", "only", "task"]).expect("add");
    assert!(run(&mut store, &cfg, &["personal", "delete", "1"]).is_err());
    assert!(run(&mut store, &cfg, &["delete"]).is_err());
    assert_eq!(TaskStore::open(&path).expect("reopen").len(), 1);
}

#[test]
fn default_category_comes_from_config() {
    let temp = tempdir().expect("tempdir");
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![("default.category".to_string(), "personal".to_string())]);
    let mut store = TaskStore::open(&temp.path().join("tasks.json")).expect("open");

    run(&mut store, &cfg, &["add", "call", "grandma"]).expect("add");
    assert_eq!(store.tasks()[0].category, Category::Personal);
}

#[test]
fn read_only_commands_do_not_write() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("tasks.json");
    let cfg = Config::default();
    let mut store = TaskStore::open(&path).expect("open");

    run(&mut store, &cfg, &[]).expect("default list");
    run(&mut store, &cfg, &["work", "export"]).expect("export");
    run(&mut store, &cfg, &["categories"]).expect("categories");
    assert!(!path.exists());
}

#[test]
fn shell_keeps_going_after_bad_lines() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("tasks.json");
    let cfg = Config::default();
    let mut store = TaskStore::open(&path).expect("open");

    let input = b"add first\nfrobnicate\ndone 9\n\xff\xfe\n\nadd second cat:work\nquit\nadd never\n";
    let (failed, warnings) = shell(&mut store, &cfg, input);

    assert_eq!(failed, 3);
    assert_eq!(warnings.lines().count(), 3);
    assert!(warnings.lines().all(|line| line.starts_with("warning: ")));
    assert!(warnings.contains("no task #9 in the All list (1 shown)"));

    let on_disk = TaskStore::open(&path).expect("reopen");
    let texts: Vec<&str> = on_disk.tasks().iter().map(|task| task.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert_eq!(on_disk.tasks()[1].category, Category::Work);
}

#[test]
fn shell_save_failure_is_kept_until_the_next_save() {
    let temp = tempdir().expect("tempdir");
    let dir = temp.path().join("later");
    let path = dir.join("tasks.json");
    let cfg = Config::default();
    let mut store = TaskStore::open(&path).expect("open");

    let (failed, warnings) = shell(&mut store, &cfg, b"add pay rent\n");
    assert_eq!(failed, 1);
    assert!(warnings.contains("change applied in memory but not saved to"));
    assert!(warnings.contains("tasks.json"));
    assert_eq!(store.len(), 1);
    assert!(!path.exists());

    std::fs::create_dir(&dir).expect("create dir");
    let (failed, warnings) = shell(&mut store, &cfg, b"add water plants\n");
    assert_eq!(failed, 0, "{warnings}");

    let on_disk = TaskStore::open(&path).expect("reopen");
    let texts: Vec<&str> = on_disk.tasks().iter().map(|task| task.text.as_str()).collect();
    assert_eq!(texts, vec!["pay rent", "water plants"]);
}

#[test]
fn nested_shell_is_refused() {
    let temp = tempdir().expect("tempdir");
    let cfg = Config::default();
    let mut store = TaskStore::open(&temp.path().join("tasks.json")).expect("open");

    let (failed, warnings) = shell(&mut store, &cfg, b"shell\n");
    assert_eq!(failed, 1);
    assert!(warnings.contains("already in a shell session"));
}
