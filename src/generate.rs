//! Rule resolution, task expansion and the sequential generation run.
//!
//! ## Stages
//!
//! 1. **Resolve** ([`Generator::new`]): the selector picks rules from the
//!    configuration, invalid rules are dropped with warnings, and the target
//!    root is fixed.
//! 2. **Plan** ([`Generator::plan`]): every rule × source × image becomes one
//!    [`GenerationTask`] with absolute source and target paths.
//! 3. **Run** ([`Generator::run`]): tasks execute one at a time in plan order.
//!    The first failure ends the run. When every task succeeded, the
//!    `Contents.json` files of the registered directories are updated once.
//!
//! ## Selectors
//!
//! | Selector | Rules |
//! |---|---|
//! | `all` (any case) | every rule, in document order |
//! | `ios:*` | every rule whose key starts with `ios:` |
//! | anything else | the rule with exactly that key |
//!
//! ## Target paths
//!
//! `<target>/<targetPath>/<fileName>`, then the first `{source}` becomes the
//! source token (for rules with `sourceFiles`), then each
//! `replaceInTargetName` entry replaces its first occurrence, in document
//! order.

use crate::config::{Configuration, ContentsConfig, ImageSpec, Rule};
use crate::contents::{ContentsUpdater, EntryMeta, SyncSummary};
use crate::imaging::{ImageBackend, ImageError, ImageTask, RustBackend, generate_image};
use crate::validation::{parse_size, rule_is_valid};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("No configuration rule set, can not continue")]
    NoRule,
    #[error("Invalid rule found for {selector}, please check configuration")]
    NoValidRules { selector: String },
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Which rules a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    All,
    /// Rules whose key starts with this prefix.
    Prefix(String),
    /// The single rule with this key.
    Named(String),
}

impl Selector {
    pub fn parse(selector: &str) -> Self {
        let selector = selector.trim();
        if selector.eq_ignore_ascii_case("all") {
            Self::All
        } else if is_prefix_selector(selector) {
            let prefix = selector.strip_suffix('*').unwrap_or(selector).trim();
            Self::Prefix(prefix.to_string())
        } else {
            Self::Named(selector.to_string())
        }
    }

    fn resolve(&self, config: &Configuration) -> Vec<Rule> {
        match self {
            Self::All => config.config_for_all_rules(),
            Self::Prefix(prefix) => config.config_for_generic_rules(prefix),
            Self::Named(name) => vec![config.config_for_rule(name)],
        }
    }
}

/// `^\w+:\*` with ASCII word characters.
fn is_prefix_selector(selector: &str) -> bool {
    let word_len = selector
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    word_len > 0 && selector[word_len..].starts_with(":*")
}

/// Run parameters.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Rule selector, see [`Selector`].
    pub rule: String,
    /// Output directory, relative to the target root unless absolute.
    pub target: Option<PathBuf>,
    /// Base for a relative `rootPath`, and the root when none is set.
    pub working_dir: PathBuf,
}

/// How a task's directory takes part in the `Contents.json` update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentsRequest {
    /// Listed with `universal`/`2x`.
    Default,
    /// Listed with this idiom and scale for the task's file.
    Explicit(EntryMeta),
}

impl ContentsRequest {
    fn from_config(config: &ContentsConfig) -> Self {
        config.meta().map_or(Self::Default, Self::Explicit)
    }
}

/// One planned image.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationTask {
    /// Position of the owning rule in the resolved list.
    pub rule_index: usize,
    pub rule: String,
    /// Source file name without extension, for rules with `sourceFiles`.
    pub source_token: Option<String>,
    pub image: ImageTask,
    pub contents: Option<ContentsRequest>,
}

/// Progress reported while a run executes.
#[derive(Debug, Clone)]
pub enum GenerateEvent {
    RuleStarted {
        name: String,
        task_count: usize,
    },
    ImageGenerated {
        /// 1-based position within the rule.
        index: usize,
        task: ImageTask,
        /// Optional transforms applied after scaling.
        retouched: Vec<&'static str>,
    },
    ContentsUpdated {
        directory: PathBuf,
    },
    ContentsFailed {
        directory: PathBuf,
        error: String,
    },
}

/// Result of a successful run.
#[derive(Debug, Default)]
pub struct GenerateReport {
    /// Written images, in run order.
    pub generated: Vec<PathBuf>,
    pub contents: SyncSummary,
}

/// A resolved, validated set of rules ready to plan and run.
#[derive(Debug)]
pub struct Generator<'a> {
    config: &'a Configuration,
    rules: Vec<Rule>,
    target: PathBuf,
}

impl<'a> Generator<'a> {
    pub fn new(config: &'a Configuration, options: &GenerateOptions) -> Result<Self, GenerateError> {
        if options.rule.trim().is_empty() {
            return Err(GenerateError::NoRule);
        }

        let selector = Selector::parse(&options.rule);
        let rules: Vec<Rule> = selector
            .resolve(config)
            .into_iter()
            .filter(rule_is_valid)
            .collect();
        if rules.is_empty() {
            return Err(GenerateError::NoValidRules {
                selector: options.rule.clone(),
            });
        }

        let root = match &config.generator_config().root_path {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) if !root.as_os_str().is_empty() => options.working_dir.join(root),
            _ => options.working_dir.clone(),
        };
        let target = match &options.target {
            Some(target) if target.is_absolute() => target.clone(),
            Some(target) if !target.as_os_str().is_empty() => root.join(target),
            _ => root,
        };

        tracing::debug!(
            rules = rules.len(),
            target = %target.display(),
            "resolved selector {:?}",
            options.rule
        );
        Ok(Self {
            config,
            rules,
            target,
        })
    }

    /// Valid rules selected for this run, in run order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Directory all target paths are joined onto.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Expand the rules into tasks: rule, then source, then image order.
    pub fn plan(&self) -> Vec<GenerationTask> {
        let mut tasks = Vec::new();
        for (rule_index, rule) in self.rules.iter().enumerate() {
            for (source, token) in sources(rule) {
                let original = self.config.directory().join(source);
                for image in &rule.images {
                    let Some((width, height)) = parse_size(&image.size) else {
                        continue;
                    };
                    tasks.push(GenerationTask {
                        rule_index,
                        rule: rule_name(rule).to_string(),
                        source_token: token.clone(),
                        image: ImageTask {
                            original: original.clone(),
                            target: target_path(&self.target, image, token.as_deref()),
                            width,
                            height,
                            no_crop: image.no_crop,
                            colorize: image.colorize.clone(),
                            fill_color: image.fill_color.clone(),
                            compose: image.compose.clone(),
                        },
                        contents: self.contents_request(rule, image),
                    });
                }
            }
        }
        tasks
    }

    /// Image setting, then rule setting, then the generator option.
    fn contents_request(&self, rule: &Rule, image: &ImageSpec) -> Option<ContentsRequest> {
        match (&image.create_contents_json, &rule.create_contents_json) {
            (Some(config), _) | (None, Some(config)) => Some(ContentsRequest::from_config(config)),
            (None, None) if self.config.generator_config().create_contents_json => {
                Some(ContentsRequest::Default)
            }
            (None, None) => None,
        }
    }

    /// Generate every planned image, then update `Contents.json` files.
    ///
    /// Stops at the first image that fails; images written before it stay on
    /// disk and no `Contents.json` is touched.
    pub fn run(
        &self,
        backend: &impl ImageBackend,
        events: Option<Sender<GenerateEvent>>,
    ) -> Result<GenerateReport, GenerateError> {
        let tasks = self.plan();
        let mut updater = ContentsUpdater::new();
        let mut report = GenerateReport::default();

        for group in tasks.chunk_by(|a, b| a.rule_index == b.rule_index) {
            emit(
                &events,
                GenerateEvent::RuleStarted {
                    name: group[0].rule.clone(),
                    task_count: group.len(),
                },
            );

            for (position, task) in group.iter().enumerate() {
                let outcome = generate_image(backend, &task.image)?;
                register_contents(&mut updater, task);
                report.generated.push(task.image.target.clone());
                emit(
                    &events,
                    GenerateEvent::ImageGenerated {
                        index: position + 1,
                        task: task.image.clone(),
                        retouched: outcome.retouched,
                    },
                );
            }
        }

        report.contents = updater.run();
        for directory in &report.contents.updated {
            emit(
                &events,
                GenerateEvent::ContentsUpdated {
                    directory: directory.clone(),
                },
            );
        }
        for (directory, err) in &report.contents.failed {
            emit(
                &events,
                GenerateEvent::ContentsFailed {
                    directory: directory.clone(),
                    error: err.to_string(),
                },
            );
        }
        Ok(report)
    }
}

/// Resolve and run `options` against `config` with the [`RustBackend`].
pub fn generate(
    config: &Configuration,
    options: &GenerateOptions,
    events: Option<Sender<GenerateEvent>>,
) -> Result<GenerateReport, GenerateError> {
    let backend = RustBackend::new();
    Generator::new(config, options)?.run(&backend, events)
}

fn emit(events: &Option<Sender<GenerateEvent>>, event: GenerateEvent) {
    if let Some(tx) = events {
        tx.send(event).ok();
    }
}

fn register_contents(updater: &mut ContentsUpdater, task: &GenerationTask) {
    let Some(request) = task.contents else {
        return;
    };
    if let Some(directory) = task.image.target.parent() {
        updater.add_directory(directory);
    }
    if let ContentsRequest::Explicit(meta) = request {
        // Relative targets are rejected (and logged) by the updater
        updater.add_file_override(&task.image.target, meta).ok();
    }
}

fn rule_name(rule: &Rule) -> &str {
    if rule.name.is_empty() {
        rule.label()
    } else {
        &rule.name
    }
}

/// Sources of a rule with their substitution tokens.
fn sources(rule: &Rule) -> Vec<(&str, Option<String>)> {
    if rule.has_many_sources() {
        rule.source_files
            .iter()
            .map(|source| (source.as_str(), Some(source_token(source))))
            .collect()
    } else {
        vec![(rule.source_file.as_str(), None)]
    }
}

/// File name without its extension.
fn source_token(source: &str) -> String {
    Path::new(source)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn target_path(root: &Path, image: &ImageSpec, token: Option<&str>) -> PathBuf {
    let joined = root
        .join(image.target_path.trim_start_matches('/'))
        .join(image.file_name.trim_start_matches('/'));
    let mut target = joined.to_string_lossy().into_owned();

    if let Some(token) = token.filter(|t| !t.is_empty()) {
        target = target.replacen("{source}", token, 1);
    }
    for (search, replacement) in &image.replace_in_target_name {
        match replacement {
            Value::String(replacement) if !search.is_empty() => {
                target = target.replacen(search.as_str(), replacement, 1);
            }
            _ => {}
        }
    }
    PathBuf::from(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contents::{Idiom, Scale};
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{image, pixel_at, rule, write_image};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn config(dir: &Path, document: Value) -> Configuration {
        Configuration::from_json_str(dir, &document.to_string()).unwrap()
    }

    fn options(rule: &str, working_dir: &Path) -> GenerateOptions {
        GenerateOptions {
            rule: rule.to_string(),
            target: None,
            working_dir: working_dir.to_path_buf(),
        }
    }

    fn square(n: u32) -> Dimensions {
        Dimensions {
            width: n,
            height: n,
        }
    }

    fn icon_rule() -> Value {
        json!({
            "sourceFile": "icon.png",
            "images": [{ "fileName": "icon.png", "targetPath": "out", "size": "100x100" }]
        })
    }

    // =========================================================================
    // Selector
    // =========================================================================

    #[test]
    fn selector_all_any_case() {
        assert_eq!(Selector::parse("all"), Selector::All);
        assert_eq!(Selector::parse("ALL"), Selector::All);
    }

    #[test]
    fn selector_prefix() {
        assert_eq!(Selector::parse("ios:*"), Selector::Prefix("ios:".into()));
        assert_eq!(Selector::parse(" ios:* "), Selector::Prefix("ios:".into()));
        assert_eq!(
            Selector::parse("app_icons:*"),
            Selector::Prefix("app_icons:".into())
        );
    }

    #[test]
    fn selector_named() {
        assert_eq!(Selector::parse("ios:icon"), Selector::Named("ios:icon".into()));
        assert_eq!(Selector::parse(":*"), Selector::Named(":*".into()));
        assert_eq!(Selector::parse("my-app:*"), Selector::Named("my-app:*".into()));
    }

    // =========================================================================
    // Generator::new
    // =========================================================================

    #[test]
    fn empty_selector_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(tmp.path(), json!({ "rules": { "a": icon_rule() } }));
        let err = Generator::new(&cfg, &options("", tmp.path())).unwrap_err();
        assert_eq!(err.to_string(), "No configuration rule set, can not continue");
    }

    #[test]
    fn unknown_rule_is_invalid() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(tmp.path(), json!({ "rules": { "a": icon_rule() } }));
        let err = Generator::new(&cfg, &options("b", tmp.path())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid rule found for b, please check configuration"
        );
    }

    #[test]
    fn prefix_selects_matching_rules_in_order() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(
            tmp.path(),
            json!({ "rules": {
                "ios:a": icon_rule(),
                "android:c": icon_rule(),
                "ios:b": icon_rule(),
            }}),
        );
        let generator = Generator::new(&cfg, &options("ios:*", tmp.path())).unwrap();
        let names: Vec<_> = generator.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["ios:a", "ios:b"]);
    }

    #[test]
    fn rule_with_one_bad_image_is_dropped() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(
            tmp.path(),
            json!({ "rules": {
                "mixed": {
                    "sourceFile": "icon.png",
                    "images": [
                        { "fileName": "a.png", "targetPath": "", "size": "10x10" },
                        { "fileName": "b.png", "targetPath": "out", "size": "10x10" }
                    ]
                },
                "good": icon_rule(),
            }}),
        );

        let err = Generator::new(&cfg, &options("mixed", tmp.path())).unwrap_err();
        assert!(matches!(err, GenerateError::NoValidRules { .. }));

        let generator = Generator::new(&cfg, &options("all", tmp.path())).unwrap();
        assert_eq!(generator.rules().len(), 1);
        assert_eq!(generator.rules()[0].name, "good");
    }

    #[test]
    fn target_defaults_to_working_dir() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(tmp.path(), json!({ "rules": { "a": icon_rule() } }));
        let generator = Generator::new(&cfg, &options("a", Path::new("/work"))).unwrap();
        assert_eq!(generator.target(), Path::new("/work"));
    }

    #[test]
    fn relative_root_and_target_are_joined() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(
            tmp.path(),
            json!({ "options": { "rootPath": "build" }, "rules": { "a": icon_rule() } }),
        );
        let mut opts = options("a", Path::new("/work"));
        opts.target = Some("assets".into());
        let generator = Generator::new(&cfg, &opts).unwrap();
        assert_eq!(generator.target(), Path::new("/work/build/assets"));
    }

    #[test]
    fn absolute_target_passes_through() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(
            tmp.path(),
            json!({ "options": { "rootPath": "/srv/root" }, "rules": { "a": icon_rule() } }),
        );
        let mut opts = options("a", Path::new("/work"));
        opts.target = Some("/elsewhere".into());
        assert_eq!(
            Generator::new(&cfg, &opts).unwrap().target(),
            Path::new("/elsewhere")
        );

        opts.target = None;
        assert_eq!(
            Generator::new(&cfg, &opts).unwrap().target(),
            Path::new("/srv/root")
        );
    }

    // =========================================================================
    // plan
    // =========================================================================

    #[test]
    fn plan_single_source() {
        let cfg = config(Path::new("/cfg"), json!({ "rules": { "a": icon_rule() } }));
        let generator = Generator::new(&cfg, &options("a", Path::new("/work"))).unwrap();

        let tasks = generator.plan();
        assert_eq!(tasks.len(), 1);
        let task = &tasks[0].image;
        assert_eq!(task.original, Path::new("/cfg/icon.png"));
        assert_eq!(task.target, Path::new("/work/out/icon.png"));
        assert_eq!((task.width, task.height), (100, 100));
        assert!(!task.no_crop);
        assert_eq!(tasks[0].source_token, None);
        assert_eq!(tasks[0].contents, None);
    }

    #[test]
    fn plan_two_sources_two_tasks() {
        let cfg = config(
            Path::new("/cfg"),
            json!({ "rules": { "splash": {
                "sourceFiles": ["art/a.png", "b.jpg"],
                "images": [{ "fileName": "{source}.png", "targetPath": "out", "size": "20x10" }]
            }}}),
        );
        let generator = Generator::new(&cfg, &options("splash", Path::new("/w"))).unwrap();

        let tasks = generator.plan();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].source_token.as_deref(), Some("a"));
        assert_eq!(tasks[1].source_token.as_deref(), Some("b"));
        assert_eq!(tasks[0].image.original, Path::new("/cfg/art/a.png"));
        assert_eq!(tasks[0].image.target, Path::new("/w/out/a.png"));
        assert_eq!(tasks[1].image.target, Path::new("/w/out/b.png"));
    }

    #[test]
    fn source_files_win_over_source_file() {
        let cfg = config(
            Path::new("/cfg"),
            json!({ "rules": { "splash": {
                "sourceFile": "single.png",
                "sourceFiles": ["many.png"],
                "images": [{ "fileName": "{source}.png", "targetPath": "out", "size": "20x10" }]
            }}}),
        );
        let generator = Generator::new(&cfg, &options("splash", Path::new("/w"))).unwrap();

        let tasks = generator.plan();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].image.original, Path::new("/cfg/many.png"));
        assert_eq!(tasks[0].image.target, Path::new("/w/out/many.png"));
    }

    #[test]
    fn plan_order_rule_then_source_then_image() {
        let mut two_images = rule(
            "",
            vec![image("1.png", "x", "1x1"), image("2.png", "x", "1x1")],
        );
        two_images.source_files = vec!["p.png".into(), "q.png".into()];
        let cfg = config(
            Path::new("/c"),
            json!({ "rules": {
                "first": serde_json::to_value(&two_images).unwrap(),
                "second": icon_rule(),
            }}),
        );
        let generator = Generator::new(&cfg, &options("all", Path::new("/w"))).unwrap();

        let order: Vec<_> = generator
            .plan()
            .iter()
            .map(|t| {
                format!(
                    "{}:{}",
                    t.image.original.file_name().unwrap().to_string_lossy(),
                    t.image.target.file_name().unwrap().to_string_lossy()
                )
            })
            .collect();
        assert_eq!(
            order,
            ["p.png:1.png", "p.png:2.png", "q.png:1.png", "q.png:2.png", "icon.png:icon.png"]
        );
    }

    #[test]
    fn plan_applies_replacements_once_in_order() {
        let mut spec = image("icon-NAME-NAME.png", "/res/NAME", "8x8");
        spec.replace_in_target_name = serde_json::from_value(json!({
            "NAME": "app",
            "app": "APP",
            "icon": 3
        }))
        .unwrap();
        let cfg = config(
            Path::new("/c"),
            json!({ "rules": { "r": serde_json::to_value(rule("s.png", vec![spec])).unwrap() } }),
        );
        let generator = Generator::new(&cfg, &options("r", Path::new("/w"))).unwrap();

        // First NAME → app, then the first app (same spot) → APP
        assert_eq!(
            generator.plan()[0].image.target,
            Path::new("/w/res/APP/icon-NAME-NAME.png")
        );
    }

    #[test]
    fn plan_contents_request_precedence() {
        let mut explicit = image("a.png", "out", "10x10");
        explicit.create_contents_json = Some(ContentsConfig::new(Idiom::Iphone, Scale::X3));
        let inherited = image("b.png", "out", "10x10");

        let mut with_rule_config = rule("s.png", vec![explicit, inherited]);
        with_rule_config.create_contents_json = Some(ContentsConfig::new(Idiom::Ipad, Scale::X1));
        let plain = rule("s.png", vec![image("c.png", "out", "10x10")]);

        let cfg = config(
            Path::new("/c"),
            json!({
                "options": { "createContentsJson": true },
                "rules": {
                    "a": serde_json::to_value(&with_rule_config).unwrap(),
                    "b": serde_json::to_value(&plain).unwrap(),
                }
            }),
        );
        let tasks = Generator::new(&cfg, &options("all", Path::new("/w")))
            .unwrap()
            .plan();

        let meta = |idiom, scale| Some(ContentsRequest::Explicit(EntryMeta { idiom, scale }));
        assert_eq!(tasks[0].contents, meta(Idiom::Iphone, Scale::X3));
        assert_eq!(tasks[1].contents, meta(Idiom::Ipad, Scale::X1));
        assert_eq!(tasks[2].contents, Some(ContentsRequest::Default));
    }

    // =========================================================================
    // run
    // =========================================================================

    #[test]
    fn run_single_task_center_crops() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("icon.png"), b"png").unwrap();
        let cfg = config(tmp.path(), json!({ "rules": { "a": icon_rule() } }));
        let generator = Generator::new(&cfg, &options("a", tmp.path())).unwrap();
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 300,
            height: 200,
        }]);

        let report = generator.run(&backend, None).unwrap();
        assert_eq!(report.generated, [tmp.path().join("out/icon.png")]);
        assert!(report.contents.updated.is_empty());

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[1],
            RecordedOp::Resize { crop: Some(c), width: 100, height: 100, .. }
                if (c.x, c.y, c.width, c.height) == (50, 0, 200, 200)
        ));
    }

    #[test]
    fn run_stops_at_first_failure() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("icon.png"), b"png").unwrap();
        let cfg = config(
            tmp.path(),
            json!({ "rules": {
                "missing": {
                    "sourceFile": "nope.png",
                    "images": [{ "fileName": "x.png", "targetPath": "out", "size": "10x10" }]
                },
                "fine": icon_rule(),
            }}),
        );
        let generator = Generator::new(&cfg, &options("all", tmp.path())).unwrap();
        let backend = MockBackend::with_dimensions(vec![square(10)]);

        let err = generator.run(&backend, None).unwrap_err();
        assert!(matches!(err, GenerateError::Image(ImageError::NotFound(_))));
        assert!(err.to_string().starts_with("No such file: "));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn run_reports_events_in_order() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("icon.png"), b"png").unwrap();
        let cfg = config(
            tmp.path(),
            json!({ "rules": { "a": {
                "sourceFile": "icon.png",
                "images": [
                    { "fileName": "1.png", "targetPath": "out", "size": "10x10" },
                    { "fileName": "2.png", "targetPath": "out", "size": "20x20",
                      "fillColor": "#00FF00" }
                ]
            }}}),
        );
        let generator = Generator::new(&cfg, &options("a", tmp.path())).unwrap();
        let backend = MockBackend::with_dimensions(vec![square(64), square(64)]);

        let (tx, rx) = std::sync::mpsc::channel();
        generator.run(&backend, Some(tx)).unwrap();
        let events: Vec<_> = rx.iter().collect();

        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            GenerateEvent::RuleStarted { name, task_count: 2 } if name == "a"
        ));
        assert!(matches!(
            &events[1],
            GenerateEvent::ImageGenerated { index: 1, retouched, .. } if retouched.is_empty()
        ));
        assert!(matches!(
            &events[2],
            GenerateEvent::ImageGenerated { index: 2, retouched, .. } if retouched == &["fill"]
        ));
    }

    #[test]
    fn run_registers_contents_directories() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("icon.png"), b"png").unwrap();
        let cfg = config(
            tmp.path(),
            json!({
                "options": { "createContentsJson": true },
                "rules": { "a": icon_rule() }
            }),
        );
        let generator = Generator::new(&cfg, &options("a", tmp.path())).unwrap();
        let backend = MockBackend::with_dimensions(vec![square(100)]);

        let report = generator.run(&backend, None).unwrap();
        assert_eq!(report.contents.updated, [tmp.path().join("out")]);
        assert!(tmp.path().join("out/Contents.json").is_file());
    }

    #[test]
    fn run_leaves_configuration_untouched() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("icon.png"), b"png").unwrap();
        let cfg = config(tmp.path(), json!({ "rules": { "a": icon_rule() } }));
        let before = cfg.config_for_all_rules();

        let generator = Generator::new(&cfg, &options("a", tmp.path())).unwrap();
        generator
            .run(&MockBackend::with_dimensions(vec![square(8)]), None)
            .unwrap();

        assert_eq!(cfg.config_for_all_rules(), before);
        assert_eq!(generator.plan().len(), 1);
    }

    // =========================================================================
    // run with the real backend
    // =========================================================================

    #[test]
    fn fill_color_rewrites_target() {
        let tmp = TempDir::new().unwrap();
        write_image(&tmp.path().join("icon.png"), 40, 20, [0, 0, 255, 255]);
        let cfg = config(
            tmp.path(),
            json!({ "rules": { "a": {
                "sourceFile": "icon.png",
                "images": [{ "fileName": "red.png", "targetPath": "out", "size": "10x10",
                             "fillColor": "#FF0000" }]
            }}}),
        );
        let generator = Generator::new(&cfg, &options("a", tmp.path())).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        generator.run(&RustBackend::new(), Some(tx)).unwrap();

        let target = tmp.path().join("out/red.png");
        assert_eq!(image::image_dimensions(&target).unwrap(), (10, 10));
        assert_eq!(pixel_at(&target, 5, 5)[..3], [255, 0, 0]);
        assert!(rx.iter().any(|event| matches!(
            event,
            GenerateEvent::ImageGenerated { retouched, .. } if retouched == ["fill"]
        )));
    }

    #[test]
    fn missing_compose_image_is_skipped() {
        let tmp = TempDir::new().unwrap();
        write_image(&tmp.path().join("icon.png"), 16, 16, [0, 255, 0, 255]);
        let cfg = config(
            tmp.path(),
            json!({ "rules": { "a": {
                "sourceFile": "icon.png",
                "images": [{ "fileName": "icon.png", "targetPath": "out", "size": "8x8",
                             "compose": { "composeImage": "badge.png" } }]
            }}}),
        );
        let generator = Generator::new(&cfg, &options("a", tmp.path())).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let report = generator.run(&RustBackend::new(), Some(tx)).unwrap();

        assert_eq!(report.generated.len(), 1);
        assert_eq!(pixel_at(&report.generated[0], 4, 4)[..3], [0, 255, 0]);
        assert!(rx.iter().any(|event| matches!(
            event,
            GenerateEvent::ImageGenerated { retouched, .. } if retouched.is_empty()
        )));
    }
}
