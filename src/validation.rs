//! Schema checks for rules and image specs.
//!
//! Validation never fails a run by itself. Every check produces a list of
//! [`Violation`]s; the boolean helpers log each one as a warning and answer
//! whether the list was empty. The generator drops rules that do not pass.
//!
//! ## Order of checks
//!
//! For an image: base fields (`targetPath`, `size`, `fileName`), then the
//! `compose` table, then `createContentsJson`. The first stage with a
//! violation ends the check.
//!
//! For a rule: a source (`sourceFile` or a non-empty `sourceFiles`), a
//! non-empty `images` list, every image, then the rule's own
//! `createContentsJson`. A single bad image invalidates the whole rule.

use crate::config::{ComposeOptions, ContentsConfig, ImageSpec, Rule};
use std::fmt;

/// One field-level schema problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The rule or image the problem was found in.
    pub subject: String,
    /// Field path, e.g. `compose.size`.
    pub field: &'static str,
    pub problem: Problem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    Missing,
    /// Value present but not of the expected form.
    Malformed(String),
    /// Value outside its enumeration.
    NotOneOf(&'static [&'static str]),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            Problem::Missing => write!(f, "{}: `{}` is missing", self.subject, self.field),
            Problem::Malformed(value) => write!(
                f,
                "{}: `{}` has invalid value {value:?}",
                self.subject, self.field
            ),
            Problem::NotOneOf(allowed) => write!(
                f,
                "{}: `{}` must be one of {}",
                self.subject,
                self.field,
                allowed.join(", ")
            ),
        }
    }
}

const IDIOMS: &[&str] = &["iphone", "ipad", "universal"];
const SCALES: &[&str] = &["1x", "2x", "3x"];

/// Parse a `WxH` size string (`^\d+x\d+$`) with non-zero dimensions.
pub fn parse_size(size: &str) -> Option<(u32, u32)> {
    let (w, h) = size.split_once('x')?;
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(w) || !digits(h) {
        return None;
    }
    let (w, h) = (w.parse().ok()?, h.parse().ok()?);
    (w > 0 && h > 0).then_some((w, h))
}

fn violation(subject: &str, field: &'static str, problem: Problem) -> Violation {
    Violation {
        subject: subject.to_string(),
        field,
        problem,
    }
}

/// Image label used in diagnostics.
fn image_subject(image: &ImageSpec) -> String {
    if image.target_path.is_empty() {
        "image (name missing)".to_string()
    } else {
        format!("image {:?}", image.target_path)
    }
}

/// Check a `createContentsJson` table.
pub fn validate_contents_config(subject: &str, config: &ContentsConfig) -> Vec<Violation> {
    let mut violations = Vec::new();
    if !IDIOMS.contains(&config.idiom.as_str()) {
        violations.push(violation(
            subject,
            "createContentsJson.idiom",
            Problem::NotOneOf(IDIOMS),
        ));
    }
    if !SCALES.contains(&config.scale.as_str()) {
        violations.push(violation(
            subject,
            "createContentsJson.scale",
            Problem::NotOneOf(SCALES),
        ));
    }
    violations
}

fn validate_compose(subject: &str, compose: &ComposeOptions) -> Vec<Violation> {
    let mut violations = Vec::new();
    if compose.compose_image.is_empty() {
        violations.push(violation(subject, "compose.composeImage", Problem::Missing));
    }
    match compose.size.as_deref() {
        Some(size) if !size.is_empty() && parse_size(size).is_none() => {
            violations.push(violation(
                subject,
                "compose.size",
                Problem::Malformed(size.to_string()),
            ));
        }
        _ => {}
    }
    violations
}

/// Check one image spec. Stops at the first stage that has violations.
pub fn validate_image(image: &ImageSpec) -> Vec<Violation> {
    let subject = image_subject(image);
    let mut violations = Vec::new();

    if image.target_path.is_empty() {
        violations.push(violation(&subject, "targetPath", Problem::Missing));
    }
    if image.size.is_empty() {
        violations.push(violation(&subject, "size", Problem::Missing));
    } else if parse_size(&image.size).is_none() {
        violations.push(violation(
            &subject,
            "size",
            Problem::Malformed(image.size.clone()),
        ));
    }
    if image.file_name.is_empty() {
        violations.push(violation(&subject, "fileName", Problem::Missing));
    }
    if !violations.is_empty() {
        return violations;
    }

    if let Some(compose) = &image.compose {
        violations = validate_compose(&subject, compose);
        if !violations.is_empty() {
            return violations;
        }
    }

    if let Some(contents) = &image.create_contents_json {
        violations = validate_contents_config(&subject, contents);
    }
    violations
}

/// Check a list of images, stopping at the first invalid one.
pub fn validate_images(images: &[ImageSpec]) -> Vec<Violation> {
    images
        .iter()
        .map(validate_image)
        .find(|v| !v.is_empty())
        .unwrap_or_default()
}

/// Check a rule and all of its images.
pub fn validate_rule(rule: &Rule) -> Vec<Violation> {
    let subject = format!("rule {:?}", rule.label());
    let mut violations = Vec::new();

    if rule.source_file.is_empty() && rule.source_files.is_empty() {
        violations.push(violation(&subject, "sourceFile", Problem::Missing));
    }
    if rule.images.is_empty() {
        violations.push(violation(&subject, "images", Problem::Missing));
    }
    if !violations.is_empty() {
        return violations;
    }

    violations = validate_images(&rule.images);
    if !violations.is_empty() {
        return violations;
    }

    if let Some(contents) = &rule.create_contents_json {
        violations = validate_contents_config(&subject, contents);
    }
    violations
}

fn report(violations: &[Violation]) -> bool {
    for v in violations {
        tracing::warn!("{v}");
    }
    violations.is_empty()
}

/// `true` when the rule passes [`validate_rule`]; violations are logged.
pub fn rule_is_valid(rule: &Rule) -> bool {
    report(&validate_rule(rule))
}

/// `true` when every image passes [`validate_image`]; violations are logged.
pub fn images_are_valid(images: &[ImageSpec]) -> bool {
    report(&validate_images(images))
}

/// `true` when the image passes [`validate_image`]; violations are logged.
pub fn image_is_valid(image: &ImageSpec) -> bool {
    report(&validate_image(image))
}

/// `true` when idiom and scale are both known values; violations are logged.
pub fn contents_config_is_valid(config: &ContentsConfig) -> bool {
    report(&validate_contents_config("createContentsJson", config))
}
