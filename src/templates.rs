//! Prompt resolution: base template + per-exam instruction and requirement blocks.

use crate::domain::ResolvedPrompt;
use crate::error::ApiError;
use crate::util::{fill_template, placeholders};
use crate::validator::ValidatedRequest;

const BASE_TEMPLATE: &str = "Generate a {exam_type} reading passage about {topic} of approximately {word_count} words, \
targeted at a difficulty level of {difficulty_score}.

Structure the text into {paragraph_count} clear paragraphs with content appropriate for {exam_type} test format.";

const USER_TEMPLATE: &str = "Please write the {exam_type} reading passage about \"{topic}\".";

const OUTPUT_RULE: &str = "Output only the article text, without a title or any extra commentary.";

/// Static text attached to one exam type.
#[derive(Debug)]
pub struct ExamTemplate {
  pub instructions: &'static str,
  pub requirements: &'static str,
}

const TOEIC: ExamTemplate = ExamTemplate {
  instructions: "Use vocabulary and grammar patterns typical of TOEIC Part VII. Focus on realistic workplace and \
daily life scenarios. Avoid overly specialized technical terms and ensure the content is appropriate for business \
English learners.",
  requirements: "- Clear topic sentences for each paragraph
- Practical business vocabulary appropriate for the topic
- Realistic scenarios related to the topic
- Appropriate sentence complexity for the target TOEIC level
- Professional tone suitable for workplace contexts",
};

const GRE: ExamTemplate = ExamTemplate {
  instructions: "Use sophisticated vocabulary and complex sentence structures typical of GRE reading comprehension. \
Present academic arguments with logical reasoning and evidence-based conclusions.",
  requirements: "- Academic vocabulary and terminology relevant to the topic
- Complex sentence structures with varied syntax
- Logical argument development with supporting evidence
- Analytical depth appropriate for graduate-level study
- Formal academic tone and style",
};

const IELTS: ExamTemplate = ExamTemplate {
  instructions: "Use clear, well-structured prose appropriate for IELTS Academic Reading. Balance accessibility with \
intellectual rigor, covering the topic in a comprehensive yet approachable manner.",
  requirements: "- Clear main ideas with supporting details
- Varied vocabulary relevant to the topic
- Logical paragraph structure with smooth transitions
- Balanced presentation of different perspectives
- International English style avoiding regional idioms",
};

const SAT: ExamTemplate = ExamTemplate {
  instructions: "Create content suitable for SAT Reading passages, focusing on analytical reasoning and \
evidence-based thinking expected of college-bound students.",
  requirements: "- College-level vocabulary in context
- Clear argumentative or informational structure
- Evidence-based reasoning and examples
- Appropriate complexity for high school students
- Formal but accessible academic tone",
};

/// Instruction/requirement blocks for an exam code, if one exists.
pub fn exam_template(code: &str) -> Option<&'static ExamTemplate> {
  match code {
    "TOEIC" => Some(&TOEIC),
    "GRE" => Some(&GRE),
    "IELTS" => Some(&IELTS),
    "SAT" => Some(&SAT),
    _ => None,
  }
}

pub fn resolve(req: &ValidatedRequest) -> Result<ResolvedPrompt, ApiError> {
  let exam_type = req.exam_type();
  let template = exam_template(exam_type).ok_or_else(|| ApiError::TemplateError {
    exam_type: exam_type.to_string(),
    message: "no instruction template registered for this exam type".into(),
  })?;

  let word_count = req.word_count().to_string();
  let paragraph_count = req.paragraph_count().to_string();
  let pairs: [(&str, &str); 5] = [
    ("exam_type", exam_type),
    ("topic", req.topic()),
    ("word_count", &word_count),
    ("paragraph_count", &paragraph_count),
    ("difficulty_score", req.difficulty_score()),
  ];
  let base = fill_checked(BASE_TEMPLATE, &pairs, exam_type)?;

  let mut text = format!(
    "{base}\n\n{}\n\nThe article should include:\n{}",
    template.instructions, template.requirements
  );
  if let Some(style) = req.style() {
    text.push_str(&format!("\n- Writing style: {style}"));
  }

  let mut user = fill_checked(USER_TEMPLATE, &pairs, exam_type)?;
  if !req.focus_points().is_empty() {
    user.push_str(&format!("\n\nPay particular attention to: {}", req.focus_points().join(", ")));
  }
  user.push_str("\n\n");
  user.push_str(OUTPUT_RULE);

  Ok(ResolvedPrompt {
    text,
    user,
    instructions: template.instructions,
    requirements: template.requirements,
  })
}

/// Substitute `pairs` into `tpl`, failing if the template names a placeholder with no value.
fn fill_checked(tpl: &str, pairs: &[(&str, &str)], exam_type: &str) -> Result<String, ApiError> {
  if let Some(missing) = placeholders(tpl).into_iter().find(|p| !pairs.iter().any(|(k, _)| k == p)) {
    return Err(ApiError::TemplateError {
      exam_type: exam_type.to_string(),
      message: format!("placeholder '{{{missing}}}' has no value"),
    });
  }
  Ok(fill_template(tpl, pairs))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ExamCatalog;
  use crate::domain::GenerationRequest;
  use crate::validator::validate;

  fn validated(req: GenerationRequest) -> ValidatedRequest {
    validate(&ExamCatalog::builtin().unwrap(), req).unwrap()
  }

  fn toeic_office() -> ValidatedRequest {
    validated(GenerationRequest {
      exam_type: "TOEIC".into(),
      topic: "Office Work".into(),
      difficulty_score: "Beginner".into(),
      ..Default::default()
    })
  }

  #[test]
  fn toeic_prompt_carries_topic_defaults_and_instructions() {
    let p = resolve(&toeic_office()).unwrap();
    assert!(p.text.contains("Office Work"));
    assert!(p.text.contains("approximately 150 words"));
    assert!(p.text.contains("into 3 clear paragraphs"));
    assert!(p.text.contains("difficulty level of Beginner"));
    assert!(p.text.contains("TOEIC Part VII"));
    assert_eq!(p.instructions, TOEIC.instructions);
    assert!(p.text.ends_with(TOEIC.requirements));
    assert!(placeholders(&p.text).is_empty());
    assert!(p.user.contains("\"Office Work\""));
    assert!(p.user.ends_with(OUTPUT_RULE));
  }

  #[test]
  fn gre_prompt_uses_gre_block() {
    let p = resolve(&validated(GenerationRequest {
      exam_type: "GRE".into(),
      topic: "Philosophy".into(),
      difficulty_score: "160".into(),
      word_count: Some(300),
      paragraph_count: Some(4),
      ..Default::default()
    }))
    .unwrap();
    assert_eq!(p.instructions, GRE.instructions);
    assert_eq!(p.requirements, GRE.requirements);
    assert!(!p.text.contains(TOEIC.instructions));
    assert!(p.text.contains("approximately 300 words"));
    assert!(p.text.contains("into 4 clear paragraphs"));
    assert!(p.text.contains("difficulty level of 160"));
  }

  #[test]
  fn resolution_is_deterministic() {
    let req = toeic_office();
    assert_eq!(resolve(&req).unwrap().text, resolve(&req).unwrap().text);
  }

  #[test]
  fn style_and_focus_points_are_appended() {
    let p = resolve(&validated(GenerationRequest {
      exam_type: "IELTS".into(),
      topic: "Health".into(),
      difficulty_score: "6.5".into(),
      style: Some("Discursive".into()),
      focus_points: vec!["diet".into(), "sleep".into()],
      ..Default::default()
    }))
    .unwrap();
    assert!(p.text.ends_with("\n- Writing style: Discursive"));
    assert!(p.user.contains("Pay particular attention to: diet, sleep"));
  }

  #[test]
  fn every_builtin_exam_has_a_template() {
    for code in ExamCatalog::builtin().unwrap().codes() {
      assert!(exam_template(&code).is_some(), "{code}");
    }
  }

  #[test]
  fn exam_without_template_is_a_template_error() {
    let cat = ExamCatalog::from_toml_str(
      r#"
[[exams]]
code = "TOEFL"
full_name = "Test of English as a Foreign Language"
topics = ["Campus Life"]
difficulties = ["Low"]
[exams.default_word_count]
Low = 200
[exams.validation_rules]
word_count_min = 100
word_count_max = 400
[exams.score_range]
min = 0
max = 120
step = 1
"#,
      "test",
    )
    .unwrap();
    let req = validate(&cat, GenerationRequest {
      exam_type: "TOEFL".into(),
      topic: "Campus Life".into(),
      difficulty_score: "Low".into(),
      ..Default::default()
    })
    .unwrap();
    assert_eq!(resolve(&req).unwrap_err().code(), "TEMPLATE_ERROR");
  }

  #[test]
  fn unfilled_placeholder_is_reported() {
    let err = fill_checked("Hello {name} from {place}", &[("name", "x")], "TOEIC").unwrap_err();
    assert!(err.to_string().contains("{place}"), "{err}");
  }
}
