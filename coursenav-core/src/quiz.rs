//! Quiz extraction from `{{< quizdown >}}` shortcode regions.
//!
//! Inside a region every `### ` heading opens a question. Task-list items
//! are the answer options (`- [x]` marks the correct one) and a blockquote
//! after the options carries the explanation:
//!
//! ```markdown
//! {{< quizdown >}}
//! ### Which keyword defines a function?
//! - [x] defn
//! - [ ] def
//! > **Explanation:** `defn` is `def` plus `fn`.
//! {{< /quizdown >}}
//! ```
//!
//! Extraction is lazy and never aborts a document: a question without
//! exactly one correct option comes out as a [`MalformedQuizError`] and the
//! iterator moves on to the next question.

use coursenav_types::{QuizOption, QuizQuestion};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Why a question was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizDefect {
    #[error("no options")]
    NoOptions,

    #[error("no correct option")]
    NoCorrectOption,

    #[error("{0} correct options")]
    MultipleCorrectOptions(usize),
}

/// A question skipped during extraction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("question {question_index} ({prompt:?}): {reason}")]
pub struct MalformedQuizError {
    /// 1-based position among all questions of the body
    pub question_index: usize,
    pub prompt: String,
    pub reason: QuizDefect,
}

static OPEN_REGEX: OnceLock<Regex> = OnceLock::new();
static CLOSE_REGEX: OnceLock<Regex> = OnceLock::new();
static EXPLANATION_LABEL_REGEX: OnceLock<Regex> = OnceLock::new();

fn open_regex() -> &'static Regex {
    OPEN_REGEX.get_or_init(|| Regex::new(r"\{\{<\s*quizdown\s*>\}\}").unwrap())
}

fn close_regex() -> &'static Regex {
    CLOSE_REGEX.get_or_init(|| Regex::new(r"\{\{<\s*/\s*quizdown\s*>\}\}").unwrap())
}

fn explanation_label_regex() -> &'static Regex {
    EXPLANATION_LABEL_REGEX.get_or_init(|| Regex::new(r"(?i)^\s*explanation\s*:\s*").unwrap())
}

/// Lazily extract the questions of a document body
///
/// # Example
///
/// ```
/// use coursenav_core::extract_quizzes;
///
/// let body = "{{< quizdown >}}\n### Pick one\n- [x] yes\n- [ ] no\n{{< /quizdown >}}\n";
///
/// let questions: Vec<_> = extract_quizzes(body).collect();
/// assert_eq!(questions.len(), 1);
/// let question = questions[0].as_ref().unwrap();
/// assert_eq!(question.prompt, "Pick one");
/// assert_eq!(question.correct_option().unwrap().text, "yes");
/// ```
pub fn extract_quizzes(body: &str) -> Quizzes<'_> {
    Quizzes {
        rest: body,
        region: None,
        emitted: 0,
    }
}

/// Eagerly split a body's questions into valid ones and errors
pub fn collect_quizzes(body: &str) -> (Vec<QuizQuestion>, Vec<MalformedQuizError>) {
    let mut questions = Vec::new();
    let mut errors = Vec::new();
    for item in extract_quizzes(body) {
        match item {
            Ok(question) => questions.push(question),
            Err(err) => errors.push(err),
        }
    }
    (questions, errors)
}

/// Iterator over the questions of a body, see [`extract_quizzes`]
pub struct Quizzes<'a> {
    /// Text not yet searched for regions
    rest: &'a str,
    region: Option<RegionQuestions<'a>>,
    emitted: usize,
}

impl<'a> Iterator for Quizzes<'a> {
    type Item = Result<QuizQuestion, MalformedQuizError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(region) = self.region.as_mut() {
                if let Some(draft) = region.next_draft() {
                    self.emitted += 1;
                    return Some(draft.finish(self.emitted));
                }
                self.region = None;
            }

            let (content, rest) = next_region(self.rest)?;
            self.rest = rest;
            self.region = Some(RegionQuestions::new(content));
        }
    }
}

/// Find the next quizdown region: (region content, text after it)
fn next_region(text: &str) -> Option<(&str, &str)> {
    let open = open_regex().find(text)?;
    let after_open = &text[open.end()..];
    match close_regex().find(after_open) {
        Some(close) => Some((&after_open[..close.start()], &after_open[close.end()..])),
        None => Some((after_open, "")),
    }
}

/// Questions of a single region, parsed on demand
struct RegionQuestions<'a> {
    events: Parser<'a>,
    current: Option<DraftQuestion>,
}

impl<'a> RegionQuestions<'a> {
    fn new(content: &'a str) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TASKLISTS);
        Self {
            events: Parser::new_ext(content, options),
            current: None,
        }
    }

    /// Advance until a question is complete
    fn next_draft(&mut self) -> Option<DraftQuestion> {
        while let Some(event) = self.events.next() {
            match event {
                Event::Start(Tag::Heading {
                    level: HeadingLevel::H3,
                    ..
                }) => {
                    let prompt = self.heading_text();
                    if let Some(done) = self.current.replace(DraftQuestion::new(prompt)) {
                        return Some(done);
                    }
                }
                other => {
                    if let Some(current) = self.current.as_mut() {
                        current.handle(other);
                    }
                }
            }
        }
        self.current.take()
    }

    fn heading_text(&mut self) -> String {
        let mut text = String::new();
        for event in self.events.by_ref() {
            match event {
                Event::End(TagEnd::Heading(_)) => break,
                other => push_inline(&mut text, &other),
            }
        }
        text.trim().to_string()
    }
}

/// Append the visible text of an inline event
fn push_inline(buf: &mut String, event: &Event<'_>) {
    match event {
        Event::Text(text) => buf.push_str(text),
        Event::Code(code) => {
            buf.push('`');
            buf.push_str(code);
            buf.push('`');
        }
        Event::SoftBreak => buf.push(' '),
        Event::HardBreak => buf.push('\n'),
        _ => {}
    }
}

#[derive(Debug, Default)]
struct ItemDraft {
    checked: Option<bool>,
    text: String,
}

/// A question being assembled from markdown events
#[derive(Debug, Default)]
struct DraftQuestion {
    prompt: String,
    context: String,
    options: Vec<QuizOption>,
    explanation: Option<String>,
    list_depth: usize,
    seen_list: bool,
    item: Option<ItemDraft>,
    quote_depth: usize,
    quote_text: String,
    in_code_block: bool,
}

impl DraftQuestion {
    fn new(prompt: String) -> Self {
        Self {
            prompt,
            ..Default::default()
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::List { .. }) => {
                self.list_depth += 1;
                self.seen_list = true;
            }
            Event::End(TagEnd::List { .. }) => {
                self.list_depth = self.list_depth.saturating_sub(1);
            }
            Event::Start(Tag::Item) if self.list_depth == 1 => {
                self.item = Some(ItemDraft::default());
            }
            Event::End(TagEnd::Item) if self.list_depth == 1 => {
                if let Some(ItemDraft {
                    checked: Some(is_correct),
                    text,
                }) = self.item.take()
                {
                    self.options.push(QuizOption {
                        text: text.trim().to_string(),
                        is_correct,
                    });
                }
            }
            Event::TaskListMarker(checked) if self.list_depth == 1 => {
                if let Some(item) = self.item.as_mut() {
                    if item.checked.is_none() && item.text.trim().is_empty() {
                        item.checked = Some(checked);
                    }
                }
            }
            Event::Start(Tag::BlockQuote { .. }) => {
                self.quote_depth += 1;
            }
            Event::End(TagEnd::BlockQuote { .. }) => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                if self.quote_depth == 0 {
                    self.close_quote();
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                self.in_code_block = true;
                if self.collecting_context() {
                    let lang = match kind {
                        CodeBlockKind::Fenced(lang) => lang.to_string(),
                        CodeBlockKind::Indented => String::new(),
                    };
                    self.context.push_str("```");
                    self.context.push_str(&lang);
                    self.context.push('\n');
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                self.in_code_block = false;
                if self.collecting_context() {
                    self.context.push_str("```\n\n");
                }
            }
            Event::End(TagEnd::Paragraph) => {
                if let Some(item) = self.item.as_mut() {
                    item.text.push(' ');
                } else if self.quote_depth > 0 {
                    self.quote_text.push('\n');
                } else if self.collecting_context() {
                    self.context.push_str("\n\n");
                }
            }
            other => self.push_text(&other),
        }
    }

    fn collecting_context(&self) -> bool {
        !self.seen_list && self.quote_depth == 0
    }

    fn push_text(&mut self, event: &Event<'_>) {
        if let Some(item) = self.item.as_mut() {
            push_inline(&mut item.text, event);
        } else if self.quote_depth > 0 {
            push_inline(&mut self.quote_text, event);
        } else if self.collecting_context() {
            if self.in_code_block {
                if let Event::Text(code) = event {
                    self.context.push_str(code);
                }
            } else {
                push_inline(&mut self.context, event);
            }
        }
    }

    fn close_quote(&mut self) {
        let text = std::mem::take(&mut self.quote_text);
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        if self.seen_list && self.explanation.is_none() {
            let stripped = explanation_label_regex().replace(text, "");
            self.explanation = Some(stripped.trim().to_string());
        } else if !self.seen_list {
            self.context.push_str("> ");
            self.context.push_str(text);
            self.context.push_str("\n\n");
        }
    }

    fn finish(self, question_index: usize) -> Result<QuizQuestion, MalformedQuizError> {
        let correct = self.options.iter().filter(|o| o.is_correct).count();
        let defect = if self.options.is_empty() {
            Some(QuizDefect::NoOptions)
        } else if correct == 0 {
            Some(QuizDefect::NoCorrectOption)
        } else if correct > 1 {
            Some(QuizDefect::MultipleCorrectOptions(correct))
        } else {
            None
        };

        if let Some(reason) = defect {
            return Err(MalformedQuizError {
                question_index,
                prompt: self.prompt,
                reason,
            });
        }

        let context = self.context.trim();
        Ok(QuizQuestion {
            prompt: self.prompt,
            context: (!context.is_empty()).then(|| context.to_string()),
            options: self.options,
            explanation: self.explanation.filter(|e| !e.is_empty()),
        })
    }
}
