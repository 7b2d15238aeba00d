//! Prompt templates (Jinja syntax, rendered with minijinja).

use minijinja::{Environment, context};

use scribe_core::assistant::SourceContext;
use scribe_core::error::{Result, ScribeError};

const DIARIZATION_TEMPLATE: &str = r#"You are given the raw transcript of a two-person conversation captured by speech recognition.
Language: {{ language }}

Split it into consecutive segments and attribute each segment to its speaker.
The person who recorded the conversation is "user"; the other party is "interlocutor".
Keep the original wording and order. Do not summarize, translate or drop text.

Transcript:
{{ text }}

Output a JSON object of this shape:
{"segments": [{"speaker": "user" | "interlocutor", "text": "..."}]}

IMPORTANT: Output ONLY valid JSON, no markdown formatting or code blocks."#;

const ANSWER_TEMPLATE: &str = r#"Answer the question using only the numbered sources below.
Cite the sources you rely on with markers like [1] in the answer text.

{% for source in sources -%}
[{{ loop.index }}] {{ source.name }}
{{ source.content }}

{% endfor -%}
Question: {{ question }}

Output a JSON object of this shape:
{"answer": "...", "citations": [{"index": 1, "source": 1, "fragment": "quoted text from the source"}]}
"index" is the marker used in the answer, "source" is the number of the source quoted.

IMPORTANT: Output ONLY valid JSON, no markdown formatting or code blocks."#;

const SUMMARY_TEMPLATE: &str = r#"Write a concise summary of the material below as a short note.
Use plain text with bullet points for key decisions and action items.

{% for source in sources -%}
## {{ source.name }}
{{ source.content }}

{% endfor -%}"#;

/// Renders the prompts used by the Gemini collaborators.
pub struct PromptRenderer {
    env: Environment<'static>,
}

impl PromptRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("diarization", DIARIZATION_TEMPLATE)
            .map_err(template_error)?;
        env.add_template("answer", ANSWER_TEMPLATE)
            .map_err(template_error)?;
        env.add_template("summary", SUMMARY_TEMPLATE)
            .map_err(template_error)?;
        Ok(Self { env })
    }

    pub fn diarization(&self, text: &str, language: &str) -> Result<String> {
        self.render("diarization", context! { text => text, language => language })
    }

    pub fn answer(&self, question: &str, sources: &[SourceContext]) -> Result<String> {
        self.render("answer", context! { question => question, sources => sources })
    }

    pub fn summary(&self, sources: &[SourceContext]) -> Result<String> {
        self.render("summary", context! { sources => sources })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(template_error)
    }
}

fn template_error(err: minijinja::Error) -> ScribeError {
    ScribeError::internal(format!("prompt template error: {err}"))
}
