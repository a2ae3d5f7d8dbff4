//! Prompt templates for the judgment oracle.
//!
//! `{question}`, `{document}` and `{context}` are substituted by `LlmOracle`.

/// System prompt for routing. The reply must be a JSON object with a `datasource` field.
pub const ROUTER_PROMPT: &str = r#"You are an expert router. Use vectorstore for questions about specific document context, otherwise web_search.

Respond with only a JSON object of the form {"datasource": "vectorstore"} or {"datasource": "web_search"}."#;

/// System prompt for relevance grading. The reply must be a JSON object with a `binary_score` field.
pub const GRADER_PROMPT: &str = r#"Grade relevance 'yes' or 'no'. If the document contains keywords or semantic meaning related to the question, grade it as relevant.

Respond with only a JSON object of the form {"binary_score": "yes"} or {"binary_score": "no"}."#;

/// User message for grading one passage.
pub(crate) const GRADER_INPUT: &str = "Doc: {document} \n Question: {question}";

/// System prompt for query rewriting.
pub const REWRITE_PROMPT: &str = "You are a question re-writer that converts an input question to a better version that is optimized \
for web search. Look at the input and try to reason about the underlying semantic intent / meaning.";

/// User message for query rewriting.
pub(crate) const REWRITE_INPUT: &str =
    "Here is the initial question: \n\n {question} \n Formulate an improved question.";

/// Prompt for answer synthesis from the accumulated evidence.
pub const GENERATE_PROMPT: &str = r#"You are an assistant for question-answering tasks.
Use the following pieces of retrieved context to answer the question.
If you don't know the answer, just say that you don't know.
Use three sentences maximum and keep the answer concise.

Context: {context}

Question: {question}

Answer:"#;
