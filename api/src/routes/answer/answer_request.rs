use serde::Deserialize;

/// Request payload for `POST /answer`.
///
/// A missing `question` is treated like an empty one.
#[derive(Debug, Default, Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub question: String,
}
