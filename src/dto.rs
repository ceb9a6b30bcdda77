#[derive(serde::Serialize)]
pub struct TranscriptDto {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_url: Option<String>,
}

#[derive(serde::Serialize)]
pub struct ErrorDto {
    pub error: String,
}
