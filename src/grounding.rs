use crate::gemini::{GenerateContentResponse, WebChunk};

/// One cited web page backing an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSource {
    pub title: String,
    pub uri: String,
}

impl From<&WebChunk> for SearchSource {
    fn from(web: &WebChunk) -> Self {
        SearchSource {
            title: web.title.clone().unwrap_or_default(),
            uri: web.uri.clone().unwrap_or_default(),
        }
    }
}

/// Web citations of the first candidate, in the order the API returned them.
///
/// Chunks without a `web` object are dropped. Nothing is deduplicated or validated.
pub fn extract_sources(response: &GenerateContentResponse) -> Vec<SearchSource> {
    response
        .grounding_chunks()
        .iter()
        .filter_map(|chunk| chunk.web.as_ref())
        .map(SearchSource::from)
        .collect()
}
