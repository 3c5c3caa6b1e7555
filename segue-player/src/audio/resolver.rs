//! Stream URI resolution

use crate::config::{FormatPreference, StreamConfig};
use crate::error::{Error, Result};
use crate::playback::session::StreamResolver;
use async_trait::async_trait;
use segue_common::Track;
use urlencoding::encode;

/// Builds `{base_url}/rest/stream?id=...` URIs, adding transcode
/// parameters when a transcoded format is preferred
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    base_url: String,
}

impl TemplateResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(config.base_url.clone())
    }

    fn stream_uri(&self, track_id: &str, format: &FormatPreference) -> String {
        let base = format!("{}/rest/stream?id={}", self.base_url, encode(track_id));
        match format {
            FormatPreference::Original => base,
            FormatPreference::Transcoded {
                codec,
                max_bitrate_kbps,
            } => format!(
                "{}&format={}&maxBitRate={}",
                base,
                encode(codec),
                max_bitrate_kbps
            ),
        }
    }
}

#[async_trait]
impl StreamResolver for TemplateResolver {
    async fn resolve(&self, track: &Track, format: &FormatPreference) -> Result<String> {
        if track.id.is_empty() {
            return Err(Error::Load(format!("'{}' has no track id", track.title)));
        }
        Ok(self.stream_uri(&track.id, format))
    }
}
