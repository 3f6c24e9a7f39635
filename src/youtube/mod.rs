use serde::{Deserialize, Serialize};
use url::Url;

use crate::TranscriptError;

const WATCH_URL: &str = "https://www.youtube.com/watch";

// Caption delivery answers differently for non-browser agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ACCEPT_LANGUAGE: &str = "en-US";

/// A single timed unit of transcript text, as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSnippet {
    /// Snippet text
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

/// Transcript for one video in one language, snippets in service order.
#[derive(Debug, Clone)]
pub struct FetchedTranscript {
    /// Video identifier the transcript was fetched for
    pub video_id: String,

    /// Language code of the selected caption track
    pub language_code: String,

    /// Timed snippets in the order the service returned them
    pub snippets: Vec<TranscriptSnippet>,
}

impl FetchedTranscript {
    /// Plain text of every snippet, preserving snippet order.
    pub fn text_lines(&self) -> Vec<String> {
        self.snippets.iter().map(|s| s.text.clone()).collect()
    }
}

/// One downloadable caption variant listed in the player response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    base_url: String,
    language_code: String,
    kind: Option<String>,
}

impl CaptionTrack {
    /// Auto-generated (speech recognition) tracks carry kind "asr".
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    captions: Option<Captions>,
    playability_status: Option<PlayabilityStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct CaptionEvents {
    events: Option<Vec<CaptionEvent>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionEvent {
    #[serde(default)]
    t_start_ms: i64,
    d_duration_ms: Option<i64>,
    segs: Option<Vec<CaptionSegment>>,
}

#[derive(Debug, Deserialize)]
struct CaptionSegment {
    utf8: Option<String>,
}

/// Client for YouTube's caption delivery.
///
/// Constructed fresh per fetch; holds nothing but the HTTP client.
pub struct TranscriptClient {
    http: reqwest::Client,
}

impl TranscriptClient {
    pub fn new() -> Result<Self, TranscriptError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http })
    }

    /// Fetch the transcript for `video_id`, trying `languages` in order.
    ///
    /// Single attempt: any failure surfaces as a `TranscriptError` without
    /// retry. Snippet order is whatever the service returned.
    pub async fn fetch(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<FetchedTranscript, TranscriptError> {
        tracing::debug!("Listing caption tracks for video: {}", video_id);

        let player = self.fetch_player_response(video_id).await?;
        let tracks = caption_tracks(&player)?;

        let track = select_track(tracks, languages)
            .ok_or_else(|| TranscriptError::NoTranscriptFound(languages.join(", ")))?;

        tracing::debug!(
            "Selected caption track: language={} generated={}",
            track.language_code,
            track.is_generated()
        );

        let snippets = self.fetch_track(track).await?;

        Ok(FetchedTranscript {
            video_id: video_id.to_string(),
            language_code: track.language_code.clone(),
            snippets,
        })
    }

    /// Download the watch page and pull out the embedded player response.
    async fn fetch_player_response(
        &self,
        video_id: &str,
    ) -> Result<PlayerResponse, TranscriptError> {
        let url = Url::parse_with_params(WATCH_URL, [("v", video_id)])?;

        let html = self
            .http
            .get(url)
            .header("Accept-Language", ACCEPT_LANGUAGE)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let json = extract_player_response(&html).ok_or(TranscriptError::PlayerResponseMissing)?;

        Ok(serde_json::from_str(json)?)
    }

    /// Download one caption track and parse it into snippets.
    async fn fetch_track(
        &self,
        track: &CaptionTrack,
    ) -> Result<Vec<TranscriptSnippet>, TranscriptError> {
        let url = track_url(&track.base_url)?;

        tracing::debug!("Downloading caption track: {}", url);

        let body: CaptionEvents = self
            .http
            .get(url)
            .header("Accept-Language", ACCEPT_LANGUAGE)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(parse_events(body.events.unwrap_or_default()))
    }
}

/// Locate the `ytInitialPlayerResponse` JSON object inside watch-page HTML.
///
/// Scans for the marker, then returns the balanced-brace object that follows
/// it. String literals are honored so braces inside caption titles do not
/// unbalance the scan.
fn extract_player_response(html: &str) -> Option<&str> {
    let marker = html.find("ytInitialPlayerResponse")?;
    let open = marker + html[marker..].find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &byte) in html.as_bytes()[open..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&html[open..=open + i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// The track list, or the typed error explaining why there is none.
fn caption_tracks(player: &PlayerResponse) -> Result<&[CaptionTrack], TranscriptError> {
    let Some(captions) = &player.captions else {
        return Err(unplayable_error(player));
    };

    let tracks = captions
        .player_captions_tracklist_renderer
        .as_ref()
        .and_then(|renderer| renderer.caption_tracks.as_deref())
        .unwrap_or(&[]);

    if tracks.is_empty() {
        return Err(TranscriptError::TranscriptsDisabled);
    }

    Ok(tracks)
}

/// Missing caption data means either an unplayable video or disabled
/// transcripts; the playability status tells the two apart.
fn unplayable_error(player: &PlayerResponse) -> TranscriptError {
    let status = player.playability_status.as_ref();

    match status.and_then(|s| s.status.as_deref()) {
        None | Some("OK") => TranscriptError::TranscriptsDisabled,
        Some(other) => {
            let reason = status
                .and_then(|s| s.reason.clone())
                .unwrap_or_else(|| other.to_string());
            TranscriptError::VideoUnavailable(reason)
        }
    }
}

/// Pick a track by preference order: for each requested language in turn, a
/// manually created track wins over an auto-generated one.
fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    languages: &[String],
) -> Option<&'a CaptionTrack> {
    for language in languages {
        let mut generated = None;

        for track in tracks.iter().filter(|t| t.language_code == *language) {
            if track.is_generated() {
                generated.get_or_insert(track);
            } else {
                return Some(track);
            }
        }

        if generated.is_some() {
            return generated;
        }
    }

    None
}

fn track_url(base_url: &str) -> Result<Url, TranscriptError> {
    let mut url = Url::parse(base_url)?;
    url.query_pairs_mut().append_pair("fmt", "json3");
    Ok(url)
}

/// Turn caption events into snippets: one snippet per event with text,
/// segments concatenated, whitespace-only events dropped, order preserved.
fn parse_events(events: Vec<CaptionEvent>) -> Vec<TranscriptSnippet> {
    events
        .into_iter()
        .filter_map(|event| {
            let segs = event.segs?;
            let text: String = segs.into_iter().filter_map(|seg| seg.utf8).collect();

            if text.trim().is_empty() {
                return None;
            }

            Some(TranscriptSnippet {
                text,
                start: event.t_start_ms as f64 / 1000.0,
                duration: event.d_duration_ms.unwrap_or(0) as f64 / 1000.0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_response(json: &str) -> PlayerResponse {
        serde_json::from_str(json).unwrap()
    }

    fn tracks_fixture() -> Vec<CaptionTrack> {
        serde_json::from_str(
            r#"[
                {"baseUrl": "https://example.com/asr-en", "languageCode": "en", "kind": "asr"},
                {"baseUrl": "https://example.com/manual-en", "languageCode": "en"},
                {"baseUrl": "https://example.com/manual-hi", "languageCode": "hi"}
            ]"#,
        )
        .unwrap()
    }

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_extract_player_response() {
        let html = r#"<html><script>var ytInitialPlayerResponse = {"captions": {"a": "}"}, "n": 1};var other = {};</script></html>"#;
        let json = extract_player_response(html).unwrap();
        assert_eq!(json, r#"{"captions": {"a": "}"}, "n": 1}"#);
    }

    #[test]
    fn test_extract_player_response_handles_escaped_quotes() {
        let html = r#"ytInitialPlayerResponse = {"title": "he said \"hi\" {sic}"};"#;
        let json = extract_player_response(html).unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["title"], "he said \"hi\" {sic}");
    }

    #[test]
    fn test_extract_player_response_missing() {
        assert!(extract_player_response("<html>nothing here</html>").is_none());
        assert!(extract_player_response("ytInitialPlayerResponse = [1, 2]").is_none());
    }

    #[test]
    fn test_caption_tracks_present() {
        let player = player_response(
            r#"{
                "captions": {
                    "playerCaptionsTracklistRenderer": {
                        "captionTracks": [
                            {"baseUrl": "https://example.com/t", "languageCode": "en"}
                        ]
                    }
                }
            }"#,
        );
        let tracks = caption_tracks(&player).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].language_code, "en");
    }

    #[test]
    fn test_missing_captions_is_disabled() {
        let player = player_response(r#"{"playabilityStatus": {"status": "OK"}}"#);
        assert!(matches!(
            caption_tracks(&player),
            Err(TranscriptError::TranscriptsDisabled)
        ));
    }

    #[test]
    fn test_empty_track_list_is_disabled() {
        let player = player_response(
            r#"{"captions": {"playerCaptionsTracklistRenderer": {"captionTracks": []}}}"#,
        );
        assert!(matches!(
            caption_tracks(&player),
            Err(TranscriptError::TranscriptsDisabled)
        ));
    }

    #[test]
    fn test_unplayable_video_reports_reason() {
        let player = player_response(
            r#"{"playabilityStatus": {"status": "ERROR", "reason": "Video unavailable"}}"#,
        );
        match caption_tracks(&player) {
            Err(TranscriptError::VideoUnavailable(reason)) => {
                assert_eq!(reason, "Video unavailable");
            }
            other => panic!("unexpected result: {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_select_track_prefers_first_language() {
        let tracks = tracks_fixture();
        let track = select_track(&tracks, &langs(&["en", "hi"])).unwrap();
        assert_eq!(track.language_code, "en");
    }

    #[test]
    fn test_select_track_prefers_manual_over_generated() {
        let tracks = tracks_fixture();
        let track = select_track(&tracks, &langs(&["en"])).unwrap();
        assert_eq!(track.base_url, "https://example.com/manual-en");
    }

    #[test]
    fn test_select_track_falls_back_to_generated() {
        let tracks: Vec<CaptionTrack> = serde_json::from_str(
            r#"[{"baseUrl": "https://example.com/asr", "languageCode": "en", "kind": "asr"}]"#,
        )
        .unwrap();
        let track = select_track(&tracks, &langs(&["en"])).unwrap();
        assert!(track.is_generated());
    }

    #[test]
    fn test_select_track_falls_back_to_second_language() {
        let tracks = tracks_fixture();
        let track = select_track(&tracks, &langs(&["de", "hi"])).unwrap();
        assert_eq!(track.language_code, "hi");
    }

    #[test]
    fn test_select_track_no_match() {
        let tracks = tracks_fixture();
        assert!(select_track(&tracks, &langs(&["de", "fr"])).is_none());
    }

    #[test]
    fn test_track_url_appends_format() {
        let url = track_url("https://example.com/api/timedtext?v=abc&lang=en").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/api/timedtext?v=abc&lang=en&fmt=json3"
        );
    }

    #[test]
    fn test_parse_events_preserves_order_and_concatenates_segments() {
        let body: CaptionEvents = serde_json::from_str(
            r#"{
                "events": [
                    {"tStartMs": 0, "dDurationMs": 1500, "segs": [{"utf8": "Hello"}]},
                    {"tStartMs": 1500, "dDurationMs": 2000, "segs": [{"utf8": "wor"}, {"utf8": "ld"}]}
                ]
            }"#,
        )
        .unwrap();

        let snippets = parse_events(body.events.unwrap());
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].text, "Hello");
        assert_eq!(snippets[0].start, 0.0);
        assert_eq!(snippets[0].duration, 1.5);
        assert_eq!(snippets[1].text, "world");
        assert_eq!(snippets[1].start, 1.5);
    }

    #[test]
    fn test_parse_events_skips_whitespace_only_events() {
        let body: CaptionEvents = serde_json::from_str(
            r#"{
                "events": [
                    {"tStartMs": 0, "segs": [{"utf8": "\n"}]},
                    {"tStartMs": 100, "dDurationMs": 900, "segs": [{"utf8": "text"}]},
                    {"tStartMs": 200}
                ]
            }"#,
        )
        .unwrap();

        let snippets = parse_events(body.events.unwrap());
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].text, "text");
        assert_eq!(snippets[0].duration, 0.9);
    }

    #[test]
    fn test_text_lines_preserves_snippet_order() {
        let transcript = FetchedTranscript {
            video_id: "abc123".to_string(),
            language_code: "en".to_string(),
            snippets: vec![
                TranscriptSnippet {
                    text: "Hello".to_string(),
                    start: 0.0,
                    duration: 1.0,
                },
                TranscriptSnippet {
                    text: "world".to_string(),
                    start: 1.0,
                    duration: 1.0,
                },
            ],
        };
        assert_eq!(transcript.text_lines(), vec!["Hello", "world"]);
    }
}
