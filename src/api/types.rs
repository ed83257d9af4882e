//! Response and request shapes of the log-analysis backend.
//!
//! Field names are camelCase on the wire, except inside content blocks which
//! keep the transcript's snake_case keys.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Go encodes nil slices as `null`; read those as empty.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Timeline bucket size.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Day,
    Week,
    Month,
}

impl Period {
    pub const fn as_str(self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl ErrorResponse {
    /// Body substituted when a failed response carries no parseable error.
    pub fn unknown() -> Self {
        Self {
            error: "unknown_error".to_string(),
            message: "An unknown error occurred".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    pub decoded_path: String,
    pub session_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGroup {
    pub id: i64,
    pub name: String,
    pub git_root: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectGroupListResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<ProjectGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGroupDetail {
    pub id: i64,
    pub name: String,
    pub git_root: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub project_name: String,
    #[serde(default)]
    pub git_branch: String,
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    pub total_tokens: u64,
    pub error_count: u64,
    #[serde(default)]
    pub first_user_message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSummary {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_input_tokens: u64,
    pub cache_read_input_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelUsage {
    pub model: String,
    pub tokens: TokenSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub timestamp: String,
    pub name: String,
    #[serde(default)]
    pub input: serde_json::Value,
    #[serde(default)]
    pub is_error: bool,
}

/// One block of a transcript message, kept in source order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    Thinking {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: String,
        #[serde(default)]
        content: String,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Assistant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub timestamp: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub id: String,
    pub project_name: String,
    #[serde(default)]
    pub project_path: String,
    #[serde(default)]
    pub git_branch: String,
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub total_tokens: TokenSummary,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model_usage: Vec<ModelUsage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub error_count: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub status: String,
    pub sessions_found: u64,
    pub sessions_parsed: u64,
    pub error_count: u64,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_sessions: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cache_creation_tokens: u64,
    pub total_cache_read_tokens: u64,
    pub total_tokens: u64,
    pub avg_tokens: f64,
    #[serde(default)]
    pub first_session: String,
    #[serde(default)]
    pub last_session: String,
    pub error_rate: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGroupStats {
    pub total_projects: u64,
    pub total_sessions: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cache_creation_tokens: u64,
    pub total_cache_read_tokens: u64,
    pub avg_tokens: f64,
    #[serde(default)]
    pub first_session: String,
    #[serde(default)]
    pub last_session: String,
    pub error_rate: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalStats {
    pub total_groups: u64,
    pub total_projects: u64,
    pub total_sessions: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cache_creation_tokens: u64,
    pub total_cache_read_tokens: u64,
    pub total_tokens: u64,
    pub avg_tokens: f64,
    #[serde(default)]
    pub first_session: String,
    #[serde(default)]
    pub last_session: String,
    pub error_rate: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesDataPoint {
    pub period_start: String,
    #[serde(default)]
    pub period_end: String,
    pub session_count: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    #[serde(default)]
    pub total_cache_creation_tokens: u64,
    #[serde(default)]
    pub total_cache_read_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeSeriesResponse {
    pub period: Period,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<TimeSeriesDataPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStatus {
    pub status: ScanState,
    #[serde(default)]
    pub projects_processed: u64,
    #[serde(default)]
    pub sessions_found: u64,
    #[serde(default)]
    pub sessions_synced: u64,
    #[serde(default)]
    pub sessions_skipped: u64,
    #[serde(default)]
    pub error_count: u64,
    #[serde(default)]
    pub started_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl ScanStatus {
    /// Sessions handled so far, stored or skipped.
    pub fn processed_sessions(&self) -> u64 {
        self.sessions_synced + self.sessions_skipped
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyGroupStats {
    pub group_id: i64,
    pub group_name: String,
    pub session_count: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    #[serde(default)]
    pub total_cache_creation_tokens: u64,
    #[serde(default)]
    pub total_cache_read_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyStatsResponse {
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<DailyGroupStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProjectStats {
    pub project_id: i64,
    pub project_name: String,
    pub session_count: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    #[serde(default)]
    pub total_cache_creation_tokens: u64,
    #[serde(default)]
    pub total_cache_read_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupDailyStatsResponse {
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: Vec<DailyProjectStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySession {
    pub id: String,
    #[serde(default)]
    pub git_branch: String,
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub duration: String,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    #[serde(default)]
    pub total_cache_creation_tokens: u64,
    #[serde(default)]
    pub total_cache_read_tokens: u64,
    pub total_tokens: u64,
    pub error_count: u64,
    #[serde(default)]
    pub first_user_message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectDailyStatsResponse {
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sessions: Vec<DailySession>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_blocks_keep_order_and_tags() {
        let json = r#"{
            "type": "assistant",
            "timestamp": "2026-01-27T10:00:00Z",
            "model": "claude-sonnet-4",
            "content": [
                {"type": "thinking", "text": "hmm"},
                {"type": "text", "text": "Reading the file"},
                {"type": "tool_use", "id": "t1", "name": "Read", "input": {"path": "a.rs"}},
                {"type": "tool_result", "tool_use_id": "t1", "content": "fn main() {}", "is_error": false},
                {"type": "image"}
            ]
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.kind, MessageKind::Assistant);
        assert_eq!(msg.content.len(), 5);
        assert!(matches!(msg.content[0], ContentBlock::Thinking { .. }));
        assert_eq!(
            msg.content[1],
            ContentBlock::Text {
                text: "Reading the file".to_string()
            }
        );
        match &msg.content[2] {
            ContentBlock::ToolUse { name, input, .. } => {
                assert_eq!(name, "Read");
                assert_eq!(input["path"], "a.rs");
            }
            other => panic!("unexpected block {:?}", other),
        }
        assert!(matches!(
            msg.content[3],
            ContentBlock::ToolResult { is_error: false, .. }
        ));
        assert_eq!(msg.content[4], ContentBlock::Unknown);
    }

    #[test]
    fn test_null_lists_decode_as_empty() {
        let json = r#"{
            "id": "s1",
            "projectName": "web",
            "startTime": "2026-01-27T10:00:00Z",
            "modelUsage": null,
            "toolCalls": null,
            "messages": [
                {"type": "user", "timestamp": "2026-01-27T10:00:00Z", "content": null},
                {"type": "assistant", "timestamp": "2026-01-27T10:00:02Z", "content": [{"type": "text", "text": "ok"}]}
            ]
        }"#;
        let detail: SessionDetail = serde_json::from_str(json).unwrap();
        assert!(detail.model_usage.is_empty());
        assert!(detail.tool_calls.is_empty());
        assert_eq!(detail.messages.len(), 2);
        assert!(detail.messages[0].content.is_empty());
        assert_eq!(detail.messages[1].content.len(), 1);

        let sessions: SessionsResponse = serde_json::from_str(r#"{"sessions":null}"#).unwrap();
        assert!(sessions.sessions.is_empty());
    }

    #[test]
    fn test_timeline_camel_case() {
        let json = r#"{"period":"week","data":[{"periodStart":"2026-01-05T00:00:00Z","periodEnd":"2026-01-11T23:59:59Z","sessionCount":3,"totalInputTokens":10,"totalOutputTokens":20,"totalCacheCreationTokens":0,"totalCacheReadTokens":5,"totalTokens":35}]}"#;
        let tl: TimeSeriesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(tl.period, Period::Week);
        assert_eq!(tl.data[0].total_tokens, 35);
        assert_eq!(tl.data[0].session_count, 3);
    }

    #[test]
    fn test_analyze_request_omits_unset_fields() {
        let body = serde_json::to_string(&AnalyzeRequest::default()).unwrap();
        assert_eq!(body, "{}");
        let body = serde_json::to_string(&AnalyzeRequest {
            project_names: Some(vec!["web".to_string()]),
            force: Some(true),
        })
        .unwrap();
        assert_eq!(body, r#"{"projectNames":["web"],"force":true}"#);
    }

    #[test]
    fn test_scan_processed_sessions() {
        let json = r#"{"status":"running","sessionsSynced":40,"sessionsSkipped":2,"startedAt":"2026-01-27T10:00:00Z"}"#;
        let status: ScanStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.status, ScanState::Running);
        assert_eq!(status.processed_sessions(), 42);
    }
}
