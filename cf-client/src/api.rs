//! JSON API endpoints

use crate::client::CfClient;
use crate::error::CfError;
use crate::model::{ApiResponse, Contest, Submission};
use crate::session::Session;
use serde::de::DeserializeOwned;

impl CfClient {
    /// Call `/api/{method}` and unwrap the `{status, result}` envelope
    fn call_api<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, String)],
        session: &Session,
    ) -> Result<T, CfError> {
        let response = self.get(&format!("/api/{}", method), query, session.cookie())?;

        // The API reports failures as JSON with a 400 status, so read the body first
        let status = response.status();
        let body = response.text().map_err(|_| CfError::Encoding)?;
        let envelope: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => return Err(CfError::InvalidStatus { status }),
            Err(e) => return Err(e.into()),
        };

        match envelope {
            ApiResponse {
                status,
                result: Some(result),
                ..
            } if status == "OK" => Ok(result),
            ApiResponse { comment, .. } => Err(CfError::Api {
                comment: comment.unwrap_or_else(|| "no comment".to_string()),
            }),
        }
    }

    /// List contests
    ///
    /// # Errors
    ///
    /// * `CfError::Api` - The API answered with a non-OK status
    /// * `CfError::Json` - The response was not the expected JSON
    pub fn contest_list(&self, gym: bool) -> Result<Vec<Contest>, CfError> {
        self.call_api(
            "contest.list",
            &[("gym", gym.to_string())],
            &Session::anonymous(),
        )
    }

    /// Fetch the `count` most recent submissions of `handle`, starting at the
    /// 1-based position `from`
    pub fn user_status(
        &self,
        handle: &str,
        from: usize,
        count: usize,
        session: &Session,
    ) -> Result<Vec<Submission>, CfError> {
        self.call_api(
            "user.status",
            &[
                ("handle", handle.to_string()),
                ("from", from.to_string()),
                ("count", count.to_string()),
            ],
            session,
        )
    }
}
