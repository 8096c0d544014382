use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;
use wheel_reconciler::FailureClass;
use wheel_shared::{SpinRequest, SpinResponse};

#[derive(Debug, Error)]
pub enum SpinApiError {
    #[error("spin request timed out")]
    Timeout,
    #[error("no scripted reply left for case {0}")]
    Exhausted(String),
    #[error("malformed spin response: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl SpinApiError {
    pub fn class(&self) -> FailureClass {
        match self {
            SpinApiError::Timeout => FailureClass::Timeout,
            SpinApiError::Malformed(_) => FailureClass::UnresolvableOutcome,
            SpinApiError::Exhausted(_) => FailureClass::Configuration,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Raw JSON body, parsed the same way a real response would be.
    Body(String),
    /// Never answers.
    Hang,
}

/// Stand-in for the remote spin endpoint: replies are queued up front and
/// handed out in order after a fixed latency.
#[derive(Debug, Clone)]
pub struct ScriptedSpinApi {
    replies: Rc<RefCell<VecDeque<ScriptedReply>>>,
    latency: Duration,
}

impl ScriptedSpinApi {
    pub fn new(latency: Duration) -> Self {
        Self {
            replies: Rc::new(RefCell::new(VecDeque::new())),
            latency,
        }
    }

    pub fn push(&self, reply: ScriptedReply) -> &Self {
        self.replies.borrow_mut().push_back(reply);
        self
    }

    pub fn push_json(&self, body: serde_json::Value) -> &Self {
        self.push(ScriptedReply::Body(body.to_string()))
    }

    pub fn remaining(&self) -> usize {
        self.replies.borrow().len()
    }

    pub async fn spin(&self, request: SpinRequest) -> Result<SpinResponse, SpinApiError> {
        let reply = self.replies.borrow_mut().pop_front();
        tokio::time::sleep(self.latency).await;
        match reply {
            Some(ScriptedReply::Body(body)) => Ok(serde_json::from_str(&body)?),
            Some(ScriptedReply::Hang) => {
                futures::future::pending::<()>().await;
                Err(SpinApiError::Timeout)
            }
            None => Err(SpinApiError::Exhausted(request.case_id)),
        }
    }

    /// `spin` with a deadline, so a request that never answers still ends.
    pub async fn spin_with_timeout(
        &self,
        request: SpinRequest,
        timeout: Duration,
    ) -> Result<SpinResponse, SpinApiError> {
        tokio::time::timeout(timeout, self.spin(request))
            .await
            .unwrap_or(Err(SpinApiError::Timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wheel_shared::SpinStatus;

    fn request() -> SpinRequest {
        SpinRequest {
            case_id: "bronze".to_string(),
            timestamp: 0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_replies_in_order() {
        let api = ScriptedSpinApi::new(Duration::from_millis(300));
        api.push_json(json!({"spin_id": "1", "status": "lose"}))
            .push_json(json!({"spin_id": "2", "status": "pending", "prize": {"chance_id": "c-50"}}));

        assert_eq!(api.spin(request()).await.unwrap().status, SpinStatus::Lose);
        let second = api.spin(request()).await.unwrap();
        assert_eq!(second.prize.unwrap().chance_id, "c-50");
        assert!(matches!(api.spin(request()).await, Err(SpinApiError::Exhausted(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_hits_timeout() {
        let api = ScriptedSpinApi::new(Duration::from_millis(10));
        api.push(ScriptedReply::Hang);
        let result = api.spin_with_timeout(request(), Duration::from_secs(15)).await;
        assert!(matches!(result, Err(SpinApiError::Timeout)));
        assert_eq!(SpinApiError::Timeout.class(), FailureClass::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_body() {
        let api = ScriptedSpinApi::new(Duration::ZERO);
        api.push(ScriptedReply::Body("{not json".to_string()));
        let err = api.spin(request()).await.unwrap_err();
        assert!(matches!(err, SpinApiError::Malformed(_)));
        assert_eq!(err.class(), FailureClass::UnresolvableOutcome);
        assert!(!err.class().surfaces_to_user());
    }
}
