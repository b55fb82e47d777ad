use crate::constants::params::{ACTION, ACTION_MOVE};
use crate::errors::FgtError;
use crate::managers::session::{Outcome, Session};
use crate::services::endpoints::join_segment;
use crate::services::filter::FilterSpec;
use crate::services::params::ParamValue;
use crate::services::validation::Validation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovePosition {
    Before,
    After,
}

impl MovePosition {
    pub fn as_str(self) -> &'static str {
        match self {
            MovePosition::Before => "before",
            MovePosition::After => "after",
        }
    }
}

impl fmt::Display for MovePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Session {
    pub async fn show_policies(&mut self) -> Result<Outcome, FgtError> {
        let url = self.context().paths().policy_collection.clone();
        self.get(&url).await
    }

    pub async fn get_policy(&mut self, policy_id: u64) -> Result<Outcome, FgtError> {
        let url = self.policy_url(policy_id)?;
        self.get(&url).await
    }

    pub async fn add_policy(&mut self, definition: Value) -> Result<Outcome, FgtError> {
        Validation::new().ensure_object(&definition, "policy definition")?;
        let url = self.context().paths().policy_collection.clone();
        self.post(&url, definition).await
    }

    /// Lists policies matching `filter`; the filter never outlives this call.
    pub async fn search_policies(&mut self, filter: &FilterSpec) -> Result<Outcome, FgtError> {
        let url = self.context().paths().policy_collection.clone();
        self.context_mut().set_filter(filter)?;
        let outcome = self.get(&url).await;
        self.context_mut().unset_filter();
        outcome
    }

    /// `PUT .../policy/<id>?action=move&before|after=<reference_id>`.
    pub async fn move_policy(
        &mut self,
        policy_id: u64,
        reference_id: u64,
        position: MovePosition,
    ) -> Result<Outcome, FgtError> {
        let url = self.policy_url(policy_id)?;
        self.context_mut().set_params([
            (ACTION, ParamValue::from(ACTION_MOVE)),
            (position.as_str(), ParamValue::from(reference_id)),
        ])?;
        let outcome = self.put(&url, None).await;
        self.context_mut()
            .delete_params(&[ACTION, position.as_str()])?;
        outcome
    }

    pub async fn delete_policy(&mut self, policy_id: u64) -> Result<Outcome, FgtError> {
        let url = self.policy_url(policy_id)?;
        self.delete(&url).await
    }

    /// Hit counters and session statistics from the monitor branch.
    pub async fn policy_stats(&mut self) -> Result<Outcome, FgtError> {
        let url = self.context().paths().monitor_policy.clone();
        self.get(&url).await
    }

    fn policy_url(&self, policy_id: u64) -> Result<String, FgtError> {
        join_segment(
            &self.context().paths().policy_collection,
            &policy_id.to_string(),
        )
    }
}
