use crate::errors::FgtError;
use crate::managers::session::{Outcome, Session};
use crate::services::endpoints::join_segment;
use crate::services::validation::Validation;
use serde_json::Value;

impl Session {
    pub async fn show_addresses(&mut self) -> Result<Outcome, FgtError> {
        let url = self.context().paths().address_collection.clone();
        self.get(&url).await
    }

    pub async fn get_address(&mut self, name: &str) -> Result<Outcome, FgtError> {
        let url = self.address_url(name)?;
        self.get(&url).await
    }

    /// `object` must be a JSON object describing the address; it is sent untouched.
    pub async fn add_address(&mut self, object: Value) -> Result<Outcome, FgtError> {
        Validation::new().ensure_object(&object, "address object")?;
        let url = self.context().paths().address_collection.clone();
        self.post(&url, object).await
    }

    pub async fn delete_address(&mut self, name: &str) -> Result<Outcome, FgtError> {
        let url = self.address_url(name)?;
        self.delete(&url).await
    }

    fn address_url(&self, name: &str) -> Result<String, FgtError> {
        let name = Validation::new().ensure_string(name, "address name")?;
        join_segment(&self.context().paths().address_collection, &name)
    }
}
