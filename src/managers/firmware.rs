use crate::errors::FgtError;
use crate::managers::session::{Outcome, Session};

impl Session {
    pub async fn firmware(&mut self) -> Result<Outcome, FgtError> {
        let url = self.context().paths().firmware_info.clone();
        self.get(&url).await
    }
}
